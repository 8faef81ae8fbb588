//! Capture-time validation of candidate readings.
//!
//! A meter only counts up, so a new reading must exceed the last stored
//! one, and an edited reading must stay between its neighbours. These
//! checks run before anything reaches the store; the forecast engine
//! separately tolerates whatever does get stored.

use crate::Reading;

/// Reasons a candidate reading is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Not a finite, strictly positive number
    #[error("Enter a valid reading: {0} is not a positive number")]
    InvalidValue(f64),

    /// Fewer than six dial digits were entered, or a position is not a digit
    #[error("Enter all six meter digits (got {0:?})")]
    IncompleteDigits(String),

    #[error("New reading must be greater than the last recorded reading ({last} L)")]
    NotAboveLast { last: f64 },

    #[error("Reading must be greater than the previous one ({previous} L)")]
    NotAbovePrevious { previous: f64 },

    #[error("Reading cannot exceed the next one ({next} L)")]
    ExceedsNext { next: f64 },
}

fn check_value(candidate: f64) -> Result<(), ValidationError> {
    if candidate.is_finite() && candidate > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue(candidate))
    }
}

/// Check a reading about to be appended against the last stored reading
pub fn validate_new_reading(candidate: f64, last: Option<&Reading>) -> Result<(), ValidationError> {
    check_value(candidate)?;

    if let Some(last) = last {
        if candidate <= last.value {
            return Err(ValidationError::NotAboveLast { last: last.value });
        }
    }

    Ok(())
}

/// Check an edited value against the readings stored before and after it
///
/// The previous neighbour must be strictly exceeded; the next one may be
/// matched but not exceeded.
pub fn validate_edit(
    candidate: f64,
    prev: Option<&Reading>,
    next: Option<&Reading>,
) -> Result<(), ValidationError> {
    check_value(candidate)?;

    if let Some(prev) = prev {
        if candidate <= prev.value {
            return Err(ValidationError::NotAbovePrevious {
                previous: prev.value,
            });
        }
    }

    if let Some(next) = next {
        if candidate > next.value {
            return Err(ValidationError::ExceedsNext { next: next.value });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(value: f64) -> Reading {
        Reading::new(value, Utc::now())
    }

    #[test]
    fn test_first_reading_only_needs_positive_value() {
        assert!(validate_new_reading(1.0, None).is_ok());
        assert_eq!(
            validate_new_reading(0.0, None),
            Err(ValidationError::InvalidValue(0.0))
        );
        assert!(validate_new_reading(-10.0, None).is_err());
        assert!(validate_new_reading(f64::INFINITY, None).is_err());
        assert!(validate_new_reading(f64::NAN, None).is_err());
    }

    #[test]
    fn test_new_reading_must_exceed_last() {
        let last = at(1500.0);
        assert!(validate_new_reading(1510.0, Some(&last)).is_ok());
        assert_eq!(
            validate_new_reading(1500.0, Some(&last)),
            Err(ValidationError::NotAboveLast { last: 1500.0 })
        );
        assert!(validate_new_reading(1000.0, Some(&last)).is_err());
    }

    #[test]
    fn test_edit_between_neighbours() {
        let prev = at(1000.0);
        let next = at(2000.0);

        assert!(validate_edit(1500.0, Some(&prev), Some(&next)).is_ok());
        assert!(validate_edit(2000.0, Some(&prev), Some(&next)).is_ok());
        assert_eq!(
            validate_edit(1000.0, Some(&prev), Some(&next)),
            Err(ValidationError::NotAbovePrevious { previous: 1000.0 })
        );
        assert_eq!(
            validate_edit(2001.0, Some(&prev), Some(&next)),
            Err(ValidationError::ExceedsNext { next: 2000.0 })
        );
    }

    #[test]
    fn test_edit_at_ends() {
        assert!(validate_edit(5.0, None, None).is_ok());
        assert!(validate_edit(5.0, None, Some(&at(10.0))).is_ok());
        assert!(validate_edit(50.0, Some(&at(10.0)), None).is_ok());
        assert!(validate_edit(-1.0, None, None).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::NotAboveLast { last: 1500.0 };
        assert_eq!(
            err.to_string(),
            "New reading must be greater than the last recorded reading (1500 L)"
        );
    }
}
