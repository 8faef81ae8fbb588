//! Reading recognition from meter photos.
//!
//! Recognition is a black box behind [`ReadingRecognizer`]. The only
//! implementation is a stub that derives a plausible value from the clock
//! so capture flows can be exercised end to end.

use chrono::{DateTime, Utc};
use std::path::Path;

/// Failures while extracting a value from an image
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("cannot read image {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image {0} is empty")]
    EmptyImage(String),
}

/// Extracts a cumulative meter value, in liters, from a photo
pub trait ReadingRecognizer {
    fn extract_reading(&self, image: &Path) -> Result<f64, RecognitionError>;
}

/// Clock-driven stand-in for a real recognizer
#[derive(Clone, Debug, Default)]
pub struct StubRecognizer {
    fixed_now: Option<DateTime<Utc>>,
}

impl StubRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed instant instead of the wall clock
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            fixed_now: Some(now),
        }
    }
}

impl ReadingRecognizer for StubRecognizer {
    fn extract_reading(&self, image: &Path) -> Result<f64, RecognitionError> {
        let metadata = std::fs::metadata(image).map_err(|e| RecognitionError::Unreadable {
            path: image.display().to_string(),
            source: e,
        })?;
        if metadata.len() == 0 {
            return Err(RecognitionError::EmptyImage(image.display().to_string()));
        }

        let now = self.fixed_now.unwrap_or_else(Utc::now);
        let base = (now.timestamp_millis() / 100_000).rem_euclid(1000);
        let value = 1000.0 + base as f64;

        tracing::debug!("Stub recognizer read {} from {:?}", value, image);
        Ok(value)
    }
}
