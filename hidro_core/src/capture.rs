//! Capturing new readings and editing stored ones.
//!
//! Candidates come from the meter dial, a typed liter value or a photo.
//! Every write is validated against the store before it is applied.

use crate::validation::{validate_edit, validate_new_reading};
use crate::{Error, GeoPoint, Reading, ReadingRecognizer, ReadingStore, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Where a candidate value comes from
#[derive(Clone, Debug)]
pub enum CaptureSource {
    /// Six dial digits as read off the meter, e.g. `"001234"`
    Digits(String),
    /// Value already in liters
    Liters(f64),
    /// Photo of the meter face
    Image(PathBuf),
}

/// Turn a capture source into a candidate value in liters
pub fn resolve_candidate(source: &CaptureSource, recognizer: &dyn ReadingRecognizer) -> Result<f64> {
    let value = match source {
        CaptureSource::Digits(digits) => crate::units::parse_digits(digits)?,
        CaptureSource::Liters(liters) => *liters,
        CaptureSource::Image(path) => recognizer.extract_reading(path)?,
    };
    tracing::debug!("Resolved candidate {} from {:?}", value, source);
    Ok(value)
}

/// Validate a candidate against the last stored reading and append it
pub fn record_reading(
    store: &mut dyn ReadingStore,
    candidate: f64,
    geo: Option<GeoPoint>,
    at: DateTime<Utc>,
) -> Result<Reading> {
    record(store, Reading::new(candidate, at).with_geo(geo))
}

/// Validate a fully built reading against the last stored one and append it
pub fn record(store: &mut dyn ReadingStore, reading: Reading) -> Result<Reading> {
    let last = store.last()?;
    validate_new_reading(reading.value, last.as_ref())?;

    store.append(reading.clone())?;
    Ok(reading)
}

/// Change the value of the reading at `index`, keeping it between its neighbours
pub fn edit_reading(store: &mut dyn ReadingStore, index: usize, value: f64) -> Result<()> {
    let readings = store.readings()?;
    if index >= readings.len() {
        return Err(Error::NotFound(format!(
            "no reading at index {} ({} stored)",
            index,
            readings.len()
        )));
    }

    let prev = index.checked_sub(1).and_then(|i| readings.get(i));
    let next = readings.get(index + 1);
    validate_edit(value, prev, next)?;

    store.update_value(index, value)?;
    tracing::info!(
        "Updated reading {} from {} to {}",
        index,
        readings[index].value,
        value
    );
    Ok(())
}

/// Remove the reading at `index`
pub fn delete_reading(store: &mut dyn ReadingStore, index: usize) -> Result<Reading> {
    let readings = store.readings()?;
    let removed = readings
        .get(index)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("no reading at index {}", index)))?;

    store.remove(index)?;
    Ok(removed)
}
