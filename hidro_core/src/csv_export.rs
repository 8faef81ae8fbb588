//! CSV export and import of readings.
//!
//! Export writes one row per reading and syncs the file to disk. Import is
//! tolerant: rows that fail to parse are logged and skipped.

use crate::{GeoPoint, Reading, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A row in the CSV file
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    reading: f64,
    timestamp: String,
    lat: Option<f64>,
    lng: Option<f64>,
    #[serde(default)]
    simulated: bool,
}

impl From<&Reading> for CsvRow {
    fn from(reading: &Reading) -> Self {
        CsvRow {
            reading: reading.value,
            timestamp: reading.timestamp.to_rfc3339(),
            lat: reading.geo.map(|g| g.lat),
            lng: reading.geo.map(|g| g.lng),
            simulated: reading.simulated,
        }
    }
}

impl TryFrom<CsvRow> for Reading {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        // JSON has no encoding for NaN or infinity
        if !row.reading.is_finite() {
            return Err(crate::Error::Other(format!("Non-finite reading {}", row.reading)));
        }
        if row.lat.into_iter().chain(row.lng).any(|c| !c.is_finite()) {
            return Err(crate::Error::Other(format!(
                "Non-finite coordinates {:?}, {:?}",
                row.lat, row.lng
            )));
        }

        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| crate::Error::Other(format!("Invalid date {:?}: {}", row.timestamp, e)))?
            .with_timezone(&Utc);

        let geo = match (row.lat, row.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(Reading {
            value: row.reading,
            timestamp,
            geo,
            simulated: row.simulated,
        })
    }
}

/// Write readings to a CSV file, replacing it
///
/// Returns the number of rows written.
pub fn export_csv(readings: &[Reading], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    for reading in readings {
        writer.serialize(CsvRow::from(reading))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} readings to {:?}", readings.len(), path);
    Ok(readings.len())
}

/// Read readings from a CSV file written by [`export_csv`]
pub fn import_csv(path: &Path) -> Result<Vec<Reading>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut readings = Vec::new();
    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        match result {
            Ok(row) => match Reading::try_from(row) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    tracing::warn!("Skipping CSV row {}: {}", line + 1, e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row {}: {}", line + 1, e);
            }
        }
    }

    tracing::debug!("Imported {} readings from {:?}", readings.len(), path);
    Ok(readings)
}
