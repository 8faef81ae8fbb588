#![forbid(unsafe_code)]

//! Core domain model and business logic for Hidro, a household water-meter log.
//!
//! This crate provides:
//! - Domain types (readings, geolocation)
//! - Consumption forecasting from meter readings
//! - Capture validation and meter-dial digit helpers
//! - Persistence (locked JSON store, CSV export/import)
//! - Weekly history windows

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod forecast;
pub mod units;
pub mod validation;
pub mod store;
pub mod ocr;
pub mod capture;
pub mod history;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use forecast::{compute_daily_average, estimate_for_days, Forecast};
pub use validation::ValidationError;
pub use store::{JsonFileStore, MemoryStore, ReadingStore};
pub use ocr::{ReadingRecognizer, RecognitionError, StubRecognizer};
pub use capture::{record_reading, edit_reading, CaptureSource};
