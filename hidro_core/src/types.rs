//! Core domain types for Hidro.
//!
//! This module defines the fundamental types used throughout the system:
//! - Meter readings and their optional geolocation
//! - Display units for consumption figures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Reading Types
// ============================================================================

/// Where a reading was taken, as reported by the capturing device
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A timestamped cumulative meter value, in liters
///
/// Stored readings keep the `reading` field name on disk so existing
/// arrays exported by earlier versions load unchanged.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    #[serde(rename = "reading")]
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
    /// Synthetic reading, removable in bulk with `clear_simulated`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub simulated: bool,
}

impl Reading {
    /// Create a reading without location metadata
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            geo: None,
            simulated: false,
        }
    }

    /// Attach a location to this reading
    pub fn with_geo(mut self, geo: Option<GeoPoint>) -> Self {
        self.geo = geo;
        self
    }

    /// Mark this reading as synthetic
    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }
}

// ============================================================================
// Display Types
// ============================================================================

/// Unit used when presenting consumption figures
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnit {
    Liters,
    #[default]
    CubicMeters,
}
