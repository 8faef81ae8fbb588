//! Consumption forecasting from meter readings.
//!
//! The daily rate is the unweighted mean of per-segment rates, where a
//! segment is the interval between two chronologically adjacent readings:
//!
//! 1. Fewer than two readings yields a rate of zero
//! 2. Readings are sorted by timestamp (input order is irrelevant)
//! 3. Segments with a negative delta or zero elapsed time are skipped
//! 4. Each remaining segment contributes `delta / elapsed_days` with equal weight
//!
//! Nothing here performs I/O or returns an error. Degenerate input always
//! degrades to a zero rate.

use crate::Reading;
use chrono::{DateTime, Utc};
use serde::Serialize;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Why a segment did or did not contribute to the daily rate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Included,
    /// Meter went backwards (correction, reset or typo)
    NegativeDelta,
    /// Both readings share a timestamp
    ZeroDuration,
}

/// Interval between two chronologically adjacent readings
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub delta: f64,
    pub elapsed_days: f64,
    pub status: SegmentStatus,
}

impl Segment {
    /// Daily rate for an included segment
    pub fn rate(&self) -> Option<f64> {
        match self.status {
            SegmentStatus::Included => Some(self.delta / self.elapsed_days),
            _ => None,
        }
    }
}

fn elapsed_days(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds().abs() as f64 / MILLIS_PER_DAY
}

/// Split readings into chronologically adjacent segments
///
/// The input is not modified; a sorted view is built locally. Readings
/// sharing a timestamp are ordered by value so the result never depends on
/// input order.
pub fn segments(readings: &[Reading]) -> Vec<Segment> {
    let mut sorted: Vec<&Reading> = readings.iter().collect();
    sorted.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.value.total_cmp(&b.value))
    });

    sorted
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (pair[0], pair[1]);
            let delta = curr.value - prev.value;
            let days = elapsed_days(prev.timestamp, curr.timestamp);

            // NaN deltas count as going backwards
            let status = if delta.is_nan() || delta < 0.0 {
                SegmentStatus::NegativeDelta
            } else if days <= 0.0 {
                SegmentStatus::ZeroDuration
            } else {
                SegmentStatus::Included
            };

            Segment {
                start: prev.timestamp,
                end: curr.timestamp,
                delta,
                elapsed_days: days,
                status,
            }
        })
        .collect()
}

/// Expected consumption per day, in the unit of the reading values
///
/// Returns 0.0 when fewer than two readings are given or when every
/// segment is excluded.
pub fn compute_daily_average(readings: &[Reading]) -> f64 {
    if readings.len() < 2 {
        return 0.0;
    }

    let (sum, count) = segments(readings)
        .iter()
        .filter_map(Segment::rate)
        .fold((0.0, 0usize), |(sum, count), rate| (sum + rate, count + 1));

    if count == 0 {
        return 0.0;
    }

    let average = sum / count as f64;
    tracing::debug!(
        "Daily average {:.3} over {} included segments of {} readings",
        average,
        count,
        readings.len()
    );
    average
}

/// Projected consumption over `days`
///
/// `days` is passed through unchecked: a negative horizon yields a negative
/// projection.
pub fn estimate_for_days(readings: &[Reading], days: f64) -> f64 {
    compute_daily_average(readings) * days
}

/// Total delta over total elapsed time across included segments
///
/// Duration-weighted alternative to [`compute_daily_average`], reported
/// next to it for comparison only.
pub fn pooled_daily_rate(readings: &[Reading]) -> f64 {
    let (delta, days) = segments(readings)
        .iter()
        .filter(|s| s.status == SegmentStatus::Included)
        .fold((0.0, 0.0), |(d, t), s| (d + s.delta, t + s.elapsed_days));

    if days > 0.0 {
        delta / days
    } else {
        0.0
    }
}

/// Projection for a single horizon
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Horizon {
    pub days: f64,
    pub total: f64,
}

/// Summary shown on the dashboard: daily rate plus weekly and monthly totals
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub daily: f64,
    pub week: f64,
    pub month: f64,
}

impl Forecast {
    pub fn from_readings(readings: &[Reading]) -> Self {
        Self {
            daily: compute_daily_average(readings),
            week: estimate_for_days(readings, 7.0),
            month: estimate_for_days(readings, 30.0),
        }
    }

    /// Projections for arbitrary horizons, in the order given
    pub fn for_horizons(readings: &[Reading], horizons: &[f64]) -> Vec<Horizon> {
        horizons
            .iter()
            .map(|&days| Horizon {
                days,
                total: estimate_for_days(readings, days),
            })
            .collect()
    }
}
