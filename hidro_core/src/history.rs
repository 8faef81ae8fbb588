//! Weekly history windows over stored readings.
//!
//! Weeks start on Monday at 00:00 UTC. An offset moves the window by whole
//! weeks, negative offsets going back in time.

use crate::Reading;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Half-open `[start, end)` window covering one Monday-based week
///
/// Returns `None` if the offset moves the window outside the supported
/// calendar range.
pub fn week_range(today: NaiveDate, offset: i64) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let back_to_monday = i64::from(today.weekday().num_days_from_monday());
    let monday = today
        .checked_sub_signed(Duration::days(back_to_monday))?
        .checked_add_signed(Duration::try_weeks(offset)?)?;

    let start = Utc.from_utc_datetime(&monday.and_time(NaiveTime::MIN));
    let end = start.checked_add_signed(Duration::days(7))?;
    Some((start, end))
}

/// Readings with `start <= timestamp < end`, in input order
pub fn filter_by_range(readings: &[Reading], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Reading> {
    readings
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp < end)
        .cloned()
        .collect()
}

/// Readings sorted newest first, each paired with its store position
pub fn newest_first(readings: &[Reading]) -> Vec<(usize, &Reading)> {
    let mut sorted: Vec<(usize, &Reading)> = readings.iter().enumerate().collect();
    sorted.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
    sorted
}

/// Readings of one week bucketed per calendar day, Monday first
///
/// Each day's readings are in chronological order.
pub fn group_by_day(readings: &[Reading], week_start: DateTime<Utc>) -> Vec<(NaiveDate, Vec<Reading>)> {
    let first_day = week_start.date_naive();
    let mut in_week = filter_by_range(readings, week_start, week_start + Duration::days(7));
    in_week.sort_by_key(|r| r.timestamp);

    first_day
        .iter_days()
        .take(7)
        .map(|day| {
            let of_day = in_week
                .iter()
                .filter(|r| r.timestamp.date_naive() == day)
                .cloned()
                .collect();
            (day, of_day)
        })
        .collect()
}
