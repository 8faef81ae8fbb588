//! Meter-dial digits and liter / cubic-meter formatting.
//!
//! A household meter shows six dial positions: four for whole cubic
//! meters, then hundreds of liters, then tens of liters.

use crate::validation::ValidationError;
use crate::DisplayUnit;

/// Number of dial positions read from the meter face
pub const DIAL_DIGITS: usize = 6;

/// Convert dial positions into liters
///
/// Missing positions and non-digit characters read as zero.
pub fn digits_to_liters(digits: &[char]) -> f64 {
    let d: Vec<u32> = (0..DIAL_DIGITS)
        .map(|i| digits.get(i).and_then(|c| c.to_digit(10)).unwrap_or(0))
        .collect();

    let m3 = d[0] * 1000 + d[1] * 100 + d[2] * 10 + d[3];
    f64::from(m3) * 1000.0 + f64::from(d[4]) * 100.0 + f64::from(d[5]) * 10.0
}

/// Parse a fully entered dial, e.g. `"001234"` -> 12 340 L
///
/// All six positions must be filled with digits.
pub fn parse_digits(input: &str) -> Result<f64, ValidationError> {
    let digits: Vec<char> = input.trim().chars().collect();
    if digits.len() != DIAL_DIGITS || !digits.iter().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::IncompleteDigits(input.to_string()));
    }
    Ok(digits_to_liters(&digits))
}

/// Dial positions for a liter value
///
/// The cubic-meter part wraps at 10 000 like the physical dial. Negative
/// and non-finite values read as an all-zero dial.
pub fn liters_to_digits(liters: f64) -> [u8; DIAL_DIGITS] {
    let liters = if liters.is_finite() && liters > 0.0 {
        liters
    } else {
        0.0
    };

    let m3 = ((liters / 1000.0).floor() as u64 % 10_000) as u32;
    let hundreds = ((liters % 1000.0) / 100.0).floor() as u8;
    let tens = ((liters % 100.0) / 10.0).floor() as u8;

    [
        (m3 / 1000) as u8,
        (m3 / 100 % 10) as u8,
        (m3 / 10 % 10) as u8,
        (m3 % 10) as u8,
        hundreds,
        tens,
    ]
}

/// Dial positions rendered as a string, e.g. `"001234"`
pub fn dial_string(liters: f64) -> String {
    liters_to_digits(liters)
        .iter()
        .map(|d| char::from(b'0' + d))
        .collect()
}

fn group_thousands(n: u64) -> String {
    let raw = n.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Whole liters, e.g. `12.345 L`; negatives clamp to zero
pub fn format_liters(liters: f64) -> String {
    let whole = if liters.is_finite() && liters > 0.0 {
        liters.floor() as u64
    } else {
        0
    };
    format!("{} L", group_thousands(whole))
}

/// Cubic meters with two decimals, e.g. `1.234,56 m³`
pub fn format_cubic_meters(liters: f64) -> String {
    if !liters.is_finite() {
        return "0,00 m³".to_string();
    }

    let cents = (liters / 10.0).round();
    let sign = if cents < 0.0 { "-" } else { "" };
    let cents = cents.abs() as u64;
    format!(
        "{}{},{:02} m³",
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

impl DisplayUnit {
    /// Format a liter quantity in this unit
    pub fn format(&self, liters: f64) -> String {
        match self {
            DisplayUnit::Liters => format_liters(liters),
            DisplayUnit::CubicMeters => format_cubic_meters(liters),
        }
    }
}
