use crate::breakpoints::Timestamp;
use crate::error::{EngineError, Result};

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// Renders `at` as `HH:MM:SS.mmm`. Negative values render as zero.
///
/// # Example
/// ```
/// use engine::format_timestamp;
///
/// assert_eq!(format_timestamp(3_723_004), "01:02:03.004");
/// ```
pub fn format_timestamp(at: Timestamp) -> String {
    let at = at.max(0);
    let hours = at / MILLIS_PER_HOUR;
    let minutes = at % MILLIS_PER_HOUR / MILLIS_PER_MINUTE;
    let seconds = at % MILLIS_PER_MINUTE / MILLIS_PER_SECOND;
    let millis = at % MILLIS_PER_SECOND;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parses a clock value into milliseconds.
///
/// Accepts `HH:MM:SS`, `MM:SS` and `SS` clock forms with an optional
/// `.mmm` fraction. A bare integer without fraction is read as milliseconds.
///
/// # Example
/// ```
/// use engine::parse_timestamp;
///
/// assert_eq!(parse_timestamp("00:01:30.5").unwrap(), 90_500);
/// assert_eq!(parse_timestamp("1500").unwrap(), 1_500);
/// ```
pub fn parse_timestamp(input: &str) -> Result<Timestamp> {
    let invalid = || EngineError::InvalidTimestamp {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }
    if is_digits(trimmed) {
        return trimmed.parse::<i64>().map_err(|_| invalid());
    }

    let (clock, fraction) = match trimmed.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (trimmed, None),
    };

    let fields: Vec<&str> = clock.split(':').collect();
    if fields.len() > 3 || fields.iter().any(|field| !is_digits(field)) {
        return Err(invalid());
    }

    let mut seconds: i64 = 0;
    for (index, field) in fields.iter().enumerate() {
        let value = field.parse::<i64>().map_err(|_| invalid())?;
        if index > 0 && value >= 60 {
            return Err(invalid());
        }
        seconds = seconds
            .checked_mul(60)
            .and_then(|total| total.checked_add(value))
            .ok_or_else(invalid)?;
    }

    let millis = match fraction {
        Some(fraction) => parse_fraction(fraction).ok_or_else(invalid)?,
        None => 0,
    };

    seconds
        .checked_mul(MILLIS_PER_SECOND)
        .and_then(|total| total.checked_add(millis))
        .ok_or_else(invalid)
}

fn parse_fraction(fraction: &str) -> Option<i64> {
    if fraction.is_empty() || fraction.len() > 3 || !is_digits(fraction) {
        return None;
    }
    let value = fraction.parse::<i64>().ok()?;
    let scale = 10_i64.pow(3 - fraction.len() as u32);
    Some(value * scale)
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}
