//! Conversion between human period notation and canonical seconds
//!
//! Checkout links and stored prompts carry billing periods as short text
//! ("month", "30d", "2 weeks"); contracts and the indexer carry seconds.
//! This module is the single place where the two meet, so every surface
//! renders and parses periods the same way.

#![forbid(unsafe_code)]

use crate::error::{BeaverError, Result};

/// Seconds in one minute
pub const SECS_PER_MINUTE: u64 = 60;
/// Seconds in one hour
pub const SECS_PER_HOUR: u64 = 3_600;
/// Seconds in one day
pub const SECS_PER_DAY: u64 = 86_400;
/// Seconds in one week
pub const SECS_PER_WEEK: u64 = 604_800;
/// Seconds in one month, fixed at 30 days
pub const SECS_PER_MONTH: u64 = 2_592_000;
/// Seconds in one year, fixed at 365 days
pub const SECS_PER_YEAR: u64 = 31_536_000;

/// Units ordered largest-first for rendering
const UNITS: [(u64, &str); 6] = [
    (SECS_PER_YEAR, "year"),
    (SECS_PER_MONTH, "month"),
    (SECS_PER_WEEK, "week"),
    (SECS_PER_DAY, "day"),
    (SECS_PER_HOUR, "hour"),
    (SECS_PER_MINUTE, "minute"),
];

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "min" | "minute" | "minutes" => Some(SECS_PER_MINUTE),
        "hour" | "hours" => Some(SECS_PER_HOUR),
        "day" | "days" => Some(SECS_PER_DAY),
        "week" | "weeks" => Some(SECS_PER_WEEK),
        "month" | "months" => Some(SECS_PER_MONTH),
        "year" | "years" => Some(SECS_PER_YEAR),
        "second" | "seconds" => Some(1),
        _ => None,
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Parse human period notation into seconds
///
/// Accepted notations, case-insensitive:
/// - `"0"` for a zero period (used for "no free trial")
/// - a day count such as `"30d"`
/// - a bare unit name: `min`, `hour`, `day`, `week`, `month`, `year`
/// - a counted form such as `"2 weeks"` or `"90 seconds"`, so that
///   everything [`human_from_seconds`] renders parses back
///
/// # Arguments
/// * `text` - The period text from a checkout link or stored prompt
///
/// # Returns
/// The period in seconds
///
/// # Errors
/// [`BeaverError::InvalidPeriod`] citing the input when it matches no
/// accepted notation or the value overflows.
///
/// # Examples
/// ```
/// use beaver_sdk::period::seconds_from_human;
///
/// assert_eq!(seconds_from_human("month").unwrap(), 2_592_000);
/// assert_eq!(seconds_from_human("30d").unwrap(), 2_592_000);
/// assert_eq!(seconds_from_human("2 weeks").unwrap(), 1_209_600);
/// assert_eq!(seconds_from_human("0").unwrap(), 0);
/// assert!(seconds_from_human("fortnight").is_err());
/// ```
pub fn seconds_from_human(text: &str) -> Result<u64> {
    let lowered = text.trim().to_lowercase();
    let invalid = || BeaverError::InvalidPeriod(text.to_string());

    if lowered == "0" {
        return Ok(0);
    }

    // Day-count form used by stored prompts, e.g. "7d"
    if let Some(day_part) = lowered.strip_suffix('d') {
        if is_digits(day_part) {
            let days: u64 = day_part.parse().map_err(|_| invalid())?;
            return days.checked_mul(SECS_PER_DAY).ok_or_else(invalid);
        }
    }

    // Bare unit name means one unit
    if let Some(unit) = unit_seconds(&lowered) {
        return Ok(unit);
    }

    // Counted form, e.g. "2 weeks"
    if let Some((count_part, unit_part)) = lowered.split_once(' ') {
        if is_digits(count_part) {
            if let Some(unit) = unit_seconds(unit_part.trim()) {
                let count: u64 = count_part.parse().map_err(|_| invalid())?;
                return count.checked_mul(unit).ok_or_else(invalid);
            }
        }
    }

    Err(invalid())
}

/// Render seconds as human period notation
///
/// Picks the largest unit that divides the value exactly, checked
/// year → month → week → day → hour → minute. A count of one renders as
/// the bare unit name ("month"); larger counts render as `"<n> <unit>s"`.
/// Values no unit divides fall back to `"<n> seconds"`; zero renders
/// as `"0"`.
///
/// # Arguments
/// * `seconds` - The period in seconds
///
/// # Returns
/// Human readable period string
///
/// # Examples
/// ```
/// use beaver_sdk::period::human_from_seconds;
///
/// assert_eq!(human_from_seconds(60), "minute");
/// assert_eq!(human_from_seconds(1_209_600), "2 weeks");
/// assert_eq!(human_from_seconds(90), "90 seconds");
/// assert_eq!(human_from_seconds(0), "0");
/// ```
#[must_use]
pub fn human_from_seconds(seconds: u64) -> String {
    if seconds == 0 {
        return "0".to_string();
    }

    for (unit, name) in UNITS {
        if seconds.checked_rem(unit) == Some(0) {
            let count = seconds.checked_div(unit).unwrap_or(0);
            return if count == 1 {
                name.to_string()
            } else {
                format!("{count} {name}s")
            };
        }
    }

    format!("{seconds} seconds")
}
