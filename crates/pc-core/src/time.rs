//! Timestamp parsing, India Standard Time rendering and duration formatting.
//!
//! All attendance data is anchored to IST (UTC+05:30, no daylight saving).
//! Rendering always goes through the fixed offset so the output does not
//! depend on the host's local timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use thiserror::Error;

/// India Standard Time as a fixed offset.
pub const IST: FixedOffset = match FixedOffset::east_opt(5 * 3600 + 30 * 60) {
    Some(offset) => offset,
    None => panic!("IST offset out of range"),
};

/// UTC hour at which the effective workday starts (09:30 IST).
pub const DAY_START_UTC_HOUR: u32 = 4;

/// Naive layouts the HR service is known to emit, all implicitly UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Parses a clock timestamp as a UTC instant.
///
/// Timestamps with an explicit zone (`Z` or a numeric offset) are honoured.
/// Timestamps without one are treated as UTC, never as host-local time.
pub fn parse_utc_timestamp(value: &str) -> Result<DateTime<Utc>, TimeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TimeError::InvalidTimestamp(value.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    // RFC 3339 needs seconds; `2025-01-15T04:00Z` falls through to here.
    let naive = trimmed.strip_suffix(['Z', 'z']).unwrap_or(trimmed);
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimeError::InvalidTimestamp(value.to_string()))
}

/// Renders an instant as `hh:mm AM/PM` wall-clock time in IST.
pub fn format_ist(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&IST).format("%I:%M %p").to_string()
}

/// Returns the IST calendar date of an instant.
pub fn ist_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&IST).date_naive()
}

/// Formats a signed minute count as `"{sign}{h}h {mm}m"`.
///
/// Hours and minutes come from the absolute value and are floored; the sign
/// is kept so a shortfall renders as e.g. `-1h 15m`.
#[allow(clippy::cast_possible_truncation)]
pub fn format_minutes(minutes: f64) -> String {
    let abs = minutes.abs();
    let hours = (abs / 60.0).floor() as i64;
    let mins = (abs % 60.0).floor() as i64;
    let sign = if minutes < 0.0 { "-" } else { "" };
    format!("{sign}{hours}h {mins:02}m")
}

/// Clamps an instant to the start of the workday.
///
/// Anything before 04:00 UTC (09:30 IST) on its UTC calendar day is moved to
/// 04:00 UTC of that day. Later instants are returned unchanged.
pub fn clamp_to_day_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    if instant.hour() >= DAY_START_UTC_HOUR {
        return instant;
    }
    instant
        .date_naive()
        .and_hms_opt(DAY_START_UTC_HOUR, 0, 0)
        .map_or(instant, |start| start.and_utc())
}

/// Signed number of minutes from `start` to `end`.
#[allow(clippy::cast_precision_loss)]
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}
