//! Live progress derived from a cached day summary and the current instant.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::summary::DaySummary;
use crate::time::{format_ist, minutes_between};

/// Where the day stands at a given instant.
///
/// Recomputed on every tick of a periodic refresh; holds no state of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveProgress {
    pub now: DateTime<Utc>,
    /// Minutes since the (clamped) first punch-in.
    pub elapsed_minutes: f64,
    /// Elapsed minutes minus recorded breaks, including one still followed by
    /// an open `IN`.
    pub net_work_minutes: f64,
    pub remaining_minutes: f64,
    /// First punch-in plus the daily target plus all breaks so far.
    pub expected_leave: DateTime<Utc>,
    pub expected_leave_display: String,
    /// Share of the target covered, capped at 100.
    pub percent_complete: f64,
    pub target_reached: bool,
}

impl LiveProgress {
    /// Combines `summary` with `now`. Returns `None` before the first punch-in.
    #[allow(clippy::cast_possible_truncation)]
    pub fn at(summary: &DaySummary, now: DateTime<Utc>) -> Option<Self> {
        let first_punch_in = summary.first_punch_in?;

        let elapsed_minutes = minutes_between(first_punch_in, now).max(0.0);
        let break_minutes = summary.total_break_minutes + summary.open_break_minutes;
        let net_work_minutes = (elapsed_minutes - break_minutes).max(0.0);
        let remaining_minutes = (summary.required_minutes - net_work_minutes).max(0.0);

        let leave_offset_ms =
            ((summary.required_minutes + break_minutes) * 60_000.0).round() as i64;
        let expected_leave = first_punch_in + Duration::milliseconds(leave_offset_ms);

        let percent_complete = if summary.required_minutes > 0.0 {
            (net_work_minutes / summary.required_minutes * 100.0).min(100.0)
        } else {
            100.0
        };

        Some(Self {
            now,
            elapsed_minutes,
            net_work_minutes,
            remaining_minutes,
            expected_leave,
            expected_leave_display: format_ist(expected_leave),
            percent_complete,
            target_reached: net_work_minutes >= summary.required_minutes,
        })
    }
}
