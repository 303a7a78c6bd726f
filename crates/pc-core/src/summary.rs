//! Session reconstruction and daily time accounting.
//!
//! Turns one day's raw clock events into paired work sessions, work and
//! break totals, the clamped first punch-in and a status against the fixed
//! daily target.
//!
//! # Algorithm Summary
//!
//! 1. Parse every timestamp as UTC; malformed ones are skipped or rejected
//!    depending on [`InvalidTimestampPolicy`]
//! 2. Stable-sort by instant (ties keep input order)
//! 3. Clamp the first `IN` to the start of the workday
//! 4. Single forward scan pairing each `IN` with an immediately following
//!    `OUT`; anything else is an orphan and is skipped
//! 5. Classify the day against [`REQUIRED_MINUTES`]

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::punch::{PunchEvent, PunchKind};
use crate::time::{
    clamp_to_day_start, format_ist, format_minutes, minutes_between, parse_utc_timestamp,
};

/// Daily work target: 8 hours 15 minutes.
pub const REQUIRED_MINUTES: f64 = 495.0;

/// What to do with a clock event whose timestamp cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidTimestampPolicy {
    /// Drop the event before pairing and report it in [`DaySummary::skipped`].
    #[default]
    Skip,
    /// Fail the whole summary on the first malformed event.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("invalid timestamp {value:?} in clock event #{index}")]
    InvalidTimestamp { index: usize, value: String },
}

/// Classification of the day's worked time against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Complete,
    Incomplete,
    Overtime,
}

impl DayStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
            Self::Overtime => "overtime",
        }
    }

    /// Classifies worked minutes against a target.
    ///
    /// Overtime wins over complete only when the surplus is strictly positive.
    pub fn classify(total_work_minutes: f64, required_minutes: f64) -> Self {
        let difference = total_work_minutes - required_minutes;
        if total_work_minutes >= required_minutes {
            if difference > 0.0 {
                Self::Overtime
            } else {
                Self::Complete
            }
        } else {
            Self::Incomplete
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One paired IN→OUT interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkSession {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_display: String,
    pub end_display: String,
    /// Minutes from start to end, never negative.
    pub duration_minutes: f64,
}

impl WorkSession {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            start_display: format_ist(start),
            end_display: format_ist(end),
            duration_minutes: minutes_between(start, end).max(0.0),
        }
    }

    pub fn duration_formatted(&self) -> String {
        format_minutes(self.duration_minutes)
    }
}

/// A clock event dropped because its timestamp could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEvent {
    /// Position in the caller's input.
    pub index: usize,
    pub clock_time: String,
}

/// Summary of one day's attendance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    /// Sessions in chronological pairing order. Gaps between them are breaks.
    pub sessions: Vec<WorkSession>,
    pub total_work_minutes: f64,
    pub total_break_minutes: f64,
    /// Gap between the last session's `OUT` and a trailing `IN` that is still
    /// open. Not part of `total_break_minutes` until that `IN` is closed.
    pub open_break_minutes: f64,
    pub required_minutes: f64,
    /// `total_work_minutes - required_minutes`, negative on a shortfall.
    pub difference_minutes: f64,
    /// First `IN`, clamped to the start of the workday.
    pub first_punch_in: Option<DateTime<Utc>>,
    pub first_punch_in_display: Option<String>,
    pub status: DayStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEvent>,
}

impl DaySummary {
    pub fn total_work_formatted(&self) -> String {
        format_minutes(self.total_work_minutes)
    }

    pub fn total_break_formatted(&self) -> String {
        format_minutes(self.total_break_minutes)
    }

    pub fn required_formatted(&self) -> String {
        format_minutes(self.required_minutes)
    }

    pub fn difference_formatted(&self) -> String {
        format_minutes(self.difference_minutes)
    }
}

#[derive(Debug, Clone, Copy)]
struct Punch {
    kind: PunchKind,
    at: DateTime<Utc>,
}

/// Reconstructs work sessions from one day's clock events.
///
/// Events may arrive in any order and may contain unmatched punches. Pairing
/// is by adjacency in sorted order: an `IN` pairs only with the event right
/// after it, and only if that event is an `OUT`. A break is the gap between a
/// session's `OUT` and an immediately following `IN` that itself opens a
/// session; nothing before the first session or after the last one counts.
///
/// With [`InvalidTimestampPolicy::Skip`] this never fails.
pub fn summarize_day<E: PunchEvent>(
    events: &[E],
    policy: InvalidTimestampPolicy,
) -> Result<DaySummary, SummaryError> {
    let mut skipped = Vec::new();
    let mut punches = Vec::with_capacity(events.len());

    for (index, event) in events.iter().enumerate() {
        match parse_utc_timestamp(event.clock_time()) {
            Ok(at) => punches.push(Punch {
                kind: event.kind(),
                at,
            }),
            Err(_) => {
                let value = event.clock_time().to_string();
                match policy {
                    InvalidTimestampPolicy::Skip => skipped.push(SkippedEvent {
                        index,
                        clock_time: value,
                    }),
                    InvalidTimestampPolicy::Reject => {
                        return Err(SummaryError::InvalidTimestamp { index, value });
                    }
                }
            }
        }
    }

    // Stable: equal instants keep input order.
    punches.sort_by_key(|punch| punch.at);

    let first_punch_in = punches
        .iter()
        .find(|punch| punch.kind == PunchKind::In)
        .map(|punch| clamp_to_day_start(punch.at));

    let mut sessions = Vec::new();
    let mut total_break_minutes = 0.0;
    let mut cursor = 0;

    while cursor < punches.len() {
        if let Some(out_at) = session_end_at(&punches, cursor) {
            let in_at = punches[cursor].at;
            sessions.push(WorkSession::new(in_at, out_at));

            let next = cursor + 2;
            if session_end_at(&punches, next).is_some() {
                total_break_minutes += minutes_between(out_at, punches[next].at).max(0.0);
            }
            cursor = next;
        } else {
            // Orphan IN, orphan OUT, or out-of-order data.
            cursor += 1;
        }
    }

    let open_break_minutes = match (sessions.last(), punches.last()) {
        (Some(last), Some(punch)) if punch.kind == PunchKind::In && punch.at >= last.end => {
            minutes_between(last.end, punch.at)
        }
        _ => 0.0,
    };

    let total_work_minutes: f64 = sessions.iter().map(|s| s.duration_minutes).sum();
    let difference_minutes = total_work_minutes - REQUIRED_MINUTES;

    Ok(DaySummary {
        sessions,
        total_work_minutes,
        total_break_minutes,
        open_break_minutes,
        required_minutes: REQUIRED_MINUTES,
        difference_minutes,
        first_punch_in,
        first_punch_in_display: first_punch_in.map(format_ist),
        status: DayStatus::classify(total_work_minutes, REQUIRED_MINUTES),
        skipped,
    })
}

/// If `punches[index]` is an `IN` directly followed by an `OUT`, returns the
/// `OUT` instant.
fn session_end_at(punches: &[Punch], index: usize) -> Option<DateTime<Utc>> {
    match (punches.get(index), punches.get(index + 1)) {
        (Some(start), Some(end)) if start.kind == PunchKind::In && end.kind == PunchKind::Out => {
            Some(end.at)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::punch::ClockEvent;
    use chrono::TimeZone;

    fn punch_in(time: &str) -> ClockEvent {
        ClockEvent::new(PunchKind::In, format!("2025-01-15T{time}:00Z"))
    }

    fn punch_out(time: &str) -> ClockEvent {
        ClockEvent::new(PunchKind::Out, format!("2025-01-15T{time}:00Z"))
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, h, m, 0).unwrap()
    }

    fn summarize(events: &[ClockEvent]) -> DaySummary {
        summarize_day(events, InvalidTimestampPolicy::Skip).unwrap()
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_events() {
        let summary = summarize(&[]);
        assert!(summary.sessions.is_empty());
        approx(summary.total_work_minutes, 0.0);
        approx(summary.total_break_minutes, 0.0);
        approx(summary.difference_minutes, -495.0);
        assert_eq!(summary.first_punch_in, None);
        assert_eq!(summary.first_punch_in_display, None);
        assert_eq!(summary.status, DayStatus::Incomplete);
    }

    #[test]
    fn test_zero_length_session() {
        let summary = summarize(&[punch_in("09:00"), punch_out("09:00")]);
        assert_eq!(summary.sessions.len(), 1);
        approx(summary.sessions[0].duration_minutes, 0.0);
        approx(summary.total_work_minutes, 0.0);
        assert_eq!(summary.status, DayStatus::Incomplete);
    }

    #[test]
    fn test_early_punch_clamps_first_punch_only() {
        let summary = summarize(&[punch_in("03:00"), punch_out("07:00")]);
        assert_eq!(summary.first_punch_in, Some(utc(4, 0)));
        assert_eq!(summary.first_punch_in_display.as_deref(), Some("09:30 AM"));

        // Session math uses the raw IN, not the clamped one.
        assert_eq!(summary.sessions[0].start, utc(3, 0));
        assert_eq!(summary.sessions[0].start_display, "08:30 AM");
        approx(summary.sessions[0].duration_minutes, 240.0);
        approx(summary.total_work_minutes, 240.0);
    }

    #[test]
    fn test_exact_target_is_complete() {
        let summary = summarize(&[punch_in("04:00"), punch_out("12:15")]);
        approx(summary.total_work_minutes, 495.0);
        approx(summary.difference_minutes, 0.0);
        assert_eq!(summary.status, DayStatus::Complete);
        assert_eq!(summary.difference_formatted(), "0h 00m");
    }

    #[test]
    fn test_two_sessions_with_break_is_overtime() {
        let summary = summarize(&[
            punch_in("04:00"),
            punch_out("08:00"),
            punch_in("08:30"),
            punch_out("13:00"),
        ]);
        assert_eq!(summary.sessions.len(), 2);
        approx(summary.sessions[0].duration_minutes, 240.0);
        approx(summary.sessions[1].duration_minutes, 270.0);
        approx(summary.total_break_minutes, 30.0);
        approx(summary.total_work_minutes, 510.0);
        approx(summary.difference_minutes, 15.0);
        assert_eq!(summary.status, DayStatus::Overtime);
        assert_eq!(summary.total_work_formatted(), "8h 30m");
        assert_eq!(summary.total_break_formatted(), "0h 30m");
        assert_eq!(summary.required_formatted(), "8h 15m");
        assert_eq!(summary.difference_formatted(), "0h 15m");
    }

    #[test]
    fn test_orphan_in_before_session() {
        let summary = summarize(&[punch_in("04:00"), punch_in("05:00"), punch_out("06:00")]);
        assert_eq!(summary.sessions.len(), 1);
        assert_eq!(summary.sessions[0].start, utc(5, 0));
        approx(summary.total_work_minutes, 60.0);
        approx(summary.total_break_minutes, 0.0);
        // The orphan still counts as the day's first punch.
        assert_eq!(summary.first_punch_in, Some(utc(4, 0)));
    }

    #[test]
    fn test_orphan_out_is_skipped() {
        let summary = summarize(&[punch_out("03:30"), punch_in("04:00"), punch_out("05:00")]);
        assert_eq!(summary.sessions.len(), 1);
        approx(summary.total_work_minutes, 60.0);
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_pairing() {
        let summary = summarize(&[
            punch_out("13:00"),
            punch_in("08:30"),
            punch_out("08:00"),
            punch_in("04:00"),
        ]);
        assert_eq!(summary.sessions.len(), 2);
        assert_eq!(summary.sessions[0].start, utc(4, 0));
        assert_eq!(summary.sessions[1].end, utc(13, 0));
        approx(summary.total_break_minutes, 30.0);
        approx(summary.total_work_minutes, 510.0);
    }

    #[test]
    fn test_equal_instants_keep_input_order() {
        // OUT listed first stays first, so the IN is left without a partner.
        let out_first = summarize(&[punch_out("05:00"), punch_in("05:00")]);
        assert!(out_first.sessions.is_empty());

        let in_first = summarize(&[punch_in("05:00"), punch_out("05:00")]);
        assert_eq!(in_first.sessions.len(), 1);
    }

    #[test]
    fn test_trailing_in_is_not_break() {
        let summary = summarize(&[punch_in("04:00"), punch_out("08:00"), punch_in("09:00")]);
        assert_eq!(summary.sessions.len(), 1);
        approx(summary.total_break_minutes, 0.0);
        approx(summary.total_work_minutes, 240.0);
        approx(summary.open_break_minutes, 60.0);
    }

    #[test]
    fn test_open_break_only_for_trailing_in() {
        let closed = summarize(&[punch_in("04:00"), punch_out("08:00")]);
        approx(closed.open_break_minutes, 0.0);

        let single = summarize(&[punch_in("04:00")]);
        approx(single.open_break_minutes, 0.0);

        let later_out = summarize(&[
            punch_in("04:00"),
            punch_out("08:00"),
            punch_in("08:30"),
            punch_out("09:00"),
            punch_in("09:15"),
        ]);
        approx(later_out.total_break_minutes, 30.0);
        approx(later_out.open_break_minutes, 15.0);
    }

    #[test]
    fn test_gap_to_orphan_in_is_not_break() {
        let summary = summarize(&[
            punch_in("04:00"),
            punch_out("06:00"),
            punch_in("06:30"),
            punch_in("07:00"),
            punch_out("08:00"),
        ]);
        assert_eq!(summary.sessions.len(), 2);
        approx(summary.total_break_minutes, 0.0);
        approx(summary.total_work_minutes, 180.0);
    }

    #[test]
    fn test_double_in_with_late_out_drops_first_in() {
        let summary = summarize(&[
            punch_in("04:00"),
            punch_out("06:00"),
            punch_in("07:00"),
            punch_in("07:05"),
            punch_out("12:00"),
        ]);
        assert_eq!(summary.sessions.len(), 2);
        assert_eq!(summary.sessions[1].start, utc(7, 5));
        approx(summary.total_work_minutes, 120.0 + 295.0);
    }

    #[test]
    fn test_total_work_is_sum_of_sessions() {
        let summary = summarize(&[
            punch_in("04:00"),
            punch_out("05:10"),
            punch_in("05:20"),
            punch_out("07:45"),
            punch_in("08:15"),
            punch_out("12:01"),
        ]);
        let sum: f64 = summary.sessions.iter().map(|s| s.duration_minutes).sum();
        approx(summary.total_work_minutes, sum);
        approx(summary.total_break_minutes, 10.0 + 30.0);
        assert_eq!(summary.status, DayStatus::Incomplete);
        approx(summary.total_work_minutes, 441.0);
        approx(summary.difference_minutes, -54.0);
        assert_eq!(summary.difference_formatted(), "-0h 54m");
    }

    #[test]
    fn test_reversed_session_duration_is_floored() {
        let session = WorkSession::new(utc(8, 0), utc(7, 0));
        approx(session.duration_minutes, 0.0);
    }

    #[test]
    fn test_seconds_contribute_fractional_minutes() {
        let events = [
            ClockEvent::new(PunchKind::In, "2025-01-15T04:00:00"),
            ClockEvent::new(PunchKind::Out, "2025-01-15T04:00:30"),
        ];
        let summary = summarize(&events);
        approx(summary.total_work_minutes, 0.5);
    }

    #[test]
    fn test_skip_policy_drops_malformed_event() {
        let events = [
            punch_in("04:00"),
            ClockEvent::new(PunchKind::Out, "not a time"),
            punch_out("06:00"),
        ];
        let summary = summarize(&events);
        assert_eq!(summary.sessions.len(), 1);
        approx(summary.total_work_minutes, 120.0);
        assert_eq!(
            summary.skipped,
            vec![SkippedEvent {
                index: 1,
                clock_time: "not a time".to_string(),
            }]
        );
    }

    #[test]
    fn test_skip_policy_malformed_in_does_not_become_first_punch() {
        let events = [ClockEvent::new(PunchKind::In, ""), punch_in("05:00"), punch_out("06:00")];
        let summary = summarize(&events);
        assert_eq!(summary.first_punch_in, Some(utc(5, 0)));
        assert_eq!(summary.skipped.len(), 1);
    }

    #[test]
    fn test_reject_policy_fails_on_malformed_event() {
        let events = [punch_in("04:00"), ClockEvent::new(PunchKind::Out, "garbage")];
        let err = summarize_day(&events, InvalidTimestampPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            SummaryError::InvalidTimestamp {
                index: 1,
                value: "garbage".to_string(),
            }
        );
    }

    #[test]
    fn test_reject_policy_accepts_clean_input() {
        let events = [punch_in("04:00"), punch_out("12:15")];
        let summary = summarize_day(&events, InvalidTimestampPolicy::Reject).unwrap();
        assert_eq!(summary.status, DayStatus::Complete);
        assert!(summary.skipped.is_empty());
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(DayStatus::classify(494.99, 495.0), DayStatus::Incomplete);
        assert_eq!(DayStatus::classify(495.0, 495.0), DayStatus::Complete);
        assert_eq!(DayStatus::classify(495.01, 495.0), DayStatus::Overtime);
    }

    #[test]
    fn test_summary_serializes_status_lowercase() {
        let summary = summarize(&[punch_in("04:00"), punch_out("12:15")]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["first_punch_in_display"], "09:30 AM");
        assert!(json.get("skipped").is_none());
    }
}
