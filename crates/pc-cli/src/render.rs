//! Text and JSON rendering of the attendance dashboard.

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use pc_core::{DayStatus, DaySummary, IST, LiveProgress, format_minutes};
use serde::Serialize;

/// Context shown above the summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayHeader<'a> {
    pub date: Option<NaiveDate>,
    pub employee: Option<&'a str>,
    pub shift_name: Option<&'a str>,
    pub policy_name: Option<&'a str>,
}

/// The status tile: `Complete`, `Overtime +…` or `Incomplete (-…)`.
pub fn status_line(summary: &DaySummary) -> String {
    match summary.status {
        DayStatus::Complete => "Complete".to_string(),
        DayStatus::Overtime => format!("Overtime +{}", summary.difference_formatted()),
        DayStatus::Incomplete => format!("Incomplete ({})", summary.difference_formatted()),
    }
}

fn shift_line(header: &DayHeader<'_>) -> Option<String> {
    match (header.policy_name, header.shift_name) {
        (Some(policy), Some(shift)) => Some(format!("{policy} • Shift: {shift}")),
        (None, Some(shift)) => Some(format!("Shift: {shift}")),
        (Some(policy), None) => Some(policy.to_string()),
        (None, None) => None,
    }
}

/// Formats the human-readable dashboard.
#[allow(clippy::cast_possible_truncation)]
pub fn format_dashboard(header: &DayHeader<'_>, summary: &DaySummary) -> String {
    let mut output = String::new();

    match header.date {
        Some(date) => writeln!(output, "ATTENDANCE: {}", date.format("%A, %B %-d, %Y")).unwrap(),
        None => writeln!(output, "ATTENDANCE").unwrap(),
    }
    if let Some(employee) = header.employee {
        writeln!(output, "{employee}").unwrap();
    }
    if let Some(line) = shift_line(header) {
        writeln!(output, "{line}").unwrap();
    }

    // Summary tiles
    writeln!(output).unwrap();
    let punch_in = summary.first_punch_in_display.as_deref().unwrap_or("--:--");
    writeln!(output, "Punch in:     {punch_in}").unwrap();
    writeln!(output, "Total work:   {}", summary.total_work_formatted()).unwrap();
    writeln!(output, "Total break:  {}", summary.total_break_formatted()).unwrap();
    writeln!(output, "Required:     {}", summary.required_formatted()).unwrap();
    writeln!(output, "Status:       {}", status_line(summary)).unwrap();

    // Sessions
    writeln!(output).unwrap();
    writeln!(output, "SESSIONS").unwrap();
    writeln!(output, "────────").unwrap();
    if summary.sessions.is_empty() {
        writeln!(output, "No clock in/out records today").unwrap();
    } else {
        for (i, session) in summary.sessions.iter().enumerate() {
            writeln!(
                output,
                "Session {}  IN: {} • OUT: {}  {} ({} min)",
                i + 1,
                session.start_display,
                session.end_display,
                session.duration_formatted(),
                session.duration_minutes.round() as i64,
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        writeln!(output, "Total work time:  {}", summary.total_work_formatted()).unwrap();
        writeln!(output, "Required time:    {}", summary.required_formatted()).unwrap();
        writeln!(output, "Difference:       {}", summary.difference_formatted()).unwrap();
    }

    match summary.skipped.len() {
        0 => {}
        1 => {
            writeln!(output).unwrap();
            writeln!(output, "Skipped 1 clock event with an unreadable timestamp.").unwrap();
        }
        n => {
            writeln!(output).unwrap();
            writeln!(output, "Skipped {n} clock events with unreadable timestamps.").unwrap();
        }
    }

    output
}

/// JSON dashboard structure.
#[derive(Debug, Serialize)]
pub struct JsonDashboard<'a> {
    pub date: Option<String>,
    pub shift_name: Option<&'a str>,
    pub policy_name: Option<&'a str>,
    pub total_work_formatted: String,
    pub total_break_formatted: String,
    pub required_formatted: String,
    pub difference_formatted: String,
    #[serde(flatten)]
    pub summary: &'a DaySummary,
}

/// Formats the dashboard as pretty-printed JSON.
pub fn format_dashboard_json(header: &DayHeader<'_>, summary: &DaySummary) -> Result<String> {
    let dashboard = JsonDashboard {
        date: header.date.map(|d| d.format("%Y-%m-%d").to_string()),
        shift_name: header.shift_name,
        policy_name: header.policy_name,
        total_work_formatted: summary.total_work_formatted(),
        total_break_formatted: summary.total_break_formatted(),
        required_formatted: summary.required_formatted(),
        difference_formatted: summary.difference_formatted(),
        summary,
    };
    Ok(serde_json::to_string_pretty(&dashboard)?)
}

/// One status line for `punch watch`.
pub fn format_progress_line(progress: &LiveProgress) -> String {
    let now = progress.now.with_timezone(&IST).format("%I:%M:%S %p");
    format!(
        "[{now}] elapsed {} • worked {} • remaining {} • leave at {} • {:.0}%",
        format_minutes(progress.elapsed_minutes),
        format_minutes(progress.net_work_minutes),
        format_minutes(progress.remaining_minutes),
        progress.expected_leave_display,
        progress.percent_complete,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;
    use pc_core::{ClockEvent, InvalidTimestampPolicy, PunchKind, summarize_day};

    fn summary(events: &[(PunchKind, &str)]) -> DaySummary {
        let events: Vec<ClockEvent> = events
            .iter()
            .map(|(kind, time)| ClockEvent::new(*kind, *time))
            .collect();
        summarize_day(&events, InvalidTimestampPolicy::Skip).unwrap()
    }

    fn header() -> DayHeader<'static> {
        DayHeader {
            date: NaiveDate::from_ymd_opt(2025, 1, 15),
            employee: None,
            shift_name: Some("General"),
            policy_name: Some("Standard"),
        }
    }

    #[test]
    fn test_format_dashboard_two_sessions() {
        let summary = summary(&[
            (PunchKind::In, "2025-01-15T04:00:00"),
            (PunchKind::Out, "2025-01-15T08:00:00"),
            (PunchKind::In, "2025-01-15T08:30:00"),
            (PunchKind::Out, "2025-01-15T13:00:00"),
        ]);
        let output = format_dashboard(&header(), &summary);
        assert_snapshot!(output, @r"
        ATTENDANCE: Wednesday, January 15, 2025
        Standard • Shift: General

        Punch in:     09:30 AM
        Total work:   8h 30m
        Total break:  0h 30m
        Required:     8h 15m
        Status:       Overtime +0h 15m

        SESSIONS
        ────────
        Session 1  IN: 09:30 AM • OUT: 01:30 PM  4h 00m (240 min)
        Session 2  IN: 02:00 PM • OUT: 06:30 PM  4h 30m (270 min)

        Total work time:  8h 30m
        Required time:    8h 15m
        Difference:       0h 15m
        ");
    }

    #[test]
    fn test_format_dashboard_empty_day() {
        let output = format_dashboard(&DayHeader::default(), &summary(&[]));
        assert_snapshot!(output, @r"
        ATTENDANCE

        Punch in:     --:--
        Total work:   0h 00m
        Total break:  0h 00m
        Required:     8h 15m
        Status:       Incomplete (-8h 15m)

        SESSIONS
        ────────
        No clock in/out records today
        ");
    }

    #[test]
    fn test_format_dashboard_reports_skipped_events() {
        let summary = summary(&[
            (PunchKind::In, "2025-01-15T04:00:00"),
            (PunchKind::Out, "??"),
            (PunchKind::Out, ""),
        ]);
        let output = format_dashboard(&header(), &summary);
        assert!(output.contains("Skipped 2 clock events with unreadable timestamps."));
        assert!(output.contains("No clock in/out records today"));
    }

    #[test]
    fn test_status_line_variants() {
        let complete = summary(&[
            (PunchKind::In, "2025-01-15T04:00:00"),
            (PunchKind::Out, "2025-01-15T12:15:00"),
        ]);
        assert_eq!(status_line(&complete), "Complete");

        let short = summary(&[
            (PunchKind::In, "2025-01-15T04:00:00"),
            (PunchKind::Out, "2025-01-15T11:00:00"),
        ]);
        assert_eq!(status_line(&short), "Incomplete (-1h 15m)");
    }

    #[test]
    fn test_format_dashboard_json() {
        let summary = summary(&[
            (PunchKind::In, "2025-01-15T04:00:00"),
            (PunchKind::Out, "2025-01-15T12:15:00"),
        ]);
        let json = format_dashboard_json(&header(), &summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["date"], "2025-01-15");
        assert_eq!(value["status"], "complete");
        assert_eq!(value["total_work_formatted"], "8h 15m");
        assert_eq!(value["total_work_minutes"], 495.0);
        assert_eq!(value["sessions"][0]["start_display"], "09:30 AM");
    }

    #[test]
    fn test_format_progress_line() {
        let summary = summary(&[(PunchKind::In, "2025-01-15T04:00:00")]);
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
        let progress = LiveProgress::at(&summary, now).unwrap();
        assert_snapshot!(
            format_progress_line(&progress),
            @"[01:30:00 PM] elapsed 4h 00m • worked 4h 00m • remaining 4h 15m • leave at 05:45 PM • 48%"
        );
    }
}
