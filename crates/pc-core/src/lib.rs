//! Core attendance logic for punchcard.
//!
//! This crate contains the pure, deterministic pieces of the dashboard:
//! - Time: UTC timestamp parsing, IST rendering, duration formatting, day-start clamp
//! - Summary: pairing clock events into work sessions and classifying the day
//! - Live: recombining a cached summary with the current instant

pub mod live;
pub mod punch;
pub mod summary;
pub mod time;

pub use live::LiveProgress;
pub use punch::{ClockEvent, PunchEvent, PunchKind, UnknownPunchKind};
pub use summary::{
    DayStatus, DaySummary, InvalidTimestampPolicy, REQUIRED_MINUTES, SkippedEvent, SummaryError,
    WorkSession, summarize_day,
};
pub use time::{
    IST, TimeError, clamp_to_day_start, format_ist, format_minutes, ist_date, parse_utc_timestamp,
};
