//! Today command: the attendance dashboard for one day.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use crate::Config;
use crate::commands::util::{load_day, open_database, summarize, today_ist};
use crate::render::{DayHeader, format_dashboard, format_dashboard_json};

#[derive(Debug, Args)]
pub struct TodayArgs {
    /// Day to show (YYYY-MM-DD). Defaults to today in IST.
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Use cached punches instead of contacting the HR service.
    #[arg(long)]
    pub offline: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Fail on punches with unreadable timestamps instead of skipping them.
    #[arg(long)]
    pub strict: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &TodayArgs, config: &Config) -> Result<()> {
    let date = args.date.unwrap_or_else(today_ist);
    let mut db = open_database(config)?;
    let (fetch, events) = load_day(&mut db, config, date, args.offline)?;
    let summary = summarize(&events, args.strict)?;

    let session = db.load_session()?;
    let header = DayHeader {
        date: Some(date),
        employee: session
            .as_ref()
            .map(|s| s.employee_name.as_str())
            .filter(|name| !name.is_empty()),
        shift_name: fetch.shift_name.as_deref(),
        policy_name: fetch.policy_name.as_deref(),
    };

    if args.json {
        writeln!(writer, "{}", format_dashboard_json(&header, &summary)?)?;
    } else {
        write!(writer, "{}", format_dashboard(&header, &summary))?;
    }
    Ok(())
}
