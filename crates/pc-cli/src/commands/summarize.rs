//! Summarize command: reconstructs sessions from a JSON file of punches.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pc_core::{ClockEvent, ist_date};

use crate::Config;
use crate::commands::util::summarize;
use crate::render::{DayHeader, format_dashboard, format_dashboard_json};

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// JSON file holding an array of `{"inOutType", "clockTime"}` objects.
    pub file: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Fail on punches with unreadable timestamps instead of skipping them.
    #[arg(long)]
    pub strict: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &SummarizeArgs, _config: &Config) -> Result<()> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let events: Vec<ClockEvent> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse clock events in {}", args.file.display()))?;
    tracing::debug!(count = events.len(), "loaded clock events");

    let summary = summarize(&events, args.strict)?;
    let header = DayHeader {
        date: summary.first_punch_in.map(ist_date),
        ..DayHeader::default()
    };

    if args.json {
        writeln!(writer, "{}", format_dashboard_json(&header, &summary)?)?;
    } else {
        write!(writer, "{}", format_dashboard(&header, &summary))?;
    }
    Ok(())
}
