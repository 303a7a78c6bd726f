//! Holidays command: lists upcoming holidays from the HR service.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use pc_api::HolidayDetail;

use crate::Config;
use crate::commands::util::{api_error, client, open_database, require_session, runtime};

#[derive(Debug, Args)]
pub struct HolidaysArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Formats holidays as an aligned list.
pub fn format_holidays(holidays: &[HolidayDetail]) -> String {
    let mut output = String::new();
    writeln!(output, "UPCOMING HOLIDAYS").unwrap();
    writeln!(output, "─────────────────").unwrap();

    if holidays.is_empty() {
        writeln!(output, "No upcoming holidays.").unwrap();
        return output;
    }

    for holiday in holidays {
        let when = format!("{:0>2} {}", holiday.day, holiday.month);
        write!(output, "{when:<10}{}", holiday.holiday_name).unwrap();
        if holiday.is_optional {
            write!(output, " (optional)").unwrap();
        }
        if !holiday.state_name.is_empty() {
            write!(output, " [{}]", holiday.state_name.join(", ")).unwrap();
        }
        writeln!(output).unwrap();
    }
    output
}

pub fn run<W: Write>(writer: &mut W, args: &HolidaysArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let session = require_session(&db)?;
    let client = client(config)?;
    let events = runtime()?
        .block_on(client.upcoming_events(&session))
        .map_err(|err| api_error(err, "failed to fetch holidays"))?;
    tracing::debug!(count = events.holiday_details.len(), "fetched holidays");

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&events.holiday_details)?)?;
    } else {
        write!(writer, "{}", format_holidays(&events.holiday_details))?;
    }
    Ok(())
}
