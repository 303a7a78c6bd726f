//! Status command: stored session and cached days.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use pc_core::IST;

use crate::Config;
use crate::commands::util::open_database;
use crate::config::dirs_config_path;

/// `config_path` is the `--config` override, if any.
pub fn run<W: Write>(writer: &mut W, config: &Config, config_path: Option<&Path>) -> Result<()> {
    let db = open_database(config)?;

    writeln!(writer, "Punch status")?;
    match config_path
        .map(Path::to_path_buf)
        .or_else(|| dirs_config_path().map(|dir| dir.join("config.toml")))
    {
        Some(path) => writeln!(writer, "Config: {}", path.display())?,
        None => writeln!(writer, "Config: (none)")?,
    }
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "API: {}", config.api_base_url)?;

    match db.load_session()? {
        Some(session) if session.employee_name.is_empty() => {
            writeln!(writer, "Logged in as: {}", session.employee_code)?;
        }
        Some(session) => {
            writeln!(
                writer,
                "Logged in as: {} ({})",
                session.employee_name, session.employee_code
            )?;
        }
        None => writeln!(writer, "Not logged in.")?,
    }

    let fetches = db.list_fetches()?;
    if fetches.is_empty() {
        writeln!(writer, "No cached days.")?;
        return Ok(());
    }

    writeln!(writer, "Cached days:")?;
    for fetch in fetches {
        let noun = if fetch.event_count == 1 { "punch" } else { "punches" };
        write!(writer, "- {}: {} {noun}", fetch.attendance_date, fetch.event_count)?;
        if let Some(shift) = &fetch.shift_name {
            write!(writer, " ({shift})")?;
        }
        writeln!(
            writer,
            ", fetched {}",
            fetch.fetched_at.with_timezone(&IST).format("%Y-%m-%d %I:%M %p IST")
        )?;
    }

    Ok(())
}
