//! Logout command: forgets the stored session and cached punches.

use std::io::Write;

use anyhow::Result;

use crate::Config;
use crate::commands::util::open_database;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let was_logged_in = db.load_session()?.is_some();
    db.clear_session()?;

    if was_logged_in {
        writeln!(writer, "Logged out.")?;
    } else {
        writeln!(writer, "Not logged in.")?;
    }
    Ok(())
}
