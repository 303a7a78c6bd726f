//! CLI subcommand implementations.

pub mod holidays;
pub mod login;
pub mod logout;
pub mod status;
pub mod summarize;
pub mod today;
pub mod util;
pub mod watch;
