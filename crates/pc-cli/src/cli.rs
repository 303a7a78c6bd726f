//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::holidays::HolidaysArgs;
use crate::commands::login::LoginArgs;
use crate::commands::summarize::SummarizeArgs;
use crate::commands::today::TodayArgs;
use crate::commands::watch::WatchArgs;

/// Attendance dashboard.
///
/// Pulls the day's clock-in/clock-out punches from the HR service and shows
/// worked time, breaks and how the day compares with the 8h 15m target.
#[derive(Debug, Parser)]
#[command(name = "punch", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in to the HR service and remember the session.
    Login(LoginArgs),

    /// Forget the stored session and cached punches.
    Logout,

    /// Show the attendance summary for a day.
    Today(TodayArgs),

    /// Keep refreshing live progress towards the daily target.
    Watch(WatchArgs),

    /// List upcoming holidays.
    Holidays(HolidaysArgs),

    /// Summarize clock events from a JSON file without the network.
    Summarize(SummarizeArgs),

    /// Show session and cache status.
    Status,
}
