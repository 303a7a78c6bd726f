//! Watch command: periodically reports live progress towards the target.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use pc_api::{AuthSession, Client};
use pc_core::{DaySummary, LiveProgress};
use pc_db::Database;

use crate::Config;
use crate::commands::util::{
    api_error, cached_fetch, client, open_database, require_session, runtime, summarize, today_ist,
};
use crate::render::format_progress_line;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes. Defaults to the configured interval.
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Use cached punches instead of contacting the HR service.
    #[arg(long)]
    pub offline: bool,
}

/// Tracks whether the completion message has been printed.
#[derive(Debug, Default)]
pub struct CompletionNotice {
    shown: bool,
}

impl CompletionNotice {
    /// Returns true the first time `progress` reaches the target.
    pub fn observe(&mut self, progress: &LiveProgress) -> bool {
        if progress.target_reached && !self.shown {
            self.shown = true;
            return true;
        }
        false
    }
}

/// Where the watched day's punches come from on each refresh.
struct DaySource {
    db: Database,
    date: NaiveDate,
    online: Option<(Client, AuthSession)>,
}

impl DaySource {
    /// Re-fetches the day when online, then summarizes the cached punches.
    async fn load(&mut self) -> Result<DaySummary> {
        if let Some((client, session)) = &self.online {
            let details = client
                .clock_in_details(session, self.date)
                .await
                .map_err(|err| api_error(err, "failed to fetch clock-in details"))?;
            let stored = self.db.replace_day(self.date, &details, Utc::now())?;
            tracing::debug!(date = %self.date, stored, "refreshed clock events");
        } else {
            cached_fetch(&self.db, self.date)?;
        }
        let events = self.db.list_clock_events(self.date)?;
        summarize(&events, false)
    }
}

pub fn run<W: Write>(writer: &mut W, args: &WatchArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let online = if args.offline {
        None
    } else {
        let session = require_session(&db)?;
        Some((client(config)?, session))
    };
    let mut source = DaySource {
        db,
        date: today_ist(),
        online,
    };

    let secs = args.interval.unwrap_or(config.watch_interval_secs).max(1);
    tracing::debug!(date = %source.date, secs, "watching live progress");
    runtime()?.block_on(watch(writer, &mut source, Duration::from_secs(secs)))
}

async fn watch<W: Write>(writer: &mut W, source: &mut DaySource, period: Duration) -> Result<()> {
    let mut summary = source.load().await?;
    if summary.first_punch_in.is_none() {
        writeln!(writer, "No clock in/out records today")?;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    let mut notice = CompletionNotice::default();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        if let Some(progress) = LiveProgress::at(&summary, Utc::now()) {
            writeln!(writer, "{}", format_progress_line(&progress))?;
            if notice.observe(&progress) {
                writeln!(writer, "Target reached. You can leave now!")?;
            }
            writer.flush()?;
        }

        tokio::select! {
            _ = ticker.tick() => {
                match source.load().await {
                    Ok(fresh) => summary = fresh,
                    Err(err) => tracing::warn!(error = %err, "refresh failed, keeping last summary"),
                }
            }
            result = &mut shutdown => {
                result?;
                writeln!(writer)?;
                break;
            }
        }
    }

    Ok(())
}
