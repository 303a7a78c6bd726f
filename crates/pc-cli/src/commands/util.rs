//! Shared utilities for CLI commands.

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use pc_api::{ApiError, AuthSession, Client, ClockDetails};
use pc_core::{DaySummary, InvalidTimestampPolicy, PunchEvent, ist_date, summarize_day};
use pc_db::{Database, FetchRecord, StoredClockEvent};

use crate::Config;

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Returns the stored session or a hint to log in.
pub fn require_session(db: &Database) -> Result<AuthSession> {
    db.load_session()?
        .ok_or_else(|| anyhow!("not logged in (run 'punch login')"))
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")
}

pub fn client(config: &Config) -> Result<Client> {
    Client::new(config.api_base_url.clone()).context("failed to create HR API client")
}

/// Converts an API failure into a user-facing error.
pub fn api_error(err: ApiError, action: &str) -> anyhow::Error {
    match err {
        ApiError::Unauthorized => anyhow!("{action}: session expired (run 'punch login' again)"),
        other => anyhow::Error::new(other).context(action.to_string()),
    }
}

/// Fetches `date` from the HR service and replaces the cached copy.
pub fn fetch_day(
    db: &mut Database,
    config: &Config,
    session: &AuthSession,
    date: NaiveDate,
) -> Result<ClockDetails> {
    let client = client(config)?;
    let details = runtime()?
        .block_on(client.clock_in_details(session, date))
        .map_err(|err| api_error(err, "failed to fetch clock-in details"))?;
    let stored = db.replace_day(date, &details, Utc::now())?;
    tracing::info!(%date, stored, "fetched clock events");
    Ok(details)
}

/// The current calendar date in IST.
pub fn today_ist() -> NaiveDate {
    ist_date(Utc::now())
}

/// Refreshes `date` from the HR service unless `offline`, then reads it back
/// from the cache.
pub fn load_day(
    db: &mut Database,
    config: &Config,
    date: NaiveDate,
    offline: bool,
) -> Result<(FetchRecord, Vec<StoredClockEvent>)> {
    if !offline {
        let session = require_session(db)?;
        fetch_day(db, config, &session, date)?;
    }
    let fetch = cached_fetch(db, date)?;
    let events = db.list_clock_events(date)?;
    Ok((fetch, events))
}

/// Fetch metadata for `date`, or an error if it was never cached.
pub fn cached_fetch(db: &Database, date: NaiveDate) -> Result<FetchRecord> {
    db.last_fetch(date)?
        .ok_or_else(|| anyhow!("no cached punches for {date} (run 'punch today' online first)"))
}

/// Summarizes punches, logging any that were dropped.
pub fn summarize<E: PunchEvent>(events: &[E], strict: bool) -> Result<DaySummary> {
    let policy = if strict {
        InvalidTimestampPolicy::Reject
    } else {
        InvalidTimestampPolicy::Skip
    };
    let summary = summarize_day(events, policy)?;
    for skipped in &summary.skipped {
        tracing::warn!(
            index = skipped.index,
            clock_time = %skipped.clock_time,
            "skipping clock event with unreadable timestamp"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_session_without_login() {
        let db = Database::open_in_memory().unwrap();
        let err = require_session(&db).unwrap_err();
        assert_eq!(err.to_string(), "not logged in (run 'punch login')");
    }

    #[test]
    fn test_unauthorized_suggests_login() {
        let err = api_error(ApiError::Unauthorized, "failed to fetch");
        assert_eq!(
            err.to_string(),
            "failed to fetch: session expired (run 'punch login' again)"
        );
    }

    #[test]
    fn test_other_api_errors_keep_context() {
        let err = api_error(
            ApiError::Rejected {
                message: "Employee not found".to_string(),
            },
            "failed to fetch",
        );
        assert_eq!(err.to_string(), "failed to fetch");
        assert_eq!(
            err.root_cause().to_string(),
            "rejected by server: Employee not found"
        );
    }

    #[test]
    fn test_load_day_offline_without_cache() {
        let mut db = Database::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let err = load_day(&mut db, &Config::default(), date, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no cached punches for 2025-01-15 (run 'punch today' online first)"
        );
    }

    #[test]
    fn test_load_day_online_requires_session() {
        let mut db = Database::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let err = load_day(&mut db, &Config::default(), date, false).unwrap_err();
        assert_eq!(err.to_string(), "not logged in (run 'punch login')");
    }

    #[test]
    fn test_summarize_strict_rejects_bad_timestamp() {
        use pc_core::{ClockEvent, PunchKind};

        let events = [
            ClockEvent::new(PunchKind::In, "2025-01-15T04:00:00"),
            ClockEvent::new(PunchKind::Out, "not a time"),
        ];
        assert!(summarize(&events, true).is_err());
        let summary = summarize(&events, false).unwrap();
        assert_eq!(summary.skipped.len(), 1);
    }

    #[test]
    fn test_open_database_creates_parent_dir() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("nested/dir/punch.db"),
            ..Config::default()
        };
        open_database(&config).unwrap();
        assert!(config.database_path.exists());
    }
}
