//! Storage layer for punchcard.
//!
//! Persists the authenticated session and a per-day cache of fetched clock
//! events using `rusqlite`, so a day can be re-summarized without the network.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! - `auth_session`: at most one row (`id = 1`), replaced on every login.
//! - `fetches`: one row per attendance date that has been fetched.
//! - `clock_events`: the punches of each fetched date, keyed by their
//!   position in the service response.
//!
//! Attendance dates are stored as `YYYY-MM-DD`. `fetched_at` is ISO 8601 UTC.
//! Clock times are stored verbatim as received; parsing them is the
//! reconstructor's job.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use pc_api::{AuthSession, ClockDetails};
use pc_core::{PunchEvent, PunchKind};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored punch kind is neither IN nor OUT.
    #[error("invalid punch kind for {date} #{position}: {value}")]
    InvalidPunchKind {
        date: String,
        position: i64,
        value: String,
    },
    /// A stored date or timestamp could not be parsed.
    #[error("invalid stored time: {value}")]
    InvalidTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A cached punch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredClockEvent {
    pub position: i64,
    pub kind: PunchKind,
    pub clock_time: String,
    pub device_name: Option<String>,
    pub office_name: Option<String>,
    pub source_name: Option<String>,
}

impl PunchEvent for StoredClockEvent {
    fn kind(&self) -> PunchKind {
        self.kind
    }

    fn clock_time(&self) -> &str {
        &self.clock_time
    }
}

/// When a date was last fetched, and the shift it belonged to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    pub attendance_date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
    pub shift_name: Option<String>,
    pub policy_name: Option<String>,
    pub event_count: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS auth_session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                token TEXT NOT NULL,
                employee_code TEXT NOT NULL,
                employee_name TEXT NOT NULL,
                email TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fetches (
                attendance_date TEXT PRIMARY KEY,
                fetched_at TEXT NOT NULL,
                shift_name TEXT,
                policy_name TEXT
            );

            -- position: index of the punch in the service response
            -- in_out_type: 'IN' or 'OUT'
            CREATE TABLE IF NOT EXISTS clock_events (
                attendance_date TEXT NOT NULL,
                position INTEGER NOT NULL,
                in_out_type TEXT NOT NULL,
                clock_time TEXT NOT NULL,
                device_name TEXT,
                office_name TEXT,
                source_name TEXT,
                PRIMARY KEY (attendance_date, position),
                FOREIGN KEY (attendance_date) REFERENCES fetches(attendance_date) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Stores the session, replacing any previous one.
    pub fn save_session(&self, session: &AuthSession) -> Result<(), DbError> {
        let saved_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.conn.execute(
            "
            INSERT OR REPLACE INTO auth_session
                (id, token, employee_code, employee_name, email, saved_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ",
            params![
                session.token,
                session.employee_code,
                session.employee_name,
                session.email,
                saved_at,
            ],
        )?;
        tracing::debug!(employee = %session.employee_code, "session saved");
        Ok(())
    }

    /// Returns the stored session, if any.
    pub fn load_session(&self) -> Result<Option<AuthSession>, DbError> {
        let session = self
            .conn
            .query_row(
                "SELECT token, employee_code, employee_name, email FROM auth_session WHERE id = 1",
                [],
                |row| {
                    Ok(AuthSession {
                        token: row.get(0)?,
                        employee_code: row.get(1)?,
                        employee_name: row.get(2)?,
                        email: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Removes the session together with every cached day.
    pub fn clear_session(&mut self) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM clock_events", [])?;
        tx.execute("DELETE FROM fetches", [])?;
        tx.execute("DELETE FROM auth_session", [])?;
        tx.commit()?;
        tracing::debug!("session and cache cleared");
        Ok(())
    }

    /// Replaces the cached punches for `date` with a fresh fetch.
    ///
    /// Returns the number of punches stored.
    pub fn replace_day(
        &mut self,
        date: NaiveDate,
        details: &ClockDetails,
        fetched_at: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        let date_key = date.format(DATE_FORMAT).to_string();
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM clock_events WHERE attendance_date = ?1",
            params![date_key],
        )?;
        tx.execute(
            "
            INSERT OR REPLACE INTO fetches (attendance_date, fetched_at, shift_name, policy_name)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                date_key,
                fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                details.shift_name,
                details.policy_name,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO clock_events
                    (attendance_date, position, in_out_type, clock_time, device_name, office_name, source_name)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )?;
            for (position, event) in (0_i64..).zip(&details.clock_in_details) {
                stmt.execute(params![
                    date_key,
                    position,
                    event.in_out_type.as_str(),
                    event.clock_time,
                    event.device_name,
                    event.office_name,
                    event.source_name,
                ])?;
            }
        }
        tx.commit()?;
        let stored = details.clock_in_details.len();
        tracing::debug!(date = %date_key, stored, "cached clock events");
        Ok(stored)
    }

    /// Lists cached punches for `date` in their original response order.
    pub fn list_clock_events(&self, date: NaiveDate) -> Result<Vec<StoredClockEvent>, DbError> {
        let date_key = date.format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(
            "
            SELECT position, in_out_type, clock_time, device_name, office_name, source_name
            FROM clock_events
            WHERE attendance_date = ?1
            ORDER BY position
            ",
        )?;
        let rows = stmt.query_map(params![date_key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (position, kind, clock_time, device_name, office_name, source_name) = row?;
            let kind = kind
                .parse::<PunchKind>()
                .map_err(|_| DbError::InvalidPunchKind {
                    date: date_key.clone(),
                    position,
                    value: kind.clone(),
                })?;
            events.push(StoredClockEvent {
                position,
                kind,
                clock_time,
                device_name,
                office_name,
                source_name,
            });
        }
        Ok(events)
    }

    /// Returns fetch metadata for `date`, if it has been fetched.
    pub fn last_fetch(&self, date: NaiveDate) -> Result<Option<FetchRecord>, DbError> {
        let date_key = date.format(DATE_FORMAT).to_string();
        let fetches = self.query_fetches(
            "WHERE f.attendance_date = ?1",
            &[&date_key as &dyn rusqlite::ToSql],
        )?;
        Ok(fetches.into_iter().next())
    }

    /// Lists every cached day, most recent first.
    pub fn list_fetches(&self) -> Result<Vec<FetchRecord>, DbError> {
        self.query_fetches("", &[])
    }

    fn query_fetches(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<FetchRecord>, DbError> {
        let sql = format!(
            "
            SELECT f.attendance_date, f.fetched_at, f.shift_name, f.policy_name,
                   (SELECT COUNT(*) FROM clock_events e WHERE e.attendance_date = f.attendance_date)
            FROM fetches f
            {filter}
            ORDER BY f.attendance_date DESC
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut fetches = Vec::new();
        for row in rows {
            let (date, fetched_at, shift_name, policy_name, event_count) = row?;
            fetches.push(FetchRecord {
                attendance_date: parse_date(&date)?,
                fetched_at: parse_timestamp(&fetched_at)?,
                shift_name,
                policy_name,
                event_count,
            });
        }
        Ok(fetches)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::InvalidTime {
        value: value.to_string(),
        source,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DbError::InvalidTime {
            value: value.to_string(),
            source,
        })
}
