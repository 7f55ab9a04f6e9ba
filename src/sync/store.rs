mod key;

pub use key::{canonical_handles, normalize_handle, CacheKey, ContestScope, StandingsKey};

use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, types::Value, Connection, OptionalExtension};
use std::{
    error::Error as StdError,
    fmt,
    path::Path,
    sync::{Arc, Mutex},
};

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Timestamp(chrono::ParseError),
    KeyRange(u64),
    Poisoned,
}
impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Cache database error: {}", e),
            Self::Timestamp(e) => write!(f, "Bad last_fetched timestamp: {}", e),
            Self::KeyRange(id) => write!(f, "Contest id {} is out of range for the cache", id),
            Self::Poisoned => write!(f, "Cache connection poisoned"),
        }
    }
}
impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Database(e) => Some(e),
            Self::Timestamp(e) => Some(e),
            Self::KeyRange(_) | Self::Poisoned => None,
        }
    }
}
impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRow {
    pub payload: String,
    pub last_fetched: DateTime<Utc>,
}

/// Keyed payload storage, one table per data domain.
pub trait CacheStore: Send + Sync {
    fn read(&self, key: &CacheKey) -> Result<Option<CacheRow>, StoreError>;
    /// Replaces the whole row for `key`.
    fn write(&self, key: &CacheKey, payload: &str, fetched_at: DateTime<Utc>) -> Result<(), StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contest_list_cache (
    scope TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    last_fetched TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS user_rating_cache (
    handle TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    last_fetched TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS contest_rating_cache (
    contest_id INTEGER PRIMARY KEY,
    payload TEXT NOT NULL,
    last_fetched TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS standings_cache (
    contest_id INTEGER NOT NULL,
    handles_hash TEXT NOT NULL,
    payload TEXT NOT NULL,
    last_fetched TEXT NOT NULL,
    PRIMARY KEY (contest_id, handles_hash)
);
CREATE TABLE IF NOT EXISTS problem_cache (
    name TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    last_fetched TEXT NOT NULL
);
";

#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }
    fn init(db: Connection) -> Result<Self, StoreError> {
        db.execute_batch(SCHEMA)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

impl CacheStore for SqliteStore {
    fn read(&self, key: &CacheKey) -> Result<Option<CacheRow>, StoreError> {
        let table = key.table();
        let filter = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", c, i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let values = key.values()?;
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        let row = db
            .query_row(
                &format!(
                    "SELECT payload, last_fetched FROM {} WHERE {}",
                    table.name, filter
                ),
                params_from_iter(values),
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((payload, last_fetched)) => Ok(Some(CacheRow {
                payload,
                last_fetched: DateTime::parse_from_rfc3339(&last_fetched)
                    .map_err(StoreError::Timestamp)?
                    .with_timezone(&Utc),
            })),
        }
    }

    fn write(&self, key: &CacheKey, payload: &str, fetched_at: DateTime<Utc>) -> Result<(), StoreError> {
        let table = key.table();
        let mut values = key.values()?;
        values.push(Value::Text(payload.to_string()));
        values.push(Value::Text(fetched_at.to_rfc3339()));
        let placeholders = (1..=values.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        db.execute(
            &format!(
                "INSERT OR REPLACE INTO {} ({}, payload, last_fetched) VALUES ({})",
                table.name,
                table.columns.join(", "),
                placeholders
            ),
            params_from_iter(values),
        )?;
        Ok(())
    }
}
