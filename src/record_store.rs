use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::session::Mode;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("record storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed timestamp for {key}: {value}")]
    Timestamp { key: String, value: String },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// Named slot a best record lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum RecordKey {
    /// Best speedrun time in seconds, lower is better
    #[strum(serialize = "hundredGesturesTime")]
    HundredGesturesTime,
    /// Best countdown score, higher is better
    #[strum(serialize = "oneMinuteScore")]
    OneMinuteScore,
}

impl RecordKey {
    pub fn for_mode(mode: Mode) -> Option<Self> {
        match mode {
            Mode::Speedrun => Some(RecordKey::HundredGesturesTime),
            Mode::Countdown => Some(RecordKey::OneMinuteScore),
            Mode::ChessClock => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::HundredGesturesTime => "hundredGesturesTime",
            RecordKey::OneMinuteScore => "oneMinuteScore",
        }
    }
}

/// Durable best-record storage. A missing key reads as 0.
pub trait RecordStore {
    fn get(&self, key: RecordKey) -> Result<f64>;
    fn set(&mut self, key: RecordKey, value: f64) -> Result<()>;

    /// When the key was last written, if known
    fn last_updated(&self, _key: RecordKey) -> Result<Option<DateTime<Local>>> {
        Ok(None)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn get(&self, key: RecordKey) -> Result<f64> {
        (**self).get(key)
    }

    fn set(&mut self, key: RecordKey, value: f64) -> Result<()> {
        (**self).set(key, value)
    }

    fn last_updated(&self, key: RecordKey) -> Result<Option<DateTime<Local>>> {
        (**self).last_updated(key)
    }
}

/// SQLite-backed record store
#[derive(Debug)]
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened record store");
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value REAL NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }

    /// Forget every stored record
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM records", [])?;
        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, key: RecordKey) -> Result<f64> {
        let value: Option<f64> = self
            .conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value.unwrap_or(0.0))
    }

    fn set(&mut self, key: RecordKey, value: f64) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key.as_str(), value, Local::now().to_rfc3339()],
        )?;
        debug!(key = key.as_str(), value, "stored record");
        Ok(())
    }

    fn last_updated(&self, key: RecordKey) -> Result<Option<DateTime<Local>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM records WHERE key = ?1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|ts| ts.with_timezone(&Local))
                .map_err(|_| RecordError::Timestamp {
                    key: key.to_string(),
                    value,
                })
        })
        .transpose()
    }
}

/// In-process store, optionally rigged to fail reads or writes
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    values: HashMap<RecordKey, (f64, DateTime<Local>)>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    writes: Vec<(RecordKey, f64)>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, key: RecordKey, value: f64) -> Self {
        self.values.insert(key, (value, Local::now()));
        self
    }

    /// Every successful `set`, in call order
    pub fn writes(&self) -> &[(RecordKey, f64)] {
        &self.writes
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, key: RecordKey) -> Result<f64> {
        if self.fail_reads {
            return Err(RecordError::Unavailable(format!("read of {key}")));
        }
        Ok(self.values.get(&key).map_or(0.0, |(v, _)| *v))
    }

    fn set(&mut self, key: RecordKey, value: f64) -> Result<()> {
        if self.fail_writes {
            return Err(RecordError::Unavailable(format!("write of {key}")));
        }
        self.values.insert(key, (value, Local::now()));
        self.writes.push((key, value));
        Ok(())
    }

    fn last_updated(&self, key: RecordKey) -> Result<Option<DateTime<Local>>> {
        Ok(self.values.get(&key).map(|(_, ts)| *ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_names() {
        assert_eq!(RecordKey::HundredGesturesTime.as_str(), "hundredGesturesTime");
        assert_eq!(RecordKey::OneMinuteScore.to_string(), "oneMinuteScore");
        assert_eq!(
            RecordKey::for_mode(Mode::Speedrun),
            Some(RecordKey::HundredGesturesTime)
        );
        assert_eq!(RecordKey::for_mode(Mode::ChessClock), None);
    }

    #[test]
    fn test_sqlite_missing_key_reads_zero() {
        let store = SqliteRecordStore::in_memory().unwrap();
        assert_eq!(store.get(RecordKey::OneMinuteScore).unwrap(), 0.0);
        assert!(store
            .last_updated(RecordKey::OneMinuteScore)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_sqlite_set_overwrites() {
        let mut store = SqliteRecordStore::in_memory().unwrap();
        store.set(RecordKey::HundredGesturesTime, 14.2).unwrap();
        store.set(RecordKey::HundredGesturesTime, 12.345).unwrap();

        assert_eq!(store.get(RecordKey::HundredGesturesTime).unwrap(), 12.345);
        assert!(store
            .last_updated(RecordKey::HundredGesturesTime)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");

        {
            let mut store = SqliteRecordStore::open(&path).unwrap();
            store.set(RecordKey::OneMinuteScore, 31.0).unwrap();
        }

        let store = SqliteRecordStore::open(&path).unwrap();
        assert_eq!(store.get(RecordKey::OneMinuteScore).unwrap(), 31.0);
    }

    #[test]
    fn test_sqlite_clear() {
        let mut store = SqliteRecordStore::in_memory().unwrap();
        store.set(RecordKey::OneMinuteScore, 8.0).unwrap();
        store.clear().unwrap();
        assert_eq!(store.get(RecordKey::OneMinuteScore).unwrap(), 0.0);
    }

    #[test]
    fn test_memory_store_failures() {
        let mut store = MemoryRecordStore::new().with_record(RecordKey::OneMinuteScore, 4.0);
        store.fail_reads = true;
        assert!(store.get(RecordKey::OneMinuteScore).is_err());

        store.fail_reads = false;
        store.fail_writes = true;
        assert!(store.set(RecordKey::OneMinuteScore, 9.0).is_err());
        assert_eq!(store.get(RecordKey::OneMinuteScore).unwrap(), 4.0);
        assert!(store.writes().is_empty());
    }
}
