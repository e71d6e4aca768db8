//! SQLite-backed durable storage.
//!
//! Provides:
//! - Key-value store for the persisted clock and user stats
//! - Local log of completed work phases

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{data_dir, KvStore};
use crate::completion::{CompletionRecord, StatsRecorder};
use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionLogEntry {
    pub id: String,
    pub phase: String,
    pub duration_seconds: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LogSummary {
    pub completed_work_phases: u64,
    pub focus_seconds: u64,
    pub today_work_phases: u64,
    pub today_focus_seconds: u64,
}

/// SQLite database for durable timer state and the local completion log.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/focusloop/focusloop.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusloop.db");
        Self::open_at(&path)
    }

    /// Open (creating if needed) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS completions (
                id               TEXT PRIMARY KEY,
                phase            TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                completed_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_completions_completed_at ON completions(completed_at);",
        )?;
        Ok(())
    }

    /// Append a completed phase to the local log.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn log_completion(&self, record: &CompletionRecord) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO completions (id, phase, duration_seconds, completed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id,
                    record.mode.as_str(),
                    record.duration_seconds,
                    record.completed_at.to_rfc3339(),
                ],
            )
            .map_err(StorageError::from)?;
        Ok(id)
    }

    /// Totals over the whole log plus the UTC day containing `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> Result<LogSummary> {
        let (count, seconds) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration_seconds), 0)
                 FROM completions WHERE phase = 'work'",
                [],
                |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
            )
            .map_err(StorageError::from)?;

        let today = now.format("%Y-%m-%d").to_string();
        let (today_count, today_seconds) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration_seconds), 0)
                 FROM completions WHERE phase = 'work' AND completed_at >= ?1",
                params![format!("{today}T00:00:00+00:00")],
                |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
            )
            .map_err(StorageError::from)?;

        Ok(LogSummary {
            completed_work_phases: count,
            focus_seconds: seconds,
            today_work_phases: today_count,
            today_focus_seconds: today_seconds,
        })
    }

    /// Most recent log entries, newest first.
    pub fn recent_completions(&self, limit: usize) -> Result<Vec<CompletionLogEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, phase, duration_seconds, completed_at
                 FROM completions ORDER BY completed_at DESC LIMIT ?1",
            )
            .map_err(StorageError::from)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(StorageError::from)?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, phase, duration_seconds, completed_at) = row.map_err(StorageError::from)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StorageError::Corrupt {
                    key: format!("completions/{id}"),
                    message: e.to_string(),
                })?;
            entries.push(CompletionLogEntry {
                id,
                phase,
                duration_seconds,
                completed_at,
            });
        }
        Ok(entries)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store. Missing keys are not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.kv_set(key, value)?)
    }

    fn delete(&self, key: &str) -> Result<()> {
        Ok(self.kv_delete(key)?)
    }
}

impl StatsRecorder for Database {
    fn record_completion(&self, record: &CompletionRecord) -> Result<()> {
        self.log_completion(record).map(|_| ())
    }
}
