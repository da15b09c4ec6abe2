//! SQLite-based session history and preference storage.
//!
//! Provides persistent storage for:
//! - Finished sessions (completed or reset)
//! - Session statistics (daily and all-time)
//! - Key-value store backing [`PreferenceStore`]

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use super::preferences::PreferenceStore;
use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub exercise_id: String,
    pub cycles: u64,
    pub elapsed_secs: u64,
    /// Reached its configured duration (as opposed to being reset).
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_cycles: u64,
    pub total_secs: u64,
}

/// SQLite database for session history and preferences.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/breathwork.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("breathwork.db"))
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise_id  TEXT NOT NULL,
                cycles       INTEGER NOT NULL DEFAULT 0,
                elapsed_secs INTEGER NOT NULL,
                completed    INTEGER NOT NULL DEFAULT 0,
                started_at   TEXT NOT NULL,
                ended_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);",
        )?;
        Ok(())
    }

    /// Record a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        exercise_id: &str,
        cycles: u64,
        elapsed_secs: u64,
        completed: bool,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO sessions
                 (exercise_id, cycles, elapsed_secs, completed, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                exercise_id,
                cycles,
                elapsed_secs,
                completed,
                started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored timestamp is corrupt.
    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exercise_id, cycles, elapsed_secs, completed, started_at, ended_at
             FROM sessions
             ORDER BY ended_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, exercise_id, cycles, elapsed_secs, completed, started, ended) = row?;
            records.push(SessionRecord {
                id,
                exercise_id,
                cycles,
                elapsed_secs,
                completed,
                started_at: parse_ts(&started)?,
                ended_at: parse_ts(&ended)?,
            });
        }
        Ok(records)
    }

    pub fn stats_all(&self) -> Result<Stats, StorageError> {
        self.stats_since(None)
    }

    pub fn stats_today(&self) -> Result<Stats, StorageError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.stats_since(Some(format!("{today}T00:00:00+00:00")))
    }

    fn stats_since(&self, since: Option<String>) -> Result<Stats, StorageError> {
        let since = since.unwrap_or_default();
        let stats = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(completed), 0),
                    COALESCE(SUM(cycles), 0),
                    COALESCE(SUM(elapsed_secs), 0)
             FROM sessions
             WHERE ended_at >= ?1",
            params![since],
            |row| {
                Ok(Stats {
                    total_sessions: row.get(0)?,
                    completed_sessions: row.get(1)?,
                    total_cycles: row.get(2)?,
                    total_secs: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
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
}

impl PreferenceStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.kv_get(key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        Ok(self.kv_set(key, value)?)
    }
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::QueryFailed(format!("bad timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session("box", 4, 64, true, now - Duration::seconds(64), now)
            .unwrap();
        db.record_session("calm", 1, 12, false, now - Duration::seconds(12), now)
            .unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(
            stats,
            Stats {
                total_sessions: 2,
                completed_sessions: 1,
                total_cycles: 5,
                total_secs: 76,
            }
        );
        assert_eq!(db.stats_today().unwrap().total_sessions, 2);

        let recent = db.recent_sessions(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].exercise_id, "calm");
        assert!(!recent[0].completed);
    }

    #[test]
    fn empty_database_has_zero_stats() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.stats_all().unwrap(), Stats::default());
    }

    #[test]
    fn kv_backs_preference_store() {
        let mut db = Database::open_memory().unwrap();
        assert_eq!(PreferenceStore::get(&db, "sound_enabled").unwrap(), None);
        PreferenceStore::set(&mut db, "sound_enabled", "false").unwrap();
        PreferenceStore::set(&mut db, "sound_enabled", "true").unwrap();
        assert_eq!(
            PreferenceStore::get(&db, "sound_enabled").unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("exercise_id", "calm").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("exercise_id").unwrap().as_deref(), Some("calm"));
    }
}
