// 💾 Preferences - Persisted key-value state
//
// The only persisted entry today is the chosen locale (key "lang").
// SQLite file in WAL mode for the binaries, a map for tests.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preferences database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("preferences store is read-only")]
    ReadOnly,
}

/// Key-value storage for user preferences
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqlitePreferences {
    conn: Mutex<Connection>,
}

impl SqlitePreferences {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PrefsError> {
        let conn = Connection::open(path)?;
        // Enable WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, PrefsError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PrefsError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(SqlitePreferences { conn: Mutex::new(conn) })
    }
}

impl PreferenceStore for SqlitePreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        let conn = lock(&self.conn);
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let conn = lock(&self.conn);
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

#[derive(Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
    read_only: bool,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail
    pub fn read_only() -> Self {
        MemoryPreferences {
            values: Mutex::new(HashMap::new()),
            read_only: true,
        }
    }

    pub fn with(key: &str, value: &str) -> Self {
        let prefs = Self::new();
        lock(&prefs.values).insert(key.to_string(), value.to_string());
        prefs
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        if self.read_only {
            return Err(PrefsError::ReadOnly);
        }
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_roundtrip_and_overwrite() {
        let prefs = SqlitePreferences::in_memory().unwrap();
        assert_eq!(prefs.get("lang").unwrap(), None);

        prefs.set("lang", "ca").unwrap();
        assert_eq!(prefs.get("lang").unwrap().as_deref(), Some("ca"));

        prefs.set("lang", "es").unwrap();
        assert_eq!(prefs.get("lang").unwrap().as_deref(), Some("es"));
    }

    #[test]
    fn test_memory_read_only() {
        let prefs = MemoryPreferences::read_only();
        assert!(matches!(prefs.set("lang", "es"), Err(PrefsError::ReadOnly)));
        assert_eq!(prefs.get("lang").unwrap(), None);
    }
}
