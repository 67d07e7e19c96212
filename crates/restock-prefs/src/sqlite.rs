use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::{KeyValueStore, Result};

/// Preference store backed by SQLite.
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - Atomic single-row upserts for free
/// - Battle-tested and reliable
/// - Doesn't require a separate process
pub struct SqlitePrefs {
    conn: Mutex<Connection>,
}

impl SqlitePrefs {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Ephemeral database, mostly useful in tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS prefs (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqlitePrefs {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock().expect("prefs lock poisoned");

        let result = conn
            .query_row("SELECT value FROM prefs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional();

        match result {
            Ok(value) => value,
            Err(err) => {
                // Unreadable storage reads as "not set"; callers fall back
                // to defaults without surfacing anything.
                debug!("pref read for {} failed: {}", key, err);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("prefs lock poisoned");
        conn.execute(
            "INSERT INTO prefs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let prefs = SqlitePrefs::in_memory().unwrap();
        prefs.set("sections", r#"{"rare":false}"#).unwrap();
        assert_eq!(prefs.get("sections").as_deref(), Some(r#"{"rare":false}"#));
    }

    #[test]
    fn test_upsert_overwrites() {
        let prefs = SqlitePrefs::in_memory().unwrap();
        prefs.set("rare_days", "180").unwrap();
        prefs.set("rare_days", "365").unwrap();
        assert_eq!(prefs.get("rare_days").as_deref(), Some("365"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let prefs = SqlitePrefs::in_memory().unwrap();
        assert!(prefs.get("absent").is_none());
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.db");

        {
            let prefs = SqlitePrefs::new(&path).unwrap();
            prefs.set("rare_days", "90").unwrap();
        }

        let reopened = SqlitePrefs::new(&path).unwrap();
        assert_eq!(reopened.get("rare_days").as_deref(), Some("90"));
    }
}
