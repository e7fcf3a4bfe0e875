//! SQLite-backed key-value preference store.
//!
//! RULE: Only prefs.rs talks to the database.
//! Callers get and set whole string values under well-known keys.

use crate::error::SaveResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A flat string key-value store.
pub trait PrefStore {
    fn get_string(&self, key: &str) -> SaveResult<Option<String>>;
    fn set_string(&mut self, key: &str, value: &str) -> SaveResult<()>;
    fn delete_key(&mut self, key: &str) -> SaveResult<()>;
    /// Make previous writes durable.
    fn flush(&mut self) -> SaveResult<()>;
}

pub struct SqlitePrefs {
    conn: Connection,
}

impl SqlitePrefs {
    /// Open (or create) the preference database at `path`.
    pub fn open(path: &Path) -> SaveResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        // WAL only matters for real files; keep the default journal if refused.
        if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
            log::warn!("[prefs] WAL journal unavailable for {}: {e}", path.display());
        }
        let prefs = Self { conn };
        prefs.migrate()?;
        Ok(prefs)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SaveResult<Self> {
        let prefs = Self { conn: Connection::open_in_memory()? };
        prefs.migrate()?;
        Ok(prefs)
    }

    fn migrate(&self) -> SaveResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prefs (
                 key        TEXT PRIMARY KEY,
                 value      TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );",
        )?;
        Ok(())
    }

    /// Number of stored keys (for tests).
    pub fn key_count(&self) -> SaveResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM prefs", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl PrefStore for SqlitePrefs {
    fn get_string(&self, key: &str) -> SaveResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM prefs WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_string(&mut self, key: &str, value: &str) -> SaveResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO prefs (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn delete_key(&mut self, key: &str) -> SaveResult<()> {
        self.conn
            .execute("DELETE FROM prefs WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn flush(&mut self) -> SaveResult<()> {
        // Autocommit already made each write durable; checkpoint the WAL so
        // the main file is complete on its own.
        if let Err(e) = self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);") {
            log::warn!("[prefs] WAL checkpoint failed: {e}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_overwrite_delete() {
        let mut prefs = SqlitePrefs::in_memory().unwrap();
        assert_eq!(prefs.get_string("k").unwrap(), None);

        prefs.set_string("k", "one").unwrap();
        prefs.set_string("k", "two").unwrap();
        assert_eq!(prefs.get_string("k").unwrap().as_deref(), Some("two"));
        assert_eq!(prefs.key_count().unwrap(), 1);

        prefs.delete_key("k").unwrap();
        assert_eq!(prefs.get_string("k").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.sqlite3");
        {
            let mut prefs = SqlitePrefs::open(&path).unwrap();
            prefs.set_string("volume", "0.8").unwrap();
            prefs.flush().unwrap();
        }
        let prefs = SqlitePrefs::open(&path).unwrap();
        assert_eq!(prefs.get_string("volume").unwrap().as_deref(), Some("0.8"));
    }

    #[test]
    fn flush_without_wal_still_succeeds() {
        let mut prefs = SqlitePrefs::in_memory().unwrap();
        prefs.set_string("k", "v").unwrap();
        prefs.flush().unwrap();
        assert_eq!(prefs.get_string("k").unwrap().as_deref(), Some("v"));
    }
}
