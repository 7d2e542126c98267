// Key-value persistence backing the record store

use crate::error::{Result, StoreError};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Flat string key-value storage
///
/// Every namespace and counter is a single value under its own key. A write
/// may cover several keys, and must land all of them or none.
pub trait Backend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write all entries in one atomic step
    fn put_all(&self, entries: &[(&str, String)]) -> Result<()>;

    fn put(&self, key: &str, value: String) -> Result<()> {
        self.put_all(&[(key, value)])
    }
}

/// SQLite-backed storage: one `kv` row per key
pub struct SqliteBackend {
    db: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open or create the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Connection::open(path.as_ref())?;
        // Other processes may hold the file; wait for them rather than fail
        db.busy_timeout(BUSY_TIMEOUT)?;
        Self::from_connection(db)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(db: Connection) -> Result<Self> {
        debug!("Creating key-value schema");
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        Ok(Self { db: Mutex::new(db) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| StoreError::StorageUnavailable("database connection lock poisoned".to_string()))
    }
}

impl Backend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.lock()?;
        let value = db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn put_all(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut db = self.lock()?;
        let tx = db.transaction()?;

        for (key, value) in entries {
            debug!(key, bytes = value.len(), "put_all: writing key");
            tx.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_key() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert_eq!(backend.get("contacts").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.put("lastId", "1".to_string()).unwrap();
        backend.put("lastId", "2".to_string()).unwrap();
        assert_eq!(backend.get("lastId").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_put_all_writes_every_entry() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend
            .put_all(&[("tasks", "[]".to_string()), ("lastTaskId", "7".to_string())])
            .unwrap();

        assert_eq!(backend.get("tasks").unwrap().as_deref(), Some("[]"));
        assert_eq!(backend.get("lastTaskId").unwrap().as_deref(), Some("7"));
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("agenda.db");

        {
            let backend = SqliteBackend::open(&db_path).unwrap();
            backend.put("contacts", "[]".to_string()).unwrap();
        }

        let backend = SqliteBackend::open(&db_path).unwrap();
        assert_eq!(backend.get("contacts").unwrap().as_deref(), Some("[]"));
    }
}
