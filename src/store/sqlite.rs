use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{EddyError, Result};
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| EddyError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            EddyError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }
}

impl Store for SqliteStore {
    fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_value(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_value() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_value("greeting", "hello").unwrap();
        assert_eq!(store.get_value("greeting").unwrap(), Some("hello".into()));
    }

    #[test]
    fn test_get_missing_value() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_value("nothing").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_value("k", "one").unwrap();
        store.set_value("k", "two").unwrap();
        assert_eq!(store.get_value("k").unwrap(), Some("two".into()));
    }

    #[test]
    fn test_delete_value() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_value("k", "v").unwrap();
        store.delete_value("k").unwrap();
        assert!(store.get_value("k").unwrap().is_none());

        // Deleting again is fine
        store.delete_value("k").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eddy.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.set_value("k", "persisted").unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.get_value("k").unwrap(), Some("persisted".into()));
    }
}
