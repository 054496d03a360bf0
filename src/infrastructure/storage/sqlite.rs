use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use crate::application::errors::StorageError;
use crate::domain::traits::Store;

/// SQLite-backed store, one row per key
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T, StorageError> {
        let conn = self.conn.lock()
            .map_err(|_| StorageError::Backend("Lock poisoned".to_string()))?;
        Ok(f(&conn)?)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
                .optional()
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
                [key, value],
            )
            .map(|_| ())
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.execute("DELETE FROM kv WHERE key = ?1", [key]).map(|_| ()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM kv WHERE key = ?1", [key], |row| row.get::<_, i64>(0))
                .map(|count| count > 0)
        })
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let mut keys = Vec::new();
            for key in rows {
                keys.push(key?);
            }
            Ok(keys)
        })
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.execute("DELETE FROM kv", []).map(|_| ()))
    }
}
