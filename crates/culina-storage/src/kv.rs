//! Durable string key-value persistence.
//!
//! `KeyValueStore` is the only persistence seam the engine sees. The SQLite
//! implementation is used by the binary; `MemoryStore` backs tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use culina_core::error::CulinaError;

use crate::db::Database;

/// Key under which the canonical inventory list is stored.
pub const INVENTORY_KEY: &str = "userInventory";

/// Key under which free-text dietary preferences are stored.
pub const PREFERENCES_KEY: &str = "userPreferences";

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CulinaError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), CulinaError>;
}

/// SQLite-backed store using the `kv` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CulinaError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| CulinaError::Storage(format!("Failed to read key {}: {}", key, e)))
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CulinaError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().timestamp()],
            )
            .map(|_| ())
            .map_err(|e| CulinaError::Storage(format!("Failed to write key {}: {}", key, e)))
        })
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CulinaError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| CulinaError::Storage(format!("store lock poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CulinaError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CulinaError::Storage(format!("store lock poisoned: {}", e)))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
