//! SQLite handle shared by the key-value store.

use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use culina_core::error::CulinaError;

use crate::migrations;

/// How long a write waits on another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn open_err(e: rusqlite::Error) -> CulinaError {
    CulinaError::Storage(format!("Failed to open database: {}", e))
}

/// One connection behind a mutex; rusqlite connections are not `Sync`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database file at `path`, creating it and its directory
    /// when missing. The file is switched to WAL so a second `culina`
    /// process can read while another writes.
    pub fn new(path: &Path) -> Result<Self, CulinaError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(open_err)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(open_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(open_err)?;

        let db = Self::migrated(conn)?;
        info!(path = %path.display(), "Database ready");
        Ok(db)
    }

    /// Throwaway database for tests.
    pub fn in_memory() -> Result<Self, CulinaError> {
        Self::migrated(Connection::open_in_memory().map_err(open_err)?)
    }

    fn migrated(conn: Connection) -> Result<Self, CulinaError> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// Statements are self-contained, so a panic in an earlier caller
    /// leaves the connection usable and a poisoned lock is taken over.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CulinaError>
    where
        F: FnOnce(&Connection) -> Result<T, CulinaError>,
    {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Database")
    }
}
