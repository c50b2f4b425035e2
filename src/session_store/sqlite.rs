//! SQLite-backed storage medium
//!
//! Lets a session outlive a process restart for as long as the host keeps
//! the database file, the same way a tab keeps its storage across reloads.

use super::{MediumError, StorageMedium};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS session_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

/// Thread-safe SQLite medium handle
#[derive(Clone)]
pub struct SqliteMedium {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMedium {
    /// Open or create the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MediumError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self, MediumError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, MediumError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl StorageMedium for SqliteMedium {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::Poisoned)?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM session_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::Poisoned)?;
        conn.execute(
            "INSERT INTO session_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }
}
