//! SQLite Database Handle
//! Mission: One shared connection for users, listings, posts and messages

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failures surfaced by the SQLite-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint on `users.email` fired.
    #[error("email already registered")]
    DuplicateEmail,
    #[error("record not found")]
    NotFound,
    /// A referenced row (receiver, item, owner) does not exist.
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    /// Classify a constraint failure; anything else stays a database error.
    pub(crate) fn from_sqlite(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref code, ref message) = err {
            match code.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    if message.as_deref().is_some_and(|m| m.contains("users.email")) {
                        return StoreError::DuplicateEmail;
                    }
                    return StoreError::Constraint(
                        message.clone().unwrap_or_else(|| "unique".to_string()),
                    );
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                | rusqlite::ffi::SQLITE_CONSTRAINT_CHECK
                | rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return StoreError::Constraint(
                        message
                            .clone()
                            .unwrap_or_else(|| "referenced record does not exist".to_string()),
                    );
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Shared SQLite connection.
///
/// Cloning is cheap; all clones talk to the same connection. Callers lock it
/// for the duration of one statement (or one short transaction) and never
/// across an `.await`.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("enable foreign keys")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            price REAL NOT NULL,
            category TEXT,
            image_url TEXT,
            status TEXT NOT NULL DEFAULT 'Available',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lost_found (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            type TEXT NOT NULL CHECK (type IN ('Lost', 'Found')),
            title TEXT NOT NULL,
            description TEXT,
            location TEXT,
            date_lost_found TEXT,
            image_url TEXT,
            status TEXT NOT NULL DEFAULT 'Open',
            contact_info TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            receiver_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            item_id INTEGER REFERENCES items(id) ON DELETE SET NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_items_status ON items(status, created_at);
        CREATE INDEX IF NOT EXISTS idx_items_user ON items(user_id);
        CREATE INDEX IF NOT EXISTS idx_lost_found_status ON lost_found(status, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id, created_at);
        "#,
    )
    .context("initialize schema")?;

    debug!("Database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_schema_created_in_memory() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('users', 'items', 'lost_found', 'messages')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_reopen_file_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        Database::open(temp.path()).unwrap();
        // Second open must not fail on existing tables
        let db = Database::open(temp.path()).unwrap();
        let fk: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
