//! User Storage
//! Mission: Own user records; email uniqueness enforced by the database

use crate::auth::models::{PublicUser, User};
use crate::db::{Database, StoreError};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

/// Credential store over the shared SQLite database
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get user by email (exact match)
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.db.conn();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 LIMIT 1"),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.db.conn();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Insert a new user. The hash must already be computed.
    ///
    /// A concurrent insert of the same email loses on the unique constraint
    /// and gets `DuplicateEmail`; nothing is overwritten.
    pub fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO users (name, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, email, password_hash, created_at],
        )
        .map_err(StoreError::from_sqlite)?;

        let user = User {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        };

        info!("Created user {} ({})", user.email, user.id);
        Ok(user)
    }

    /// Rename a user; `None` if the id is unknown
    pub fn update_name(&self, id: i64, name: &str) -> Result<Option<PublicUser>, StoreError> {
        let conn = self.db.conn();
        let rows = conn.execute(
            "UPDATE users SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        if rows == 0 {
            return Ok(None);
        }

        let user = conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(PublicUser {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}
