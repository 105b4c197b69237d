//! User repository for Mailroom.
//!
//! The repository borrows a single connection so callers can run it inside
//! a transaction (`&mut *tx`) or on a pooled connection.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::user::{normalize_email, NewUser, User};
use crate::error::is_unique_violation;
use crate::{MailroomError, Result};

const USER_COLUMNS: &str =
    "id, email, password, first_name, last_name, created_at, last_login_at";

/// Repository for user persistence.
pub struct UserRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepository<'c> {
    /// Create a new UserRepository over the given connection.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user.
    ///
    /// Fails with [`MailroomError::Conflict`] if the email is already taken.
    pub async fn create(&mut self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, password, first_name, last_name, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                MailroomError::Conflict("user already exists".to_string())
            } else {
                MailroomError::Database(e.to_string())
            }
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| MailroomError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Get a user by email. The address is normalized before lookup.
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    /// Check whether an email is already registered.
    pub async fn email_exists(&mut self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)",
        )
        .bind(normalize_email(email))
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(exists)
    }

    /// Record a successful login. Returns false if the user does not exist.
    pub async fn update_last_login(&mut self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count registered users.
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }
}
