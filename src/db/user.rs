//! User model for Mailroom.

use chrono::{DateTime, Utc};

/// Normalize an email address for lookup and storage.
///
/// Surrounding whitespace is trimmed and the address is lowercased.
///
/// # Examples
///
/// ```
/// use mailroom::db::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registered user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Normalized email address.
    pub email: String,
    /// Password hash (PHC string).
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Data for inserting a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address; normalized by [`NewUser::new`].
    pub email: String,
    /// Password hash (already hashed).
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
}

impl NewUser {
    /// Create a new user record.
    ///
    /// The email is normalized and the names are trimmed.
    pub fn new(
        email: impl AsRef<str>,
        password_hash: impl Into<String>,
        first_name: impl AsRef<str>,
        last_name: impl AsRef<str>,
    ) -> Self {
        Self {
            email: normalize_email(email.as_ref()),
            password: password_hash.into(),
            first_name: first_name.as_ref().trim().to_string(),
            last_name: last_name.as_ref().trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
        assert_eq!(normalize_email("\tBOB@Example.com\n"), "bob@example.com");
        assert_eq!(normalize_email("   "), "");
    }

    #[test]
    fn test_new_user_normalizes() {
        let user = NewUser::new(" Carol@Mail.Test ", "hash", " Carol ", "King ");
        assert_eq!(user.email, "carol@mail.test");
        assert_eq!(user.password, "hash");
        assert_eq!(user.first_name, "Carol");
        assert_eq!(user.last_name, "King");
    }
}
