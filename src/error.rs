//! Error types for Mailroom.

use thiserror::Error;

/// Common error type for Mailroom.
#[derive(Error, Debug)]
pub enum MailroomError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant, except unique
    /// constraint violations which callers inspect before conversion.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The write would duplicate an existing record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Token signing error.
    #[error("token error: {0}")]
    Token(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected failure inside the service, such as a crashed worker task.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for MailroomError {
    fn from(e: sqlx::Error) -> Self {
        MailroomError::Database(e.to_string())
    }
}

/// Result type alias for Mailroom operations.
pub type Result<T> = std::result::Result<T, MailroomError>;

/// Returns true if the error is a unique constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = MailroomError::Auth("invalid credentials".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid credentials");
    }

    #[test]
    fn test_validation_error_display() {
        let err = MailroomError::Validation("email is required".to_string());
        assert_eq!(err.to_string(), "validation error: email is required");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = MailroomError::Conflict("user already exists".to_string());
        assert_eq!(err.to_string(), "conflict: user already exists");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = MailroomError::NotFound("recipient".to_string());
        assert_eq!(err.to_string(), "recipient not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MailroomError = io_err.into();
        assert!(matches!(err, MailroomError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_internal_error_display() {
        let err = MailroomError::Internal("hashing task failed".to_string());
        assert_eq!(err.to_string(), "internal error: hashing task failed");
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: MailroomError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, MailroomError::Database(_)));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(MailroomError::Auth("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
