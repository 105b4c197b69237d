//! Registration and login workflow.

use std::sync::OnceLock;

use chrono::Utc;
use tracing::{info, warn};

use super::password::{hash_password, validate_password, verify_password, PasswordError};
use super::token::TokenIssuer;
use crate::db::{normalize_email, Database, NewUser, User, UserRepository};
use crate::{MailroomError, Result};

/// Message used for every login failure, whatever the cause.
const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Registration input.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegistrationRequest {
    /// Create a registration request.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Check required fields and password length.
    pub fn validate(&self) -> Result<()> {
        require(&self.email, "email is required")?;
        if self.password.is_empty() {
            return Err(MailroomError::Validation("password is required".to_string()));
        }
        require(&self.first_name, "first name is required")?;
        require(&self.last_name, "last name is required")?;
        validate_password(&self.password).map_err(|e| MailroomError::Validation(e.to_string()))
    }
}

/// A freshly issued token together with the user it was issued for.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub user: User,
}

/// Auth workflow over the credential store and token issuer.
pub struct AuthService<'a> {
    db: &'a Database,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database, tokens: &'a TokenIssuer) -> Self {
        Self { db, tokens }
    }

    /// Register a new user and issue a token.
    ///
    /// The email is normalized before lookup and storage. A duplicate
    /// address, in any letter case, is a [`MailroomError::Conflict`].
    pub async fn register(&self, req: &RegistrationRequest) -> Result<IssuedToken> {
        req.validate()?;
        let email = normalize_email(&req.email);

        {
            let mut conn = self.db.pool().acquire().await?;
            if UserRepository::new(&mut conn).email_exists(&email).await? {
                return Err(MailroomError::Conflict("user already exists".to_string()));
            }
        }

        let password_hash = hash_blocking(req.password.clone()).await?;

        // Single INSERT; the unique index catches a concurrent registration.
        let user = {
            let mut conn = self.db.pool().acquire().await?;
            UserRepository::new(&mut conn)
                .create(&NewUser::new(
                    &email,
                    password_hash,
                    &req.first_name,
                    &req.last_name,
                ))
                .await?
        };

        info!(user_id = user.id, "user registered");
        let token = self.tokens.issue(&user)?;
        Ok(IssuedToken { token, user })
    }

    /// Authenticate by email and password and issue a token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        if email.trim().is_empty() {
            return Err(MailroomError::Validation("email is required".to_string()));
        }
        if password.is_empty() {
            return Err(MailroomError::Validation("password is required".to_string()));
        }

        let found = {
            let mut conn = self.db.pool().acquire().await?;
            UserRepository::new(&mut conn).get_by_email(email).await?
        };
        let Some(mut user) = found else {
            verify_against_dummy(password.to_string()).await?;
            warn!("login failed: unknown email");
            return Err(invalid_credentials());
        };

        match verify_blocking(password.to_string(), user.password.clone()).await? {
            Ok(()) => {}
            Err(PasswordError::VerificationFailed) => {
                warn!(user_id = user.id, "login failed: wrong password");
                return Err(invalid_credentials());
            }
            Err(e) => {
                warn!(user_id = user.id, error = %e, "login failed: unusable stored hash");
                return Err(invalid_credentials());
            }
        }

        let now = Utc::now();
        {
            let mut conn = self.db.pool().acquire().await?;
            UserRepository::new(&mut conn)
                .update_last_login(user.id, now)
                .await?;
        }
        user.last_login_at = Some(now);

        info!(user_id = user.id, "user logged in");
        let token = self.tokens.issue(&user)?;
        Ok(IssuedToken { token, user })
    }

    /// Look up a user by email (case-insensitive).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.db.pool().acquire().await?;
        UserRepository::new(&mut conn).get_by_email(email).await
    }

    /// Look up a user by ID.
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let mut conn = self.db.pool().acquire().await?;
        UserRepository::new(&mut conn).get_by_id(id).await
    }
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MailroomError::Validation(message.to_string()));
    }
    Ok(())
}

fn invalid_credentials() -> MailroomError {
    MailroomError::Auth(INVALID_CREDENTIALS.to_string())
}

/// Map a hashing failure: length problems are the caller's, the rest are ours.
fn hash_failure(e: PasswordError) -> MailroomError {
    match e {
        PasswordError::TooShort | PasswordError::TooLong => MailroomError::Validation(e.to_string()),
        other => MailroomError::Internal(other.to_string()),
    }
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| MailroomError::Internal(format!("hashing task failed: {e}")))?
        .map_err(hash_failure)
}

async fn verify_blocking(
    password: String,
    hash: String,
) -> Result<std::result::Result<(), PasswordError>> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| MailroomError::Internal(format!("verification task failed: {e}")))
}

/// Hash checked when the email is unknown, so both login failures cost one verify.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password("mailroom-unknown-user").ok())
        .as_deref()
}

async fn verify_against_dummy(password: String) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        if let Some(hash) = dummy_hash() {
            let _ = verify_password(&password, hash);
        }
    })
    .await
    .map_err(|e| MailroomError::Internal(format!("verification task failed: {e}")))
}
