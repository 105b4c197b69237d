//! Authentication module for Mailroom.
//!
//! Password hashing, bearer token issuing, and the register/login workflow.

mod password;
mod service;
mod token;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use service::{AuthService, IssuedToken, RegistrationRequest};
pub use token::{Claims, TokenIssuer};
