//! Mailroom - a basic webmail backend.
//!
//! Users register and log in to obtain a JWT, then send messages, keep
//! drafts, read their inbox and exchange attachments over a REST API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod mail;
pub mod web;

pub use auth::{AuthService, TokenIssuer};
pub use config::Config;
pub use db::{Database, User};
pub use error::{MailroomError, Result};
pub use file::AttachmentStorage;
pub use mail::MessageService;
