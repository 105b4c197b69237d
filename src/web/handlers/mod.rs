//! Request handlers for the REST API.

pub mod auth;
pub mod health;
pub mod mail;

pub use auth::*;
pub use health::*;
pub use mail::*;

use std::sync::Arc;

use crate::auth::{AuthService, TokenIssuer};
use crate::db::Database;
use crate::file::AttachmentStorage;
use crate::mail::MessageService;

/// State shared by all handlers.
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: Arc<TokenIssuer>,
    pub storage: AttachmentStorage,
    /// Largest accepted attachment, in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        tokens: Arc<TokenIssuer>,
        storage: AttachmentStorage,
        max_upload_size: u64,
    ) -> Self {
        Self {
            db,
            tokens,
            storage,
            max_upload_size,
        }
    }

    pub fn auth_service(&self) -> AuthService<'_> {
        AuthService::new(&self.db, &self.tokens)
    }

    pub fn message_service(&self) -> MessageService<'_> {
        MessageService::new(&self.db, &self.storage)
    }
}
