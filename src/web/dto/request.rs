//! Request DTOs.

use serde::Deserialize;

use crate::auth::RegistrationRequest;
use crate::mail::{ComposeMessage, MessageUpdate};

/// Registration request.
///
/// Missing fields deserialize as empty so that the workflow reports which one
/// is required.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<RegisterRequest> for RegistrationRequest {
    fn from(req: RegisterRequest) -> Self {
        RegistrationRequest::new(req.email, req.password, req.first_name, req.last_name)
    }
}

/// Login request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query for `GET /api/auth/user-by-email`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserByEmailQuery {
    pub email: String,
}

/// Body for send, draft and update.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageRequest {
    /// Message ID; on update it must match the path when present.
    pub id: Option<i64>,
    pub subject: String,
    pub body: String,
    pub recipient_email: Option<String>,
    pub recipient_id: Option<i64>,
    /// Accepted for compatibility. The sender is always the authenticated user.
    pub sender_id: Option<i64>,
    pub is_draft: bool,
    pub is_high_priority: bool,
}

impl MessageRequest {
    /// Compose input for a message written by `sender_id`.
    pub fn to_compose(&self, sender_id: i64) -> ComposeMessage {
        ComposeMessage {
            subject: self.subject.clone(),
            body: self.body.clone(),
            sender_id,
            recipient_id: self.recipient_id,
            recipient_email: self.recipient_email.clone(),
            is_high_priority: self.is_high_priority,
        }
    }

    /// Update input.
    pub fn to_update(&self) -> MessageUpdate {
        MessageUpdate {
            subject: self.subject.clone(),
            body: self.body.clone(),
            recipient_id: self.recipient_id,
            recipient_email: self.recipient_email.clone(),
            is_draft: self.is_draft,
        }
    }
}
