//! Response DTOs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::auth::IssuedToken;
use crate::db::User;
use crate::mail::{Attachment, MessageView};

fn rfc3339(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Register and login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Access token (JWT).
    pub token: String,
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<IssuedToken> for AuthResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            user_id: issued.user.id,
            email: issued.user.email,
            first_name: issued.user.first_name,
            last_name: issued.user.last_name,
        }
    }
}

/// Public part of a user record.
#[derive(Debug, Serialize)]
pub struct UserLookupResponse {
    pub id: i64,
    pub email: String,
}

impl From<User> for UserLookupResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Attachment metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: i64,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_at: String,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id,
            uploaded_at: rfc3339(&attachment.uploaded_at),
            file_name: attachment.file_name,
            content_type: attachment.content_type,
            file_size: attachment.file_size,
        }
    }
}

/// A message as seen by a client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub subject: String,
    pub body: String,
    /// Sender's email.
    pub sender: String,
    /// Recipient user's email, else the stored recipient email, else empty.
    pub recipient: String,
    pub recipient_email: Option<String>,
    pub recipient_id: Option<i64>,
    pub timestamp: String,
    pub is_read: bool,
    pub is_draft: bool,
    pub is_high_priority: bool,
    pub attachments: Vec<AttachmentResponse>,
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        let recipient = view.recipient_display().to_string();
        let MessageView {
            message,
            sender_email,
            attachments,
            ..
        } = view;

        Self {
            id: message.id,
            subject: message.subject,
            body: message.body,
            sender: sender_email,
            recipient,
            recipient_email: message.recipient_email,
            recipient_id: message.recipient_id,
            timestamp: rfc3339(&message.sent_at),
            is_read: message.is_read,
            is_draft: message.is_draft,
            is_high_priority: message.is_high_priority,
            attachments: attachments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message_count: i64,
}
