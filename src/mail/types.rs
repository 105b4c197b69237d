//! Message and attachment types.

use chrono::{DateTime, Utc};

use crate::db::normalize_email;

/// A stored message row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    /// Message ID.
    pub id: i64,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Sender user ID.
    pub sender_id: i64,
    /// Resolved recipient user ID.
    pub recipient_id: Option<i64>,
    /// Free-text recipient address, kept even when unresolved.
    pub recipient_email: Option<String>,
    /// Sent time, or last edit time for drafts.
    pub sent_at: DateTime<Utc>,
    /// Whether the recipient has read it. Never reset once set.
    pub is_read: bool,
    /// Whether this is an undelivered draft.
    pub is_draft: bool,
    /// High priority flag.
    pub is_high_priority: bool,
}

/// A message joined with the addresses needed to render it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageView {
    #[sqlx(flatten)]
    pub message: Message,
    /// Sender's email.
    pub sender_email: String,
    /// Email of the resolved recipient user, if any.
    pub recipient_user_email: Option<String>,
    /// Attachments ordered by upload time.
    #[sqlx(skip)]
    pub attachments: Vec<Attachment>,
}

impl MessageView {
    /// Recipient address for display: the resolved user's email, then the
    /// free-text address, then empty.
    pub fn recipient_display(&self) -> &str {
        self.recipient_user_email
            .as_deref()
            .or(self.message.recipient_email.as_deref())
            .unwrap_or("")
    }

    /// Whether `user_id` sent this message.
    pub fn is_sender(&self, user_id: i64) -> bool {
        self.message.sender_id == user_id
    }

    /// Whether this message is addressed to the given user, by id or email.
    pub fn is_addressed_to(&self, user_id: i64, email: &str) -> bool {
        if self.message.recipient_id == Some(user_id) {
            return true;
        }
        match self.message.recipient_email.as_deref() {
            Some(addr) => !addr.is_empty() && addr == normalize_email(email),
            None => false,
        }
    }

    /// Sender or recipient may read. Drafts are visible to their sender only.
    pub fn is_readable_by(&self, user_id: i64, email: &str) -> bool {
        self.is_sender(user_id) || (!self.message.is_draft && self.is_addressed_to(user_id, email))
    }
}

/// Message as composed by a sender, before recipient resolution.
#[derive(Debug, Clone)]
pub struct ComposeMessage {
    pub subject: String,
    pub body: String,
    pub sender_id: i64,
    pub recipient_id: Option<i64>,
    pub recipient_email: Option<String>,
    pub is_high_priority: bool,
}

impl ComposeMessage {
    /// Compose a message addressed by email.
    pub fn new(
        sender_id: i64,
        recipient_email: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sender_id,
            recipient_id: None,
            recipient_email: Some(recipient_email.into()),
            is_high_priority: false,
        }
    }

    /// Address the message to a known user ID.
    pub fn with_recipient_id(mut self, recipient_id: i64) -> Self {
        self.recipient_id = Some(recipient_id);
        self
    }
}

/// Fully resolved message ready for insertion.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub subject: String,
    pub body: String,
    pub sender_id: i64,
    pub recipient_id: Option<i64>,
    pub recipient_email: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub is_draft: bool,
    pub is_high_priority: bool,
}

/// Fields overwritten by an update.
#[derive(Debug, Clone)]
pub struct MessageUpdate {
    pub subject: String,
    pub body: String,
    pub recipient_id: Option<i64>,
    pub recipient_email: Option<String>,
    pub is_draft: bool,
}

/// Attachment metadata.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Attachment {
    /// Attachment ID.
    pub id: i64,
    /// Owning message.
    pub message_id: i64,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Name of the stored file.
    pub storage_name: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment metadata for insertion.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub message_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_name: String,
}

/// Attachment content loaded for download.
#[derive(Debug, Clone)]
pub struct DownloadedAttachment {
    pub content: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(recipient_id: Option<i64>, recipient_email: Option<&str>, is_draft: bool) -> MessageView {
        MessageView {
            message: Message {
                id: 1,
                subject: "Hi".to_string(),
                body: "Body".to_string(),
                sender_id: 10,
                recipient_id,
                recipient_email: recipient_email.map(str::to_string),
                sent_at: Utc::now(),
                is_read: false,
                is_draft,
                is_high_priority: false,
            },
            sender_email: "sender@example.com".to_string(),
            recipient_user_email: recipient_id.map(|_| "user@example.com".to_string()),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_recipient_display_fallbacks() {
        assert_eq!(
            view(Some(20), Some("typed@example.com"), false).recipient_display(),
            "user@example.com"
        );
        assert_eq!(
            view(None, Some("typed@example.com"), false).recipient_display(),
            "typed@example.com"
        );
        assert_eq!(view(None, None, false).recipient_display(), "");
    }

    #[test]
    fn test_addressed_by_id_or_email() {
        let by_id = view(Some(20), None, false);
        assert!(by_id.is_addressed_to(20, "other@example.com"));
        assert!(!by_id.is_addressed_to(21, "other@example.com"));

        let by_email = view(None, Some("late@example.com"), false);
        assert!(by_email.is_addressed_to(99, "Late@Example.com"));
        assert!(!by_email.is_addressed_to(99, "early@example.com"));
    }

    #[test]
    fn test_drafts_readable_by_sender_only() {
        let draft = view(Some(20), Some("user@example.com"), true);
        assert!(draft.is_readable_by(10, "sender@example.com"));
        assert!(!draft.is_readable_by(20, "user@example.com"));

        let sent = view(Some(20), Some("user@example.com"), false);
        assert!(sent.is_readable_by(20, "user@example.com"));
        assert!(!sent.is_readable_by(30, "stranger@example.com"));
    }

    #[test]
    fn test_compose_builder() {
        let msg = ComposeMessage::new(1, "to@example.com", "Subject", "Body")
            .with_recipient_id(2);
        assert_eq!(msg.recipient_id, Some(2));
        assert_eq!(msg.recipient_email.as_deref(), Some("to@example.com"));
        assert!(!msg.is_high_priority);
    }
}
