//! Message workflow: sending, drafts, lists and attachments.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use super::repository::{AttachmentRepository, MessageRepository};
use super::types::{
    Attachment, ComposeMessage, DownloadedAttachment, MessageUpdate, MessageView, NewAttachment,
    NewMessage,
};
use crate::db::{normalize_email, Database, UserRepository};
use crate::file::{sanitize_file_name, AttachmentStorage};
use crate::{MailroomError, Result};

/// Message workflow over the message store and attachment storage.
pub struct MessageService<'a> {
    db: &'a Database,
    storage: &'a AttachmentStorage,
}

impl<'a> MessageService<'a> {
    pub fn new(db: &'a Database, storage: &'a AttachmentStorage) -> Self {
        Self { db, storage }
    }

    /// Send a message, or save it as a draft.
    ///
    /// An unknown recipient email rejects a send but is kept on a draft.
    pub async fn send_or_save_draft(
        &self,
        compose: &ComposeMessage,
        as_draft: bool,
    ) -> Result<MessageView> {
        validate_compose(compose)?;
        let recipient_email = normalized_opt(compose.recipient_email.as_deref());

        let mut tx = self.db.pool().begin().await?;

        let recipient_id = match compose.recipient_id {
            Some(id) => {
                if UserRepository::new(&mut tx).get_by_id(id).await?.is_none() {
                    return Err(MailroomError::NotFound("recipient".to_string()));
                }
                Some(id)
            }
            None => match recipient_email.as_deref() {
                Some(email) => {
                    let found = resolve_recipient(&mut tx, email).await?;
                    if found.is_none() && !as_draft {
                        debug!(%email, "send rejected: no such recipient");
                        return Err(MailroomError::NotFound("recipient".to_string()));
                    }
                    found
                }
                None => None,
            },
        };

        if UserRepository::new(&mut tx)
            .get_by_id(compose.sender_id)
            .await?
            .is_none()
        {
            return Err(MailroomError::NotFound("sender".to_string()));
        }

        let new_message = NewMessage {
            subject: compose.subject.clone(),
            body: compose.body.clone(),
            sender_id: compose.sender_id,
            recipient_id,
            recipient_email,
            sent_at: Utc::now(),
            is_draft: as_draft,
            is_high_priority: compose.is_high_priority,
        };
        let id = MessageRepository::create(&mut tx, &new_message).await?;
        let view = MessageRepository::get_view(&mut tx, id)
            .await?
            .ok_or_else(|| MailroomError::NotFound("message".to_string()))?;

        tx.commit().await?;

        info!(
            message_id = id,
            sender_id = compose.sender_id,
            draft = as_draft,
            "message stored"
        );
        Ok(view)
    }

    /// Send a message.
    pub async fn send(&self, compose: &ComposeMessage) -> Result<MessageView> {
        self.send_or_save_draft(compose, false).await
    }

    /// Save a draft.
    pub async fn save_draft(&self, compose: &ComposeMessage) -> Result<MessageView> {
        self.send_or_save_draft(compose, true).await
    }

    /// Overwrite a message's editable fields.
    ///
    /// Returns `None` if the message does not exist. Clearing the draft flag
    /// on a message without a recipient ID resolves its email first, which is
    /// how a draft gets sent.
    pub async fn update(&self, id: i64, fields: &MessageUpdate) -> Result<Option<MessageView>> {
        let mut tx = self.db.pool().begin().await?;

        if !MessageRepository::exists(&mut tx, id).await? {
            return Ok(None);
        }

        let mut update = fields.clone();
        update.recipient_email = normalized_opt(update.recipient_email.as_deref());

        if let Some(recipient_id) = update.recipient_id {
            if UserRepository::new(&mut tx)
                .get_by_id(recipient_id)
                .await?
                .is_none()
            {
                return Err(MailroomError::NotFound("recipient".to_string()));
            }
        } else if !update.is_draft {
            let Some(email) = update.recipient_email.clone() else {
                return Err(MailroomError::Validation(
                    "recipient email is required".to_string(),
                ));
            };
            match resolve_recipient(&mut tx, &email).await? {
                Some(found) => update.recipient_id = Some(found),
                None => {
                    debug!(message_id = id, %email, "draft send rejected: no such recipient");
                    return Err(MailroomError::NotFound("recipient".to_string()));
                }
            }
        }

        MessageRepository::update(&mut tx, id, &update, Utc::now()).await?;
        let view = MessageRepository::get_view(&mut tx, id).await?;
        tx.commit().await?;

        info!(message_id = id, draft = update.is_draft, "message updated");
        Ok(view)
    }

    /// Delete a message and its attachments. Returns false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let attachments = AttachmentRepository::list_by_message(&mut tx, id).await?;
        if !MessageRepository::delete(&mut tx, id).await? {
            return Ok(false);
        }
        tx.commit().await?;

        // Rows are gone; stray files are only logged.
        for attachment in &attachments {
            if let Err(e) = self.storage.delete(&attachment.storage_name).await {
                warn!(
                    attachment_id = attachment.id,
                    error = %e,
                    "failed to remove attachment file"
                );
            }
        }

        info!(message_id = id, attachments = attachments.len(), "message deleted");
        Ok(true)
    }

    /// Mark a message read. Returns false if not found.
    pub async fn mark_read(&self, id: i64) -> Result<bool> {
        let mut conn = self.db.pool().acquire().await?;
        MessageRepository::mark_read(&mut conn, id).await
    }

    /// Get a message by ID.
    pub async fn get(&self, id: i64) -> Result<Option<MessageView>> {
        let mut conn = self.db.pool().acquire().await?;
        MessageRepository::get_view(&mut conn, id).await
    }

    /// Delivered messages for a user, matched by id or email, newest first.
    pub async fn inbox(&self, user_id: i64, user_email: &str) -> Result<Vec<MessageView>> {
        let mut conn = self.db.pool().acquire().await?;
        MessageRepository::list_inbox(&mut conn, user_id, &normalize_email(user_email)).await
    }

    /// Delivered messages sent by a user, newest first.
    pub async fn sent(&self, user_id: i64) -> Result<Vec<MessageView>> {
        let mut conn = self.db.pool().acquire().await?;
        MessageRepository::list_sent(&mut conn, user_id).await
    }

    /// Drafts owned by a user, newest first.
    ///
    /// `_user_email` is accepted alongside `inbox` for symmetry; drafts are
    /// matched on sender only.
    pub async fn drafts(&self, user_id: i64, _user_email: &str) -> Result<Vec<MessageView>> {
        let mut conn = self.db.pool().acquire().await?;
        MessageRepository::list_drafts(&mut conn, user_id).await
    }

    /// Store an attachment for a message.
    ///
    /// Returns `None` if the message does not exist. The file is written
    /// before the metadata row and removed again if the row cannot be saved.
    pub async fn add_attachment(
        &self,
        message_id: i64,
        content: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> Result<Option<Attachment>> {
        if !self.message_exists(message_id).await? {
            return Ok(None);
        }

        let file_name = sanitize_file_name(file_name);
        let storage_name = self.storage.save(content, &file_name).await?;

        let new_attachment = NewAttachment {
            message_id,
            file_name,
            content_type: content_type.to_string(),
            file_size: content.len() as i64,
            storage_name: storage_name.clone(),
        };

        match self.insert_attachment(&new_attachment).await {
            Ok(Some(attachment)) => {
                info!(
                    message_id,
                    attachment_id = attachment.id,
                    size = attachment.file_size,
                    "attachment stored"
                );
                Ok(Some(attachment))
            }
            outcome => {
                if let Err(cleanup) = self.storage.delete(&storage_name).await {
                    warn!(error = %cleanup, "failed to remove orphaned attachment file");
                }
                outcome
            }
        }
    }

    async fn message_exists(&self, message_id: i64) -> Result<bool> {
        let mut conn = self.db.pool().acquire().await?;
        MessageRepository::exists(&mut conn, message_id).await
    }

    /// Insert attachment metadata in its own transaction.
    ///
    /// `None` if the message was deleted after the file was written.
    async fn insert_attachment(&self, new_attachment: &NewAttachment) -> Result<Option<Attachment>> {
        let mut tx = self.db.pool().begin().await?;
        if !MessageRepository::exists(&mut tx, new_attachment.message_id).await? {
            return Ok(None);
        }
        let attachment = AttachmentRepository::create(&mut tx, new_attachment).await?;
        tx.commit().await?;
        Ok(Some(attachment))
    }

    /// Get attachment metadata.
    pub async fn get_attachment(&self, attachment_id: i64) -> Result<Option<Attachment>> {
        let mut conn = self.db.pool().acquire().await?;
        AttachmentRepository::get_by_id(&mut conn, attachment_id).await
    }

    /// Load an attachment's bytes.
    ///
    /// Fails with [`MailroomError::NotFound`] when either the metadata or the
    /// stored file is missing.
    pub async fn download_attachment(&self, attachment_id: i64) -> Result<DownloadedAttachment> {
        let attachment = self
            .get_attachment(attachment_id)
            .await?
            .ok_or_else(|| MailroomError::NotFound("attachment".to_string()))?;

        let content = self.storage.load(&attachment.storage_name).await?;
        Ok(DownloadedAttachment {
            content,
            content_type: attachment.content_type,
            file_name: attachment.file_name,
        })
    }

    /// Total number of stored messages.
    pub async fn count(&self) -> Result<i64> {
        let mut conn = self.db.pool().acquire().await?;
        MessageRepository::count(&mut conn).await
    }
}

fn validate_compose(compose: &ComposeMessage) -> Result<()> {
    if compose.subject.trim().is_empty() {
        return Err(MailroomError::Validation("subject is required".to_string()));
    }
    if compose.body.trim().is_empty() {
        return Err(MailroomError::Validation("body is required".to_string()));
    }
    let has_email = compose
        .recipient_email
        .as_deref()
        .is_some_and(|e| !e.trim().is_empty());
    if compose.recipient_id.is_none() && !has_email {
        return Err(MailroomError::Validation(
            "recipient email is required".to_string(),
        ));
    }
    Ok(())
}

fn normalized_opt(email: Option<&str>) -> Option<String> {
    email.map(normalize_email).filter(|e| !e.is_empty())
}

async fn resolve_recipient(conn: &mut SqliteConnection, email: &str) -> Result<Option<i64>> {
    Ok(UserRepository::new(conn)
        .get_by_email(email)
        .await?
        .map(|user| user.id))
}
