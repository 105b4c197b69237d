//! Message and attachment repositories.
//!
//! All functions take a connection so the workflow can group them into a
//! single transaction.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::types::{Attachment, MessageUpdate, MessageView, NewAttachment, NewMessage};
use crate::{MailroomError, Result};

const VIEW_SELECT: &str = r#"
    SELECT m.id, m.subject, m.body, m.sender_id, m.recipient_id, m.recipient_email,
           m.sent_at, m.is_read, m.is_draft, m.is_high_priority,
           s.email AS sender_email, r.email AS recipient_user_email
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    LEFT JOIN users r ON r.id = m.recipient_id
"#;

const NEWEST_FIRST: &str = " ORDER BY m.sent_at DESC, m.id DESC";

const ATTACHMENT_COLUMNS: &str =
    "id, message_id, file_name, content_type, file_size, storage_name, uploaded_at";

/// Repository for message rows.
pub struct MessageRepository;

impl MessageRepository {
    /// Insert a message and return its ID.
    pub async fn create(conn: &mut SqliteConnection, msg: &NewMessage) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (subject, body, sender_id, recipient_id, recipient_email,
                                  sent_at, is_read, is_draft, is_high_priority)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&msg.subject)
        .bind(&msg.body)
        .bind(msg.sender_id)
        .bind(msg.recipient_id)
        .bind(&msg.recipient_email)
        .bind(msg.sent_at)
        .bind(msg.is_draft)
        .bind(msg.is_high_priority)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get a message with sender/recipient addresses and attachments.
    pub async fn get_view(conn: &mut SqliteConnection, id: i64) -> Result<Option<MessageView>> {
        let sql = format!("{VIEW_SELECT} WHERE m.id = ?");
        let view = sqlx::query_as::<_, MessageView>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match view {
            Some(mut view) => {
                view.attachments = AttachmentRepository::list_by_message(conn, id).await?;
                Ok(Some(view))
            }
            None => Ok(None),
        }
    }

    /// Check whether a message exists.
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    /// Overwrite the editable fields and stamp `sent_at`.
    ///
    /// Returns false if the message does not exist.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        update: &MessageUpdate,
        sent_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET subject = ?, body = ?, recipient_id = ?, recipient_email = ?,
                is_draft = ?, sent_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.subject)
        .bind(&update.body)
        .bind(update.recipient_id)
        .bind(&update.recipient_email)
        .bind(update.is_draft)
        .bind(sent_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a message; attachment rows go with it via the foreign key.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the read flag. Re-marking a read message still counts as found.
    pub async fn mark_read(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE messages SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delivered messages addressed to the user by id or by email.
    pub async fn list_inbox(
        conn: &mut SqliteConnection,
        user_id: i64,
        user_email: &str,
    ) -> Result<Vec<MessageView>> {
        let sql = format!(
            "{VIEW_SELECT} WHERE m.is_draft = 0 AND (m.recipient_id = ? OR m.recipient_email = ?){NEWEST_FIRST}"
        );
        let views = sqlx::query_as::<_, MessageView>(&sql)
            .bind(user_id)
            .bind(user_email)
            .fetch_all(&mut *conn)
            .await?;
        Self::with_attachments(conn, views).await
    }

    /// Delivered messages sent by the user.
    pub async fn list_sent(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<MessageView>> {
        let sql = format!("{VIEW_SELECT} WHERE m.is_draft = 0 AND m.sender_id = ?{NEWEST_FIRST}");
        let views = sqlx::query_as::<_, MessageView>(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
        Self::with_attachments(conn, views).await
    }

    /// Drafts owned by the user.
    pub async fn list_drafts(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<MessageView>> {
        let sql = format!("{VIEW_SELECT} WHERE m.is_draft = 1 AND m.sender_id = ?{NEWEST_FIRST}");
        let views = sqlx::query_as::<_, MessageView>(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
        Self::with_attachments(conn, views).await
    }

    /// Count all messages.
    pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Fill in attachments for a batch of views with one query.
    async fn with_attachments(
        conn: &mut SqliteConnection,
        mut views: Vec<MessageView>,
    ) -> Result<Vec<MessageView>> {
        let ids: Vec<i64> = views.iter().map(|v| v.message.id).collect();
        let attachments = AttachmentRepository::list_by_messages(conn, &ids).await?;

        for attachment in attachments {
            if let Some(view) = views
                .iter_mut()
                .find(|v| v.message.id == attachment.message_id)
            {
                view.attachments.push(attachment);
            }
        }
        Ok(views)
    }
}

/// Repository for attachment metadata.
pub struct AttachmentRepository;

impl AttachmentRepository {
    /// Insert attachment metadata, stamping the upload time.
    pub async fn create(conn: &mut SqliteConnection, new: &NewAttachment) -> Result<Attachment> {
        let result = sqlx::query(
            r#"
            INSERT INTO attachments (message_id, file_name, content_type, file_size,
                                     storage_name, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.message_id)
        .bind(&new.file_name)
        .bind(&new.content_type)
        .bind(new.file_size)
        .bind(&new.storage_name)
        .bind(chrono::Utc::now())
        .execute(&mut *conn)
        .await?;

        Self::get_by_id(conn, result.last_insert_rowid())
            .await?
            .ok_or_else(|| MailroomError::NotFound("attachment".to_string()))
    }

    /// Get attachment metadata by ID.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Attachment>> {
        let sql = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = ?");
        let attachment = sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(attachment)
    }

    /// Attachments of one message, oldest upload first.
    pub async fn list_by_message(
        conn: &mut SqliteConnection,
        message_id: i64,
    ) -> Result<Vec<Attachment>> {
        let sql = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE message_id = ? ORDER BY uploaded_at, id"
        );
        let attachments = sqlx::query_as::<_, Attachment>(&sql)
            .bind(message_id)
            .fetch_all(&mut *conn)
            .await?;
        Ok(attachments)
    }

    /// Attachments of several messages, oldest upload first.
    pub async fn list_by_messages(
        conn: &mut SqliteConnection,
        message_ids: &[i64],
    ) -> Result<Vec<Attachment>> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE message_id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in message_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY uploaded_at, id");

        let attachments = query
            .build_query_as::<Attachment>()
            .fetch_all(&mut *conn)
            .await?;
        Ok(attachments)
    }
}
