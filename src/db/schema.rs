//! Database schema and migrations for Mailroom.
//!
//! Migrations are applied in order when the database is opened. The
//! schema_version table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users, messages and attachments
    r#"
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL,           -- trimmed, lowercased
    password      TEXT NOT NULL,           -- Argon2 PHC string
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    last_login_at TEXT
);

CREATE UNIQUE INDEX idx_users_email ON users(email COLLATE NOCASE);

CREATE TABLE messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    subject         TEXT NOT NULL,
    body            TEXT NOT NULL,
    sender_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    recipient_id    INTEGER REFERENCES users(id) ON DELETE RESTRICT,
    recipient_email TEXT,                  -- kept even when recipient_id is unresolved
    sent_at         TEXT NOT NULL,         -- sent time, or last edit for drafts
    is_read         INTEGER NOT NULL DEFAULT 0,
    is_draft        INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_messages_sender ON messages(sender_id, is_draft);
CREATE INDEX idx_messages_recipient ON messages(recipient_id, is_draft);
CREATE INDEX idx_messages_recipient_email ON messages(recipient_email);

CREATE TABLE attachments (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id   INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
    file_name    TEXT NOT NULL,
    content_type TEXT NOT NULL,
    file_size    INTEGER NOT NULL,
    storage_name TEXT NOT NULL UNIQUE,
    uploaded_at  TEXT NOT NULL
);

CREATE INDEX idx_attachments_message ON attachments(message_id);
"#,
    // v2: high priority flag
    r#"
ALTER TABLE messages ADD COLUMN is_high_priority INTEGER NOT NULL DEFAULT 0;
"#,
];
