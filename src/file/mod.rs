//! Attachment file storage for Mailroom.

mod storage;

pub use storage::{sanitize_file_name, AttachmentStorage};
