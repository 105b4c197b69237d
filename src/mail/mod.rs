//! Message store and workflow for Mailroom.
//!
//! Messages move between two states: draft and delivered. The read flag
//! is independent and only ever goes from unread to read.

mod repository;
mod service;
mod types;

pub use repository::{AttachmentRepository, MessageRepository};
pub use service::MessageService;
pub use types::{
    Attachment, ComposeMessage, DownloadedAttachment, Message, MessageUpdate, MessageView,
    NewAttachment, NewMessage,
};
