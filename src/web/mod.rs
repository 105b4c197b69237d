//! REST API for Mailroom.
//!
//! Auth routes live under `/api/auth`, message routes under `/api/email`.
//! Message routes require a bearer token.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
