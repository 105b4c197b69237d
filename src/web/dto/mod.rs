//! Data transfer objects for the REST API.
//!
//! All payloads use camelCase field names.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
