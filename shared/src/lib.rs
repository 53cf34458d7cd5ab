//! Shared types for the vitrin storefront client
//!
//! Data models and auth DTOs shared between `vitrin-client` and the
//! in-memory mock backend. Everything here is plain serde data; no I/O.

pub mod auth;
pub mod models;
pub mod types;

pub use auth::{AuthUser, Session};
pub use types::{Timestamp, UserRole, now_millis};
