//! Data models
//!
//! Shared between vitrin-client and the mock backend.
//! Row ids are `String` (the remote store mints UUIDs).

pub mod cart;
pub mod category;
pub mod comment;
pub mod favorite;
pub mod product;
pub mod profile;

// Re-exports
pub use cart::*;
pub use category::*;
pub use comment::*;
pub use favorite::*;
pub use product::*;
pub use profile::*;
