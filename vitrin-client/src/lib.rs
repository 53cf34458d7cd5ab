//! Vitrin Client - storefront client core
//!
//! Client-side state stores (catalog, categories, cart, favorites,
//! comments) synchronized against a hosted relational store, plus the
//! auth session manager. Persistence and auth live entirely in the
//! remote service; this crate owns the local mirrors and the
//! write-then-mirror discipline.

pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod session;
pub mod session_cache;
pub mod store;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::RestClient;
pub use service::{AuthService, DataService};
pub use session::{
    AuthStatus, CurrentUser, LoginOutcome, RegisterOutcome, SessionHandle, SessionManager,
};
pub use session_cache::SessionCache;
pub use store::{CartStore, CatalogStore, CategoryStore, CommentsStore, FavoritesStore, Stores};

// Re-export shared types for convenience
pub use shared::models::{
    CartLine, Category, Comment, FavoriteEntry, Product, ProductDraft, ProductPatch, Profile,
};
pub use shared::{AuthUser, Session, Timestamp, UserRole};
