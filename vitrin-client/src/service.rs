//! Remote service seam
//!
//! The stores and the session manager talk to the remote data service
//! through these traits so tests can swap in an in-memory backend.
//! `RestClient` implements both over HTTP.

use async_trait::async_trait;
use tokio::sync::watch;

use shared::Session;
use shared::models::{
    CartLine, CartLineUpsert, Category, Comment, CommentDraft, FavoriteEntry, Product,
    ProductDraft, ProductPatch, Profile,
};

use crate::error::ClientResult;

/// Row-level operations against the remote store.
///
/// Writes return the echoed row where the backend provides one; the
/// product insert/update return `Ok(None)` when the backend accepts the
/// write but echoes nothing, so callers can take the resync path.
#[async_trait]
pub trait DataService: Send + Sync {
    // ========== Products ==========

    /// All products, newest-created first, category name joined
    async fn list_products(&self) -> ClientResult<Vec<Product>>;

    async fn insert_product(&self, draft: &ProductDraft) -> ClientResult<Option<Product>>;

    async fn update_product(&self, id: &str, patch: &ProductPatch)
    -> ClientResult<Option<Product>>;

    async fn delete_product(&self, id: &str) -> ClientResult<()>;

    // ========== Categories ==========

    async fn list_categories(&self) -> ClientResult<Vec<Category>>;

    /// Case-insensitive exact-name lookup
    async fn find_category_by_name(&self, name: &str) -> ClientResult<Option<Category>>;

    async fn insert_category(&self, name: &str) -> ClientResult<Category>;

    // ========== Cart ==========

    /// The user's cart lines, most-recently-updated first
    async fn list_cart_lines(&self, user_id: &str) -> ClientResult<Vec<CartLine>>;

    /// Insert-or-update keyed on (user, product)
    async fn upsert_cart_line(&self, upsert: &CartLineUpsert) -> ClientResult<CartLine>;

    async fn delete_cart_line(&self, user_id: &str, product_id: &str) -> ClientResult<()>;

    /// Batched delete of several lines in one call
    async fn delete_cart_lines(&self, user_id: &str, product_ids: &[String]) -> ClientResult<()>;

    // ========== Favorites ==========

    /// The user's favorites, most-recently-favorited first
    async fn list_favorites(&self, user_id: &str) -> ClientResult<Vec<FavoriteEntry>>;

    async fn insert_favorite(&self, user_id: &str, product_id: &str)
    -> ClientResult<FavoriteEntry>;

    async fn delete_favorite(&self, user_id: &str, product_id: &str) -> ClientResult<()>;

    // ========== Comments ==========

    /// All comments for a product, newest first
    async fn list_comments(&self, product_id: &str) -> ClientResult<Vec<Comment>>;

    async fn insert_comment(&self, draft: &CommentDraft) -> ClientResult<Comment>;

    /// Accepted only for the comment's author or an admin (enforced remotely)
    async fn update_comment(&self, id: &str, text: &str) -> ClientResult<Comment>;

    async fn delete_comment(&self, id: &str) -> ClientResult<()>;

    // ========== Profiles ==========

    /// Idempotent create-if-absent keyed by user id
    async fn upsert_profile(&self, user_id: &str, email: &str) -> ClientResult<()>;

    async fn fetch_profile(&self, user_id: &str) -> ClientResult<Option<Profile>>;

    // ========== RPC ==========

    /// Atomic stock decrement; must never drive stock negative
    async fn decrement_stock(&self, product_id: &str, qty: i64) -> ClientResult<()>;
}

/// Auth subsystem operations.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. Returns `Ok(None)` when the provider requires
    /// email confirmation and no session is established yet.
    async fn sign_up(&self, email: &str, password: &str) -> ClientResult<Option<Session>>;

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session>;

    /// Invalidate the current session remotely and locally
    async fn sign_out(&self) -> ClientResult<()>;

    async fn send_reset_email(&self, email: &str) -> ClientResult<()>;

    /// Exchange a recovery/confirmation token (from a callback URL) for a
    /// session
    async fn exchange_token(&self, token: &str) -> ClientResult<Session>;

    /// Update the signed-in user's password
    async fn update_password(&self, new_password: &str) -> ClientResult<()>;

    /// Session-change notifications: sign-in, refresh, sign-out
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;

    /// Install the session whose token authorizes subsequent row
    /// operations (used on hydration from the session cache)
    fn set_session(&self, session: Option<Session>);
}
