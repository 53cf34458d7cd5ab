//! State stores
//!
//! Each store owns one slice of client state and mirrors it against the
//! remote data service: remote write first, local transition only after
//! success. Stores are plain structs wired at the composition root, not
//! ambient singletons, so tests construct fresh instances per case.

pub mod cart;
pub mod catalog;
pub mod category;
pub mod comments;
pub mod favorites;

pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use category::CategoryStore;
pub use comments::CommentsStore;
pub use favorites::FavoritesStore;

use std::sync::Arc;

use crate::service::DataService;
use crate::session::SessionHandle;

/// All stores, wired against one data service and one session view.
///
/// On logout call [`Stores::clear_local`] so the next sign-in for a
/// different user never sees the previous user's cart or favorites.
pub struct Stores {
    pub catalog: CatalogStore,
    pub categories: CategoryStore,
    pub cart: CartStore,
    pub favorites: FavoritesStore,
    pub comments: CommentsStore,
}

impl Stores {
    pub fn new(data: Arc<dyn DataService>, session: SessionHandle) -> Self {
        Self {
            catalog: CatalogStore::new(data.clone()),
            categories: CategoryStore::new(data.clone()),
            cart: CartStore::new(data.clone(), session.clone()),
            favorites: FavoritesStore::new(data.clone(), session.clone()),
            comments: CommentsStore::new(data, session),
        }
    }

    /// Wipe the per-user slices without touching the remote store
    pub fn clear_local(&mut self) {
        self.cart.clear_local();
        self.favorites.clear_local();
    }
}
