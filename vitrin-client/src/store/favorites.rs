//! Favorites store
//!
//! Boolean membership set per user, mirrored against a remote table
//! keyed on (user, product). Same remote-then-mirror discipline as the
//! cart, without a quantity.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use shared::models::FavoriteEntry;

use crate::error::ClientResult;
use crate::service::DataService;
use crate::session::SessionHandle;

/// Product-id-keyed membership map for the signed-in user
pub struct FavoritesStore {
    data: Arc<dyn DataService>,
    session: SessionHandle,
    items: HashMap<String, FavoriteEntry>,
}

impl FavoritesStore {
    pub fn new(data: Arc<dyn DataService>, session: SessionHandle) -> Self {
        Self {
            data,
            session,
            items: HashMap::new(),
        }
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.contains_key(product_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Load the user's favorites, most-recently-favorited first
    pub async fn fetch(&mut self) -> ClientResult<()> {
        let user = self.session.require_user()?;
        let entries = self.data.list_favorites(&user.id).await?;
        self.items = entries
            .into_iter()
            .map(|e| (e.product_id.clone(), e))
            .collect();
        Ok(())
    }

    pub async fn add(&mut self, product_id: &str) -> ClientResult<()> {
        let user = self.session.require_user()?;
        let entry = self.data.insert_favorite(&user.id, product_id).await?;
        self.items.insert(entry.product_id.clone(), entry);
        Ok(())
    }

    pub async fn remove(&mut self, product_id: &str) -> ClientResult<()> {
        let user = self.session.require_user()?;
        self.data.delete_favorite(&user.id, product_id).await?;
        self.items.remove(product_id);
        Ok(())
    }

    /// Wipe local state on logout; the remote rows stay
    pub fn clear_local(&mut self) {
        self.items.clear();
        debug!("favorites local state cleared");
    }
}
