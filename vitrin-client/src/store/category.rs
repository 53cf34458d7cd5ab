//! Category store
//!
//! Name-to-id resolution with create-on-demand, used by the admin
//! product form's free-text category field.

use std::collections::HashMap;
use std::sync::Arc;

use shared::models::Category;

use crate::error::{ClientError, ClientResult};
use crate::service::DataService;

/// Categories keyed by id, with a lowercased-name index for cache hits
pub struct CategoryStore {
    data: Arc<dyn DataService>,
    items: HashMap<String, Category>,
    by_name: HashMap<String, String>,
}

impl CategoryStore {
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self {
            data,
            items: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Category> {
        self.items.values()
    }

    /// Load all categories into the id map and the name index
    pub async fn fetch(&mut self) -> ClientResult<()> {
        let categories = self.data.list_categories().await?;
        self.items.clear();
        self.by_name.clear();
        for category in categories {
            self.cache(category);
        }
        Ok(())
    }

    /// Resolve a category name to its id, creating the row on demand.
    ///
    /// Local index hit costs no network call. On a miss the remote store
    /// is queried case-insensitively before inserting. The find-then-
    /// create sequence is not atomic against concurrent callers; two
    /// clients racing on a never-seen name can both insert (known gap,
    /// inherited from the data model's lack of a unique constraint).
    pub async fn ensure_by_name(&mut self, raw_name: &str) -> ClientResult<String> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        let key = name.to_lowercase();

        if let Some(id) = self.by_name.get(&key) {
            return Ok(id.clone());
        }

        if let Some(found) = self.data.find_category_by_name(name).await? {
            let id = found.id.clone();
            self.cache(found);
            return Ok(id);
        }

        let inserted = self.data.insert_category(name).await?;
        let id = inserted.id.clone();
        self.cache(inserted);
        Ok(id)
    }

    fn cache(&mut self, category: Category) {
        self.by_name
            .insert(category.name.trim().to_lowercase(), category.id.clone());
        self.items.insert(category.id.clone(), category);
    }
}
