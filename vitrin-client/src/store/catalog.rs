//! Catalog store
//!
//! Product list with category names joined. Admin CRUD goes through
//! here; the remote store's access rules are the real gate, the
//! client-side validation only rejects obviously malformed input before
//! a network call is spent on it.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use shared::models::{Product, ProductDraft, ProductPatch};

use crate::error::{ClientError, ClientResult};
use crate::service::DataService;

/// In-memory product list, newest-created first
pub struct CatalogStore {
    data: Arc<dyn DataService>,
    items: Vec<Product>,
}

impl CatalogStore {
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self {
            data,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.items.iter().find(|p| p.id == id)
    }

    /// Retrieve all products ordered by most-recently-created, category
    /// name joined; replaces the local list wholesale
    pub async fn fetch(&mut self) -> ClientResult<()> {
        self.items = self.data.list_products().await?;
        Ok(())
    }

    /// Insert a product and prepend the echoed row. When the backend
    /// accepts the write without echoing a row, resynchronize instead —
    /// callers must not assume `add` yields an immediately usable entity.
    pub async fn add(&mut self, draft: ProductDraft) -> ClientResult<()> {
        validate_draft(&draft)?;

        match self.data.insert_product(&draft).await? {
            Some(product) => {
                self.items.insert(0, product);
                Ok(())
            }
            None => self.resync_after_blind_write().await,
        }
    }

    /// Update a product in place, same echo/fallback pattern as `add`
    pub async fn update(&mut self, id: &str, patch: ProductPatch) -> ClientResult<()> {
        validate_patch(&patch)?;

        match self.data.update_product(id, &patch).await? {
            Some(product) => {
                if let Some(existing) = self.items.iter_mut().find(|p| p.id == id) {
                    *existing = product;
                }
                Ok(())
            }
            None => self.resync_after_blind_write().await,
        }
    }

    /// Delete by id, remote then local; no echo to lose, so no fallback
    pub async fn remove(&mut self, id: &str) -> ClientResult<()> {
        self.data.delete_product(id).await?;
        self.items.retain(|p| p.id != id);
        Ok(())
    }

    /// Degraded path: the write was accepted but the row was not echoed
    /// back, so the only safe mirror is a full refetch
    async fn resync_after_blind_write(&mut self) -> ClientResult<()> {
        warn!("write accepted without echo, resynchronizing catalog");
        self.fetch().await
    }
}

fn validate_draft(draft: &ProductDraft) -> ClientResult<()> {
    validate_fields(
        Some(&draft.title),
        Some(draft.price),
        draft.stock,
        draft.image.as_deref(),
    )
}

fn validate_patch(patch: &ProductPatch) -> ClientResult<()> {
    validate_fields(
        patch.title.as_deref(),
        patch.price,
        patch.stock,
        patch.image.as_deref(),
    )
}

fn validate_fields(
    title: Option<&str>,
    price: Option<Decimal>,
    stock: Option<i64>,
    image: Option<&str>,
) -> ClientResult<()> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(ClientError::Validation("title must not be empty".to_string()));
        }
    }
    if let Some(price) = price {
        if price < Decimal::ZERO {
            return Err(ClientError::Validation("price must not be negative".to_string()));
        }
    }
    if let Some(stock) = stock {
        if stock < 0 {
            return Err(ClientError::Validation("stock must not be negative".to_string()));
        }
    }
    if let Some(image) = image {
        if !image.starts_with("http://") && !image.starts_with("https://") {
            return Err(ClientError::Validation(
                "image must be an http(s) URL".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            title: "Sneaker".to_string(),
            price: Decimal::new(4999, 2),
            image: Some("https://cdn.example.com/sneaker.png".to_string()),
            stock: Some(10),
            description: None,
            category_id: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert!(matches!(validate_draft(&d), Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut d = draft();
        d.price = Decimal::new(-1, 0);
        assert!(matches!(validate_draft(&d), Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut d = draft();
        d.stock = Some(-3);
        assert!(matches!(validate_draft(&d), Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_malformed_image_url_rejected() {
        let mut d = draft();
        d.image = Some("ftp://cdn.example.com/x.png".to_string());
        assert!(matches!(validate_draft(&d), Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_patch_with_no_fields_passes() {
        assert!(validate_patch(&ProductPatch::default()).is_ok());
    }
}
