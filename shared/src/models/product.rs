//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Product entity as read from the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    /// Non-negative; validated client-side before any write
    pub price: Decimal,
    pub image: Option<String>,
    /// `None` means "stock unspecified", not zero
    pub stock: Option<i64>,
    pub description: Option<String>,
    /// Category reference (String ID)
    pub category_id: Option<String>,
    /// Category name populated by the list join, never written back
    #[serde(default)]
    pub category_name: Option<String>,
    pub created_at: Timestamp,
}

/// Create product payload — server-writable fields only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: Option<i64>,
    pub description: Option<String>,
    pub category_id: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub stock: Option<i64>,
    pub description: Option<String>,
    pub category_id: Option<String>,
}

impl ProductPatch {
    /// Apply this patch over an existing row (mirrors the remote update)
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image = Some(image.clone());
        }
        if let Some(stock) = self.stock {
            product.stock = Some(stock);
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(category_id) = &self.category_id {
            product.category_id = Some(category_id.clone());
        }
    }
}
