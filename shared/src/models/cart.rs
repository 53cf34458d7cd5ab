//! Cart Model

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One cart line, unique per (user, product)
///
/// Quantity is always >= 1 in a visible line; a write of qty <= 0 is
/// interpreted as deletion of the line, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub user_id: String,
    pub product_id: String,
    pub qty: i64,
    pub updated_at: Timestamp,
}

/// Upsert payload for a cart line, keyed on (user, product)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineUpsert {
    pub user_id: String,
    pub product_id: String,
    pub qty: i64,
}
