//! Favorite Model

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Favorite membership row, unique per (user, product)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub user_id: String,
    pub product_id: String,
    pub created_at: Timestamp,
}
