//! Comment Model

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Product comment
///
/// Mutable only by its author or an admin; the remote store's access rules
/// are the enforcement point, client-side checks are presentation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub product_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Create comment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDraft {
    pub product_id: String,
    pub author_id: String,
    pub text: String,
}
