//! Category Model

use serde::{Deserialize, Serialize};

/// Category entity
///
/// Name is unique case-insensitively. The uniqueness is maintained by the
/// ensure-by-name find-or-create sequence, not by a database constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}
