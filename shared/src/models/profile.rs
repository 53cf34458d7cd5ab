//! Profile Model

use serde::{Deserialize, Serialize};

use crate::types::UserRole;

/// Profile row keyed by the auth subsystem's user id
///
/// Lazily created by an idempotent upsert at registration and at first
/// sign-in, so either path may run first without divergence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Auth user id (primary key)
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}
