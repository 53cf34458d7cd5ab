//! Auth DTOs shared between client and backend
//!
//! Mirrors the auth subsystem's wire shapes: a session carries the bearer
//! token plus the identity it was issued for.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Identity as reported by the auth subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    /// False while the provider is still waiting for email confirmation
    #[serde(default = "default_true")]
    pub email_confirmed: bool,
}

fn default_true() -> bool {
    true
}

/// An established session with the auth subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as Unix milliseconds; `None` means the provider did not say
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the session's token is already past its expiry
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at <= crate::types::now_millis(),
            None => false,
        }
    }
}
