//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session cache I/O failed
    #[error("Session cache error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote rejected the bearer token (or none was sent)
    #[error("Unauthorized")]
    Unauthorized,

    /// A store mutator was invoked without a signed-in user
    #[error("Authentication required")]
    AuthRequired,

    /// Remote access rules rejected the write (ownership or role)
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client-side validation rejected the input before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Auth provider: wrong email/password pair
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Auth provider: the account exists but email confirmation is pending
    #[error("Email not confirmed")]
    EmailNotConfirmed,

    /// Auth provider: an account with this email already exists
    #[error("Email already registered")]
    EmailTaken,

    /// Remote accepted the call but the response shape was unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Any other error reported by the remote data service
    #[error("Remote error: {0}")]
    Remote(String),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
