//! Client configuration

use std::path::PathBuf;

/// Configuration for connecting to the remote data service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL (e.g., "https://xyz.example.co")
    pub base_url: String,

    /// Publishable API key sent with every request; also used as the
    /// bearer token while no user session is installed
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Directory for the persisted session file; `None` disables
    /// persistence (sessions live only in memory)
    pub session_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new configuration
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            // A hung call must not leave the UI loading indefinitely
            timeout: 8,
            session_dir: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the session persistence directory
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }
}
