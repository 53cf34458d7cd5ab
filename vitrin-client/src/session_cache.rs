//! Persisted session cache
//!
//! Stores the last established session as JSON on disk so a restart can
//! hydrate without a network round trip. Persistence is optional; a
//! disabled cache keeps sessions in memory only.

use std::path::{Path, PathBuf};

use shared::Session;

use crate::error::ClientResult;

/// On-disk session cache
#[derive(Debug)]
pub struct SessionCache {
    /// `None` disables persistence
    file_path: Option<PathBuf>,
}

impl SessionCache {
    /// Cache backed by `{dir}/session.json`
    pub fn new(dir: &Path) -> Self {
        Self {
            file_path: Some(dir.join("session.json")),
        }
    }

    /// In-memory only; `load` always misses and writes are no-ops
    pub fn disabled() -> Self {
        Self { file_path: None }
    }

    /// Read the persisted session, if any. An unreadable or unparsable
    /// file is treated as a miss, not an error.
    pub fn load(&self) -> Option<Session> {
        let path = self.file_path.as_ref()?;
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unparsable session cache");
                None
            }
        }
    }

    /// Persist the session
    pub fn save(&self, session: &Session) -> ClientResult<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Remove the persisted session
    pub fn clear(&self) -> ClientResult<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::AuthUser;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
            user: AuthUser {
                id: "u1".to_string(),
                email: "a@example.com".to_string(),
                email_confirmed: true,
            },
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let cache = SessionCache::new(dir.path());

        assert!(cache.load().is_none());

        cache.save(&session()).unwrap();
        let loaded = cache.load().unwrap();
        assert_eq!(loaded.access_token, "token");
        assert_eq!(loaded.user.id, "u1");

        cache.clear().unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_unparsable_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = SessionCache::new(dir.path());
        std::fs::write(dir.path().join("session.json"), "not json").unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_disabled_cache_is_inert() {
        let cache = SessionCache::disabled();
        cache.save(&session()).unwrap();
        assert!(cache.load().is_none());
        cache.clear().unwrap();
    }
}
