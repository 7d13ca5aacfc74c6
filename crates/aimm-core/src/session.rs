//! Logged-in user record, kept in a small JSON file between runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The user record returned by the backend's login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub level: Option<serde_json::Value>,
}

impl LoggedUser {
    /// Read the session file. A missing or unreadable file means nobody is logged in.
    pub fn load(path: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&text) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring corrupt session file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn store(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        debug!("Stored session for {}", self.username);
        Ok(())
    }

    pub fn clear(path: &Path) -> crate::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logged-user.json");
        assert!(LoggedUser::load(&path).is_none());

        let user = LoggedUser {
            id: "64f0".into(),
            username: "ada".into(),
            level: Some(serde_json::json!(2)),
        };
        user.store(&path).unwrap();
        assert_eq!(LoggedUser::load(&path), Some(user));

        LoggedUser::clear(&path).unwrap();
        assert!(LoggedUser::load(&path).is_none());
        LoggedUser::clear(&path).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logged-user.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(LoggedUser::load(&path).is_none());
    }
}
