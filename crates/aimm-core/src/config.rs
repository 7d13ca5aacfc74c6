//! Editor configuration: backend location, viewport and session file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:5001";
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1920.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 1080.0;
pub const DEFAULT_SESSION_FILE: &str = "logged-user.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Stored editor configuration (persisted to a JSON file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AimmConfig {
    /// Base URL of the model backend, without trailing slash.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Viewport width used to keep popovers on screen.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    /// Where the logged-in user record lives.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_viewport_width() -> f64 {
    DEFAULT_VIEWPORT_WIDTH
}
fn default_viewport_height() -> f64 {
    DEFAULT_VIEWPORT_HEIGHT
}
fn default_session_file() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_FILE)
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AimmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            session_file: default_session_file(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            config_path: PathBuf::new(),
        }
    }
}

impl AimmConfig {
    /// Load config from file, falling back to defaults, then apply env overrides.
    pub fn load(config_path: &Path) -> Self {
        let mut config: AimmConfig = match std::fs::read_to_string(config_path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!("Ignoring invalid config {}: {}", config_path.display(), e);
                AimmConfig::default()
            }),
            Err(_) => AimmConfig::default(),
        };
        config.config_path = config_path.to_path_buf();
        config.apply_env();
        config
    }

    /// Override fields from `AIMM_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("AIMM_API_URL") {
            self.api_url = url;
        }
        if let Some(w) = env_f64("AIMM_VIEWPORT_WIDTH") {
            self.viewport_width = w;
        }
        if let Some(h) = env_f64("AIMM_VIEWPORT_HEIGHT") {
            self.viewport_height = h;
        }
        if let Ok(path) = std::env::var("AIMM_SESSION_FILE") {
            self.session_file = PathBuf::from(path);
        }
        self.api_url = self.api_url.trim_end_matches('/').to_string();
    }

    /// Save config to disk.
    pub fn save(&self) -> crate::Result<()> {
        if self.config_path.as_os_str().is_empty() {
            return Err(crate::Error::Config("no config path set".into()));
        }
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved config to {}", self.config_path.display());
        Ok(())
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AimmConfig::load(&dir.path().join("nope.json"));
        assert_eq!(config.viewport_width, DEFAULT_VIEWPORT_WIDTH);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aimm.json");
        std::fs::write(&path, r#"{"viewport_width": 1000}"#).unwrap();
        let config: AimmConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.viewport_width, 1000.0);
        assert_eq!(config.viewport_height, DEFAULT_VIEWPORT_HEIGHT);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/aimm.json");
        let mut config = AimmConfig::default();
        config.config_path = path.clone();
        config.viewport_height = 800.0;
        config.save().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let reloaded: AimmConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(reloaded.viewport_height, 800.0);
    }

    #[test]
    fn test_save_without_path_fails() {
        assert!(AimmConfig::default().save().is_err());
    }
}
