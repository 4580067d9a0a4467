//! Configuration loaded from the environment with an optional `user_config.toml` overlay.
//!
//! | Env | Default | Description |
//! |-----|---------|--------------|
//! | NIVESH_API_BASE | http://127.0.0.1:5000 | Base URL for the invest data API. |
//! | NIVESH_ASSISTANT_BASE | http://127.0.0.1:5000 | Base URL for the voice assistant backend. |
//! | NIVESH_HTTP_TIMEOUT_SECS | 30 | Per-request timeout for all HTTP clients. |
//! | NIVESH_DATA_DIR | ./data | Directory for client-persisted state (recent searches). |

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_BASE: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration. Built via [`NiveshConfig::load`]: defaults, then
/// environment, then `user_config.toml` overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NiveshConfig {
    /// Base URL for the invest data API (`/invest/api/...`).
    pub api_base: String,
    /// Base URL for the assistant backend (`/transcribe`, `/process_query`, ...).
    pub assistant_base: String,
    /// Timeout applied to every HTTP request.
    pub http_timeout_secs: u64,
    /// Directory for client-persisted state.
    pub data_dir: PathBuf,
}

impl Default for NiveshConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_BASE.to_string(),
            assistant_base: DEFAULT_BASE.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl NiveshConfig {
    /// Load from environment. Unset or invalid values fall back to defaults.
    pub fn from_env() -> Self {
        let api_base = env_string("NIVESH_API_BASE").unwrap_or_else(|| DEFAULT_BASE.to_string());
        Self {
            // The assistant usually runs in the same backend process as the
            // invest API, so it inherits api_base unless set explicitly.
            assistant_base: env_string("NIVESH_ASSISTANT_BASE").unwrap_or_else(|| api_base.clone()),
            api_base,
            http_timeout_secs: env_u64("NIVESH_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            data_dir: env_string("NIVESH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
        }
    }

    /// Environment config with `user_config.toml` overrides applied when the file exists.
    pub fn load() -> Self {
        let mut config = Self::from_env();
        if let Ok(user) = UserConfig::load_from_path(&UserConfig::default_path()) {
            config.apply_user(&user);
        }
        config
    }

    fn apply_user(&mut self, user: &UserConfig) {
        if let Some(ref base) = user.api_base {
            self.api_base = base.clone();
        }
        if let Some(ref base) = user.assistant_base {
            self.assistant_base = base.clone();
        }
        if let Some(secs) = user.http_timeout_secs {
            self.http_timeout_secs = secs;
        }
    }
}

/// User-specific overrides stored in `user_config.toml` next to the binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub assistant_base: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

impl UserConfig {
    /// Default path for the user configuration file.
    pub fn default_path() -> PathBuf {
        PathBuf::from("user_config.toml")
    }

    /// Load from a path. A missing file is an error the caller may ignore.
    pub fn load_from_path(path: &Path) -> crate::error::CoreResult<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::CoreError::Config(e.to_string()))
    }

    /// Save to a path, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> crate::error::CoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local_backend() {
        let c = NiveshConfig::default();
        assert_eq!(c.api_base, "http://127.0.0.1:5000");
        assert_eq!(c.assistant_base, c.api_base);
        assert_eq!(c.http_timeout_secs, 30);
    }

    #[test]
    fn user_overrides_apply() {
        let mut c = NiveshConfig::default();
        let user = UserConfig {
            api_base: Some("http://10.0.0.2:8000".to_string()),
            assistant_base: None,
            http_timeout_secs: Some(5),
        };
        c.apply_user(&user);
        assert_eq!(c.api_base, "http://10.0.0.2:8000");
        assert_eq!(c.assistant_base, "http://127.0.0.1:5000");
        assert_eq!(c.http_timeout_secs, 5);
    }

    #[test]
    fn user_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_config.toml");
        let user = UserConfig {
            api_base: Some("http://example.invalid".to_string()),
            ..Default::default()
        };
        user.save_to_path(&path).unwrap();
        let loaded = UserConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.api_base.as_deref(), Some("http://example.invalid"));
        assert!(loaded.assistant_base.is_none());
    }
}
