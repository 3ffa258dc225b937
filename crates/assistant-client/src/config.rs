//! Endpoint configuration for the assistant backend.
//!
//! Supports reading settings from `~/.config/edms-assistant/config.toml`,
//! with the `EDMS_ASSISTANT_URL` environment variable taking precedence
//! over the file.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use assistant_core::{AssistantError, Result};
use serde::Deserialize;

/// Default backend address of a local development deployment.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Client-side transport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Loads the configuration: file values when the file exists, built-in
    /// defaults otherwise, `EDMS_ASSISTANT_URL` overriding the base URL.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Ok(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    AssistantError::config(format!(
                        "Failed to read configuration file at {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                toml::from_str(&content).map_err(|e| {
                    AssistantError::config(format!(
                        "Failed to parse configuration file at {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            _ => Self::default(),
        };

        if let Ok(url) = env::var("EDMS_ASSISTANT_URL") {
            config.base_url = url;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Returns the path to the configuration file:
/// `~/.config/edms-assistant/config.toml`
fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AssistantError::config("Could not determine home directory"))?;
    Ok(home
        .join(".config")
        .join("edms-assistant")
        .join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn file_values_override_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            base_url = "https://assistant.example.com"
            request_timeout_secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://assistant.example.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
