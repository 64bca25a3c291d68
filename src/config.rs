//! Client configuration
//!
//! `ClientConfig` is built programmatically (`Default` + struct update) or
//! from `HELMET_*` environment variables via `ClientConfig::from_env()`.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_URL: &str = "HELMET_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "HELMET_API_TIMEOUT_SECS";
pub const ENV_UPLOAD_TIMEOUT_SECS: &str = "HELMET_API_UPLOAD_TIMEOUT_SECS";
pub const ENV_TOKEN_PATH: &str = "HELMET_TOKEN_PATH";

/// Configuration for `HelmetClient` and `HttpTransport`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL all request paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for ordinary calls (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound for bulk transfers such as video detection (seconds)
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Where the bearer token is persisted; memory-only when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,

    /// User-Agent header sent by the HTTP transport
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!("helmet-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            token_path: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `HELMET_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (used by `from_env`)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_secs(ENV_TIMEOUT_SECS, &secs)?;
        }
        if let Some(secs) = lookup(ENV_UPLOAD_TIMEOUT_SECS) {
            config.upload_timeout_secs = parse_secs(ENV_UPLOAD_TIMEOUT_SECS, &secs)?;
        }
        if let Some(path) = lookup(ENV_TOKEN_PATH).filter(|p| !p.is_empty()) {
            config.token_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is usable and timeouts are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("Base URL cannot be empty".to_string()));
        }
        reqwest::Url::parse(&self.base_url).map_err(|e| {
            ClientError::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        if self.timeout_secs == 0 || self.upload_timeout_secs == 0 {
            return Err(ClientError::Config(
                "Timeouts must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ClientError::Config(format!("{} must be a number of seconds: {}", key, e)))
}
