//! # Portal Configuration
//!
//! Defaults suitable for local development, overridable from the
//! environment:
//!
//! | Variable                      | Field                          |
//! |-------------------------------|--------------------------------|
//! | `PORTAL_API_BASE_URL`         | `api.base_url`                 |
//! | `PORTAL_REQUEST_TIMEOUT_SECS` | `api.request_timeout`          |
//! | `PORTAL_REQUIRE_VERIFICATION` | `session.require_verification` |
//! | `PORTAL_DATA_DIR`             | `session.data_dir`             |
//! | `PORTAL_KEY_NAMESPACE`        | `session.key_namespace`        |
//!
//! Unparseable values are ignored with a warning.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ConfigError;

/// Complete portal configuration.
#[derive(Debug, Clone, Default)]
pub struct PortalConfig {
    /// Backend API configuration.
    pub api: ApiConfig,
    /// Session configuration.
    pub session: SessionConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL both gateway paths are appended to.
    pub base_url: String,
    /// Request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout: None,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Whether the meter verification stage sits between login and feedback.
    pub require_verification: bool,
    /// Directory holding the session file.
    pub data_dir: PathBuf,
    /// Prefix for the persisted record keys.
    pub key_namespace: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            require_verification: true,
            data_dir: PathBuf::from("./data"),
            key_namespace: "feedback_portal".to_string(),
        }
    }
}

impl SessionConfig {
    /// Session file inside `data_dir`.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("session.bin")
    }
}

impl PortalConfig {
    /// Defaults overridden by `PORTAL_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PORTAL_API_BASE_URL") {
            config.api.base_url = url.trim().to_string();
            info!("Loaded API base URL from environment");
        }

        if let Some(secs) = lookup("PORTAL_REQUEST_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(0) => config.api.request_timeout = None,
                Ok(s) => config.api.request_timeout = Some(Duration::from_secs(s)),
                Err(_) => warn!("PORTAL_REQUEST_TIMEOUT_SECS must be a whole number of seconds"),
            }
        }

        if let Some(flag) = lookup("PORTAL_REQUIRE_VERIFICATION") {
            match parse_flag(&flag) {
                Some(required) => config.session.require_verification = required,
                None => warn!("PORTAL_REQUIRE_VERIFICATION must be true/false, got {:?}", flag),
            }
        }

        if let Some(dir) = lookup("PORTAL_DATA_DIR") {
            config.session.data_dir = PathBuf::from(dir);
        }

        if let Some(namespace) = lookup("PORTAL_KEY_NAMESPACE") {
            config.session.key_namespace = namespace.trim().to_string();
        }

        config
    }

    /// Reject configurations the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(url.to_string()));
        }
        if self.session.key_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
