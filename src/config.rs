//! Configuration, built from environment variables.

use crate::error::ConfigError;

/// Runtime configuration for the binary and the poller.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the REST document store. `None` → in-memory store.
    pub store_url: Option<String>,
    /// User key under which records are stored.
    pub user_key: String,
    /// Mailbox poll interval in seconds.
    pub poll_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            user_key: "default".to_string(),
            poll_interval_secs: 300,
        }
    }
}

impl AppConfig {
    /// Build config from environment variables. Unset variables fall
    /// back to defaults; a set-but-garbled interval is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_url = std::env::var("FINMAIL_STORE_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let user_key =
            std::env::var("FINMAIL_USER").unwrap_or_else(|_| "default".to_string());

        let poll_interval_secs = match std::env::var("FINMAIL_POLL_INTERVAL_SECS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "FINMAIL_POLL_INTERVAL_SECS".to_string(),
                message: format!("expected seconds, got {raw:?}"),
            })?,
            Err(_) => 300,
        };

        Ok(Self {
            store_url,
            user_key,
            poll_interval_secs,
        })
    }
}
