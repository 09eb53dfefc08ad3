//! Back-office API configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

const DEFAULT_API_URL: &str = "http://localhost:3001/api";
const DEFAULT_EVENTS_PATH: &str = "calendar/events";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where and how to reach the back-office API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://ops.example.com/api`
    pub base_url: String,
    /// Path of the calendar events collection, relative to `base_url`
    pub events_path: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: std::env::var("FIELDOPS_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            events_path: std::env::var("FIELDOPS_EVENTS_PATH")
                .unwrap_or_else(|_| DEFAULT_EVENTS_PATH.to_string()),
            timeout_secs: std::env::var("FIELDOPS_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific base URL with default paths
    pub fn new(base_url: &str) -> Self {
        BackendConfig {
            base_url: base_url.to_string(),
            events_path: DEFAULT_EVENTS_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_events_path(mut self, path: &str) -> Self {
        self.events_path = path.to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join `path` onto the base URL with exactly one slash between them.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<(), BackendError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(BackendError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.events_path.trim_matches('/').is_empty() {
            return Err(BackendError::Config("events path is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(BackendError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }
}
