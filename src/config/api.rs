//! Bargain REST API configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where the bargain service lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:8000/api/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|_| ValidationError::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    15
}
