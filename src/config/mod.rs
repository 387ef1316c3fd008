//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BARGAIN` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use bargain_live::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Bargain API at {}", config.api.base_url());
//! ```

mod api;
mod connection;
mod error;
mod session;

pub use api::ApiConfig;
pub use connection::ConnectionConfig;
pub use error::{ConfigError, ValidationError};
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults except the session, which the host supplies.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bargain REST service (base URL, timeout)
    #[serde(default)]
    pub api: ApiConfig,

    /// Live room socket tuning (reconnect, keep-alive)
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Local user context (token, user id, role)
    #[serde(default)]
    pub session: SessionConfig,

    /// Tracing filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BARGAIN` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BARGAIN__API__BASE_URL=https://...` -> `api.base_url = ...`
    /// - `BARGAIN__CONNECTION__MAX_RECONNECT_ATTEMPTS=5` -> `connection.max_reconnect_attempts = 5`
    /// - `BARGAIN__SESSION__TOKEN=...` -> `session.token = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BARGAIN")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        self.connection.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

fn default_log_level() -> String {
    "info,bargain_live=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Role;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("BARGAIN__SESSION__TOKEN", "jwt-token");
        env::set_var("BARGAIN__SESSION__USER_ID", "buyer-1");
    }

    fn clear_env() {
        env::remove_var("BARGAIN__SESSION__TOKEN");
        env::remove_var("BARGAIN__SESSION__USER_ID");
        env::remove_var("BARGAIN__SESSION__ROLE");
        env::remove_var("BARGAIN__API__BASE_URL");
        env::remove_var("BARGAIN__CONNECTION__MAX_RECONNECT_ATTEMPTS");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.session.user_id.as_deref(), Some("buyer-1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.api.base_url(), "http://localhost:8000/api/v1");
        assert_eq!(config.connection.max_reconnect_attempts, 5);
        assert_eq!(config.connection.reconnect_delay_ms, 3_000);
        assert_eq!(config.session.role, Role::Buyer);
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("BARGAIN__API__BASE_URL", "https://mandi.example.com/api/v1");
        env::set_var("BARGAIN__CONNECTION__MAX_RECONNECT_ATTEMPTS", "3");
        env::set_var("BARGAIN__SESSION__ROLE", "seller");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.api.base_url(), "https://mandi.example.com/api/v1");
        assert_eq!(config.connection.max_reconnect_attempts, 3);
        assert_eq!(config.session.role, Role::Seller);
    }

    #[test]
    fn test_missing_session_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("session.token"))
        );
    }
}
