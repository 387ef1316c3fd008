//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Reconnect delay must be greater than zero")]
    InvalidReconnectDelay,

    #[error("Reconnect attempts must be between 1 and 50")]
    InvalidReconnectAttempts,

    #[error("Keep-alive interval must be between 1 and 300 seconds")]
    InvalidKeepalive,

    #[error("Event buffer must be greater than zero")]
    InvalidEventBuffer,

    #[error("Invalid session user id")]
    InvalidUserId,
}
