//! Live room connection configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Reconnect and keep-alive tuning for room sockets.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Fixed wait between a close and the next attempt, in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Attempts allowed before the connection is declared failed
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Interval between `ping` frames while open, in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    /// Capacity of the per-room event queue
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl ConnectionConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reconnect_delay_ms == 0 {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        if !(1..=50).contains(&self.max_reconnect_attempts) {
            return Err(ValidationError::InvalidReconnectAttempts);
        }
        if !(1..=300).contains(&self.keepalive_secs) {
            return Err(ValidationError::InvalidKeepalive);
        }
        if self.event_buffer == 0 {
            return Err(ValidationError::InvalidEventBuffer);
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            keepalive_secs: default_keepalive(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_reconnect_delay() -> u64 {
    3_000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_keepalive() -> u64 {
    30
}

fn default_event_buffer() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_client() {
        let config = ConnectionConfig::default();
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.keepalive_interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_attempts() {
        let config = ConnectionConfig {
            max_reconnect_attempts: 0,
            ..ConnectionConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidReconnectAttempts));
    }

    #[test]
    fn rejects_zero_keepalive() {
        let config = ConnectionConfig {
            keepalive_secs: 0,
            ..ConnectionConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidKeepalive));
    }
}
