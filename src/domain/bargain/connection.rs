//! Connection lifecycle as published by the connection manager.

use serde::Serialize;

/// Where the live connection for a room currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "phase", content = "attempt", rename_all = "snake_case")]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Open,
    /// Waiting to retry; carries the number of the reconnect about to be made.
    Backoff(u32),
    /// Reconnect cap reached. No further attempts are made.
    Failed,
}

impl ConnectionPhase {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionPhase::Open)
    }
}

/// Snapshot of the connection manager's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    /// Reconnects scheduled since the last successful open.
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
}

impl ConnectionState {
    pub fn idle(max_attempts: u32) -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            attempts: 0,
            max_attempts,
            last_error: None,
        }
    }

    /// Indicator text shown next to the room.
    pub fn label(&self) -> String {
        match self.phase {
            ConnectionPhase::Idle => "Connecting…".to_string(),
            ConnectionPhase::Connecting if self.attempts == 0 => "Connecting…".to_string(),
            ConnectionPhase::Connecting | ConnectionPhase::Backoff(_) => {
                format!("Reconnecting ({}/{})…", self.attempts, self.max_attempts)
            }
            ConnectionPhase::Open => "Connected".to_string(),
            ConnectionPhase::Failed => "Disconnected".to_string(),
        }
    }
}
