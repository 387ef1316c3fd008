//! Room Transport Port - Framed, bidirectional connection to a live room.
//!
//! The connection manager owns reconnect policy; a transport only knows how
//! to open one connection and move text frames over it.

use async_trait::async_trait;
use thiserror::Error;

/// Frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Peer closed the connection. `code` is the close code, when one was sent.
    Close { code: Option<u16> },
}

/// Opens connections to room endpoints.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameChannel>, TransportError>;
}

/// One open connection.
#[async_trait]
pub trait FrameChannel: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Next frame; `None` once the stream has ended.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;

    /// Clean close with code 1000.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("connection closed")]
    Closed,

    #[error("transport error: {0}")]
    Io(String),
}
