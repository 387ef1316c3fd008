//! Adapters - Implementations of port interfaces.
//!
//! - `http` - `reqwest` client for the bargain REST API
//! - `websocket` - room socket codec, connection manager and transport

pub mod http;
pub mod websocket;

pub use http::HttpBargainClient;
pub use websocket::{ConnectionHandle, ConnectionManager, TungsteniteTransport};
