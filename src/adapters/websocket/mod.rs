//! Live room socket: protocol codec, connection manager and transport.

pub mod codec;
mod connection;
mod tungstenite_transport;

pub use codec::{decode, encode, ClientFrame, DecodeOutcome};
pub use connection::{room_ws_url, ConnectionHandle, ConnectionManager, FrameSender};
pub use tungstenite_transport::TungsteniteTransport;
