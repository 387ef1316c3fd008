//! Application layer - room sessions, bargain actions and room listings.
//!
//! Orchestrates the domain rules with the bargain API and the live socket.

pub mod negotiation;
pub mod room_directory;
pub mod room_session;

pub use negotiation::{ChatRoute, NegotiationEngine, NegotiationError};
pub use room_directory::RoomDirectory;
pub use room_session::{RoomSession, TYPING_IDLE};
