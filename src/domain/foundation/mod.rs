//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, session context, the state machine trait
//! and error types that form the vocabulary of the bargaining domain.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{Role, Session};
pub use errors::{ErrorCode, ValidationError};
pub use ids::{BidId, MessageId, RoomId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
