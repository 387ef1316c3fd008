//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, session, errors)
//! - `bargain` - Rooms, bids, chat, presence and the room state machine
//! - `view` - Pure projections of room state for display

pub mod bargain;
pub mod foundation;
pub mod view;
