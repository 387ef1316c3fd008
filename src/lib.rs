//! Bargain Live - client core for live produce bargaining.
//!
//! Implements the per-room bidding protocol of the marketplace: a persistent
//! room socket with reconnects, an authoritative room state machine fed by
//! server events, role-gated bid and accept submission over REST, presence,
//! typing indicators and chat.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
