//! Confirmation Port - explicit user consent for destructive actions.

use async_trait::async_trait;

use crate::domain::foundation::{BidId, RoomId};

/// What the user is being asked to confirm.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationRequest {
    pub room_id: RoomId,
    pub bid_id: BidId,
    pub price: f64,
    pub quantity: u32,
    /// Prompt text, e.g. "Accept this bid of ₹120.00? This will end the negotiation."
    pub prompt: String,
}

/// Asks the user to confirm accepting a bid, which ends the negotiation.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool;
}
