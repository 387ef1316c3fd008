//! Events that drive the room state machine.
//!
//! These are the decoded form of inbound socket frames plus the synthetic
//! events raised by the connection manager.

use serde::{Deserialize, Serialize};

use super::amount::optional_amount;
use super::{Bid, ChatMessage, Participant, RoomMode, RoomStatus};
use crate::domain::foundation::{BidId, Timestamp, UserId};

/// Partial room snapshot carried by `room_info` and `bid_update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    #[serde(default, alias = "room_type")]
    pub mode: Option<RoomMode>,
    #[serde(default, alias = "bargain_status")]
    pub status: Option<RoomStatus>,
    #[serde(
        default,
        alias = "current_bid_price",
        deserialize_with = "optional_amount"
    )]
    pub current_price: Option<f64>,
    #[serde(default, alias = "initial_quantity")]
    pub quantity: Option<u32>,
}

/// Outcome recorded when a bid is accepted and the negotiation ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedDeal {
    #[serde(default, alias = "bid_id")]
    pub accepted_bid_id: Option<BidId>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub final_price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// Synthetic: the socket opened or closed.
    ConnectionStatus { connected: bool },
    /// Synthetic: opaque transport failure.
    ConnectionError { message: String },
    AuthSuccess { user_id: Option<UserId> },
    RoomInfo(RoomInfo),
    BidUpdate { bid: Option<Bid>, info: RoomInfo },
    NewBid(Bid),
    NewMessage(ChatMessage),
    RecentActivity {
        bids: Vec<Bid>,
        messages: Vec<ChatMessage>,
    },
    BargainAccepted(AcceptedDeal),
    BargainCancelled { reason: Option<String> },
    UserJoined(Participant),
    UserLeft { user_id: UserId },
    ActiveUsers(Vec<Participant>),
    Typing {
        user_id: UserId,
        name: Option<String>,
        is_typing: bool,
    },
    ServerError { message: String },
    Pong { at: Option<Timestamp> },
}

impl RoomEvent {
    /// Wire name of the event, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::ConnectionStatus { .. } => "connection_status",
            RoomEvent::ConnectionError { .. } => "connection_error",
            RoomEvent::AuthSuccess { .. } => "auth_success",
            RoomEvent::RoomInfo(_) => "room_info",
            RoomEvent::BidUpdate { .. } => "bid_update",
            RoomEvent::NewBid(_) => "new_bid",
            RoomEvent::NewMessage(_) => "new_message",
            RoomEvent::RecentActivity { .. } => "recent_activity",
            RoomEvent::BargainAccepted(_) => "bargain_accepted",
            RoomEvent::BargainCancelled { .. } => "bargain_cancelled",
            RoomEvent::UserJoined(_) => "user_joined",
            RoomEvent::UserLeft { .. } => "user_left",
            RoomEvent::ActiveUsers(_) => "active_users",
            RoomEvent::Typing { .. } => "typing",
            RoomEvent::ServerError { .. } => "error",
            RoomEvent::Pong { .. } => "pong",
        }
    }

    /// True for events that carry a price the server pushed.
    pub fn carries_price(&self) -> bool {
        match self {
            RoomEvent::NewBid(_) => true,
            RoomEvent::BidUpdate { bid, info } => bid.is_some() || info.current_price.is_some(),
            RoomEvent::RoomInfo(info) => info.current_price.is_some(),
            _ => false,
        }
    }
}
