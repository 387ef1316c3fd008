//! Bargain API Port - Request/response contract of the bargain REST service.
//!
//! The live socket only pushes events; every mutation (create, bid, accept,
//! chat fallback) goes through this port. Implementations must surface the
//! server's `detail` text verbatim in [`BargainApiError::Status`].

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::bargain::{
    optional_amount, AcceptedDeal, AvailableQuery, BargainRoom, Bid, BidDraft, ChatMessage,
    ChatRequest, CreateRoomRequest, MyBargainsQuery,
};
use crate::domain::foundation::{BidId, Role, RoomId, Timestamp, UserId};

#[async_trait]
pub trait BargainApi: Send + Sync {
    /// `POST /bargain/{public|private}/create`.
    async fn create_room(&self, request: &CreateRoomRequest) -> Result<BargainRoom, BargainApiError>;

    /// `GET /bargain/public/available`.
    async fn list_available(&self, query: &AvailableQuery) -> Result<Vec<PublicBargain>, BargainApiError>;

    /// `GET /bargain/my-bargains`.
    async fn my_bargains(&self, query: &MyBargainsQuery) -> Result<Vec<BargainRoom>, BargainApiError>;

    /// `GET /bargain/{room}`.
    async fn get_room(&self, room_id: &RoomId) -> Result<RoomDetail, BargainApiError>;

    /// `POST /bargain/{room}/bid`.
    async fn place_bid(&self, room_id: &RoomId, draft: &BidDraft) -> Result<Bid, BargainApiError>;

    /// `POST /bargain/public/{room}/respond`.
    async fn respond_public(&self, room_id: &RoomId, draft: &BidDraft) -> Result<Bid, BargainApiError>;

    /// `POST /bargain/{room}/accept`.
    async fn accept_bid(&self, room_id: &RoomId, bid_id: &BidId) -> Result<AcceptedDeal, BargainApiError>;

    /// `GET /bargain/{room}/history`.
    async fn history(&self, room_id: &RoomId) -> Result<Vec<HistoryEntry>, BargainApiError>;

    /// `GET /bargain/{room}/chat`.
    async fn chat(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, BargainApiError>;

    /// `POST /bargain/{room}/chat`.
    async fn post_chat(&self, room_id: &RoomId, request: &ChatRequest) -> Result<(), BargainApiError>;
}

/// Errors from the bargain REST service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BargainApiError {
    /// Connection refused, reset, DNS failure.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status with the server's `detail` message.
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl BargainApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BargainApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Timeouts, connection failures and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            BargainApiError::Network(_) | BargainApiError::Timeout => true,
            BargainApiError::Status { status, .. } => *status >= 500,
            BargainApiError::Decode(_) => false,
        }
    }
}

/// Room detail with the most recent bids and messages, newest first as served.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: BargainRoom,
    #[serde(default, deserialize_with = "optional_amount")]
    pub product_price: Option<f64>,
    #[serde(default)]
    pub recent_bids: Vec<Bid>,
    #[serde(default)]
    pub recent_messages: Vec<ChatMessage>,
}

/// Entry of the seller-facing public bargain listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicBargain {
    #[serde(flatten)]
    pub room: BargainRoom,
    /// Catalog price of the product, for comparison with the bid.
    #[serde(default, deserialize_with = "optional_amount")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub total_seller_responses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Bid,
    Response,
    Accept,
    Reject,
    #[serde(other)]
    Other,
}

/// One row of the negotiation history endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    #[serde(default, deserialize_with = "optional_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub previous_amount: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_role: Option<Role>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_listing_reads_flattened_room() {
        let json = r#"{
            "room_id": "6a2f41a3-c54b-4a8e-8b4a-2b8a5e2d9f10",
            "product_id": "p-1",
            "product_name": "Onions",
            "product_category": "vegetables",
            "original_price": "40.00",
            "buyer_id": "buyer-1",
            "buyer_location": "560001",
            "quantity": 200,
            "current_bid_price": "32.50",
            "expires_at": null,
            "created_at": "2030-01-01T00:00:00+00:00",
            "total_seller_responses": 3
        }"#;
        let listing: PublicBargain = serde_json::from_str(json).unwrap();

        assert_eq!(listing.room.quantity, 200);
        assert_eq!(listing.room.current_price, 32.5);
        assert_eq!(listing.room.location_pincode.as_deref(), Some("560001"));
        assert_eq!(listing.original_price, Some(40.0));
        assert_eq!(listing.total_seller_responses, 3);
    }

    #[test]
    fn history_entry_tolerates_unknown_kinds() {
        let json = r#"{"type": "counter", "amount": 10, "user_role": "seller"}"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.kind, HistoryKind::Other);
        assert_eq!(entry.amount, Some(10.0));
    }

    #[test]
    fn status_accessor() {
        let err = BargainApiError::Status {
            status: 403,
            detail: "You are not a participant in this bargain".to_string(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(BargainApiError::Timeout.status(), None);
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        let server_error = BargainApiError::Status {
            status: 502,
            detail: "Bad Gateway".to_string(),
        };
        let rejected = BargainApiError::Status {
            status: 400,
            detail: "Bid price must be positive".to_string(),
        };

        assert!(server_error.is_retryable());
        assert!(BargainApiError::Timeout.is_retryable());
        assert!(!rejected.is_retryable());
        assert!(!BargainApiError::Decode("eof".to_string()).is_retryable());
    }
}
