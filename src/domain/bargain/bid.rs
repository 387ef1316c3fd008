//! Bids placed in a bargain room.

use serde::{Deserialize, Serialize};

use super::amount::optional_amount;
use crate::domain::foundation::{BidId, Role, RoomId, Timestamp, UserId, ValidationError};

/// A single offer within a room.
///
/// Bids are totally ordered by `created_at` within a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BidRecord")]
pub struct Bid {
    #[serde(rename = "bid_id")]
    pub id: BidId,
    pub room_id: Option<RoomId>,
    /// Socket frames omit the bidder id; only the role is always present.
    #[serde(rename = "user_id")]
    pub bidder_id: Option<UserId>,
    #[serde(rename = "user_type")]
    pub role: Role,
    #[serde(rename = "bid_price")]
    pub price: f64,
    pub quantity: u32,
    pub message: Option<String>,
    pub is_counter_offer: bool,
    pub created_at: Timestamp,
}

impl Bid {
    pub fn new(role: Role, price: f64, quantity: u32, created_at: Timestamp) -> Self {
        Self {
            id: BidId::new(),
            room_id: None,
            bidder_id: None,
            role,
            price,
            quantity,
            message: None,
            is_counter_offer: false,
            created_at,
        }
    }

    pub fn with_bidder(mut self, bidder_id: UserId) -> Self {
        self.bidder_id = Some(bidder_id);
        self
    }

    pub fn with_id(mut self, id: BidId) -> Self {
        self.id = id;
        self
    }
}

#[derive(Debug, Deserialize)]
struct BidRecord {
    bid_id: Option<BidId>,
    id: Option<BidId>,
    room_id: Option<RoomId>,
    user_id: Option<UserId>,
    bidder_id: Option<UserId>,
    user_type: Option<Role>,
    role: Option<Role>,
    #[serde(default, deserialize_with = "optional_amount")]
    bid_price: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    price: Option<f64>,
    quantity: Option<u32>,
    message: Option<String>,
    #[serde(default)]
    is_counter_offer: bool,
    created_at: Option<Timestamp>,
}

impl TryFrom<BidRecord> for Bid {
    type Error = ValidationError;

    fn try_from(record: BidRecord) -> Result<Self, Self::Error> {
        let id = record
            .bid_id
            .or(record.id)
            .ok_or_else(|| ValidationError::empty_field("bid_id"))?;
        let role = record
            .user_type
            .or(record.role)
            .ok_or_else(|| ValidationError::empty_field("user_type"))?;
        let price = record
            .bid_price
            .or(record.price)
            .ok_or_else(|| ValidationError::empty_field("bid_price"))?;

        Ok(Self {
            id,
            room_id: record.room_id,
            bidder_id: record.user_id.or(record.bidder_id),
            role,
            price,
            quantity: record.quantity.unwrap_or(0),
            message: record.message.filter(|m| !m.trim().is_empty()),
            is_counter_offer: record.is_counter_offer,
            created_at: record.created_at.unwrap_or_default(),
        })
    }
}
