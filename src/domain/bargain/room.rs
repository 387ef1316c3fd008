//! Bargain room aggregate as held by the client.
//!
//! The client only ever holds a read-through copy of the room. Every field
//! here is populated from server payloads; the wire schema uses the server's
//! persisted names and the legacy client names are folded in during
//! deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::amount::optional_amount;
use crate::domain::foundation::{RoomId, StateMachine, Timestamp, UserId, ValidationError};

/// Whether a room is open to every seller in the area or bound to one seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    Public,
    #[default]
    Private,
}

impl fmt::Display for RoomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomMode::Public => write!(f, "public"),
            RoomMode::Private => write!(f, "private"),
        }
    }
}

/// Server-side lifecycle status of a room.
///
/// The server persists `closed` and `rejected`; both are read as `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Active,
    Accepted,
    Completed,
    #[serde(alias = "closed", alias = "rejected", alias = "canceled")]
    Cancelled,
    Expired,
}

impl RoomStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RoomStatus::Active)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RoomStatus::Active => "Active",
            RoomStatus::Accepted => "Accepted",
            RoomStatus::Completed => "Completed",
            RoomStatus::Cancelled => "Cancelled",
            RoomStatus::Expired => "Expired",
        }
    }
}

impl StateMachine for RoomStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RoomStatus::*;
        match self {
            Active => vec![Accepted, Completed, Cancelled, Expired],
            Accepted => vec![Completed],
            Completed | Cancelled | Expired => vec![],
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_lowercase())
    }
}

/// A negotiation over one product lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RoomRecord")]
pub struct BargainRoom {
    #[serde(rename = "room_id")]
    pub id: RoomId,
    #[serde(rename = "room_type")]
    pub mode: RoomMode,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
    #[serde(rename = "initial_quantity")]
    pub quantity: u32,
    #[serde(rename = "initial_bid_price")]
    pub starting_price: f64,
    #[serde(rename = "current_bid_price")]
    pub current_price: f64,
    pub status: RoomStatus,
    pub expires_at: Option<Timestamp>,
    pub location_pincode: Option<String>,
    pub buyer_id: Option<UserId>,
    /// Absent for the open seller pool of a public room.
    pub seller_id: Option<UserId>,
    pub creator_id: Option<UserId>,
    pub created_at: Option<Timestamp>,
}

impl BargainRoom {
    /// Creates a fresh active room with the given id and opening price.
    pub fn new(id: RoomId, mode: RoomMode, quantity: u32, starting_price: f64) -> Self {
        Self {
            id,
            mode,
            product_id: None,
            product_name: None,
            product_category: None,
            quantity,
            starting_price,
            current_price: starting_price,
            status: RoomStatus::Active,
            expires_at: None,
            location_pincode: None,
            buyer_id: None,
            seller_id: None,
            creator_id: None,
            created_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_participants(mut self, buyer_id: UserId, seller_id: Option<UserId>) -> Self {
        self.creator_id = Some(buyer_id.clone());
        self.buyer_id = Some(buyer_id);
        self.seller_id = seller_id;
        self
    }

    /// True when the room is still active on the server but past its expiry locally.
    pub fn is_locally_expired(&self, now: &Timestamp) -> bool {
        self.status.is_active()
            && self
                .expires_at
                .map(|expiry| !now.is_before(&expiry))
                .unwrap_or(false)
    }

    /// Server status combined with the local expiry check.
    pub fn effective_status(&self, now: &Timestamp) -> RoomStatus {
        if self.is_locally_expired(now) {
            RoomStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_buyer(&self, user_id: &UserId) -> bool {
        self.buyer_id.as_ref() == Some(user_id)
    }

    pub fn is_seller(&self, user_id: &UserId) -> bool {
        self.seller_id.as_ref() == Some(user_id)
    }
}

/// Wire shape of a room, covering every name the server and older clients use.
#[derive(Debug, Deserialize)]
struct RoomRecord {
    room_id: Option<RoomId>,
    id: Option<RoomId>,
    room_type: Option<RoomMode>,
    mode: Option<RoomMode>,
    #[serde(rename = "type")]
    kind: Option<RoomMode>,
    product_id: Option<String>,
    product_name: Option<String>,
    #[serde(alias = "category")]
    product_category: Option<String>,
    initial_quantity: Option<u32>,
    quantity: Option<u32>,
    #[serde(default, deserialize_with = "optional_amount")]
    initial_bid_price: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    starting_price: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    current_bid_price: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    current_price: Option<f64>,
    status: Option<RoomStatus>,
    bargain_status: Option<RoomStatus>,
    expires_at: Option<Timestamp>,
    expiry_time: Option<Timestamp>,
    location_pincode: Option<String>,
    location: Option<String>,
    pincode: Option<String>,
    buyer_location: Option<String>,
    buyer_id: Option<UserId>,
    seller_id: Option<UserId>,
    creator_id: Option<UserId>,
    created_at: Option<Timestamp>,
}

impl TryFrom<RoomRecord> for BargainRoom {
    type Error = ValidationError;

    fn try_from(record: RoomRecord) -> Result<Self, Self::Error> {
        let id = record
            .room_id
            .or(record.id)
            .ok_or_else(|| ValidationError::empty_field("room_id"))?;
        let starting_price = record.initial_bid_price.or(record.starting_price);
        let current_price = record.current_bid_price.or(record.current_price);
        let creator_id = record.creator_id.or_else(|| record.buyer_id.clone());

        Ok(Self {
            id,
            mode: record
                .room_type
                .or(record.mode)
                .or(record.kind)
                .unwrap_or_default(),
            product_id: record.product_id,
            product_name: record.product_name,
            product_category: record.product_category,
            quantity: record.initial_quantity.or(record.quantity).unwrap_or(0),
            starting_price: starting_price.or(current_price).unwrap_or(0.0),
            current_price: current_price.or(starting_price).unwrap_or(0.0),
            status: record
                .status
                .or(record.bargain_status)
                .unwrap_or_default(),
            expires_at: record.expires_at.or(record.expiry_time),
            location_pincode: record
                .location_pincode
                .or(record.pincode)
                .or(record.location)
                .or(record.buyer_location),
            buyer_id: record.buyer_id,
            seller_id: record.seller_id,
            creator_id,
            created_at: record.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "6a2f41a3-c54b-4a8e-8b4a-2b8a5e2d9f10";

    #[test]
    fn status_moves_forward_only() {
        assert!(RoomStatus::Active.can_transition_to(&RoomStatus::Accepted));
        assert!(RoomStatus::Accepted.can_transition_to(&RoomStatus::Completed));
        assert!(!RoomStatus::Accepted.can_transition_to(&RoomStatus::Active));
        assert!(!RoomStatus::Expired.can_transition_to(&RoomStatus::Active));
        assert!(!RoomStatus::Cancelled.can_transition_to(&RoomStatus::Accepted));
    }

    #[test]
    fn terminal_statuses_are_absorbing() {
        assert!(RoomStatus::Completed.is_terminal());
        assert!(RoomStatus::Cancelled.is_terminal());
        assert!(RoomStatus::Expired.is_terminal());
        assert!(!RoomStatus::Accepted.is_terminal());
        assert!(!RoomStatus::Active.is_terminal());
    }

    #[test]
    fn server_status_aliases_map_to_cancelled() {
        let closed: RoomStatus = serde_json::from_str("\"closed\"").unwrap();
        let rejected: RoomStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(closed, RoomStatus::Cancelled);
        assert_eq!(rejected, RoomStatus::Cancelled);
    }

    #[test]
    fn deserializes_server_schema() {
        let json = format!(
            r#"{{
                "room_id": "{ROOM}",
                "product_id": "p-1",
                "buyer_id": "buyer-1",
                "seller_id": null,
                "room_type": "public",
                "status": "active",
                "initial_quantity": 5,
                "initial_bid_price": "100.00",
                "current_bid_price": "110.00",
                "location_pincode": "560001",
                "expires_at": "2030-01-01T00:00:00+00:00",
                "created_at": "2029-12-31T00:00:00+00:00"
            }}"#
        );
        let room: BargainRoom = serde_json::from_str(&json).unwrap();

        assert_eq!(room.id.to_string(), ROOM);
        assert_eq!(room.mode, RoomMode::Public);
        assert_eq!(room.quantity, 5);
        assert_eq!(room.starting_price, 100.0);
        assert_eq!(room.current_price, 110.0);
        assert_eq!(room.location_pincode.as_deref(), Some("560001"));
        assert!(room.seller_id.is_none());
        assert_eq!(room.creator_id, room.buyer_id);
    }

    #[test]
    fn deserializes_legacy_aliases() {
        let json = format!(
            r#"{{
                "id": "{ROOM}",
                "mode": "private",
                "quantity": 3,
                "starting_price": 50,
                "location": "110001",
                "expiry_time": "2030-01-01T00:00:00",
                "bargain_status": "closed"
            }}"#
        );
        let room: BargainRoom = serde_json::from_str(&json).unwrap();

        assert_eq!(room.mode, RoomMode::Private);
        assert_eq!(room.quantity, 3);
        assert_eq!(room.starting_price, 50.0);
        assert_eq!(room.current_price, 50.0);
        assert_eq!(room.status, RoomStatus::Cancelled);
        assert_eq!(room.location_pincode.as_deref(), Some("110001"));
        assert!(room.expires_at.is_some());
    }

    #[test]
    fn missing_id_is_rejected() {
        let parsed: Result<BargainRoom, _> = serde_json::from_str(r#"{"quantity": 1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn serializes_canonical_names() {
        let room = BargainRoom::new(RoomId::new(), RoomMode::Public, 5, 100.0);
        let value = serde_json::to_value(&room).unwrap();

        assert!(value.get("room_id").is_some());
        assert_eq!(value["room_type"], "public");
        assert_eq!(value["initial_bid_price"], 100.0);
        assert_eq!(value["current_bid_price"], 100.0);
    }

    #[test]
    fn local_expiry_only_applies_to_active_rooms() {
        let now = Timestamp::now();
        let mut room = BargainRoom::new(RoomId::new(), RoomMode::Private, 1, 10.0)
            .with_expiry(now.plus_secs(-1));

        assert!(room.is_locally_expired(&now));
        assert_eq!(room.effective_status(&now), RoomStatus::Expired);

        room.status = RoomStatus::Accepted;
        assert!(!room.is_locally_expired(&now));
        assert_eq!(room.effective_status(&now), RoomStatus::Accepted);
    }

    #[test]
    fn expiry_boundary_counts_as_expired() {
        let now = Timestamp::now();
        let room = BargainRoom::new(RoomId::new(), RoomMode::Private, 1, 10.0).with_expiry(now);
        assert!(room.is_locally_expired(&now));
    }
}
