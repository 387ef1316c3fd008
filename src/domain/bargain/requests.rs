//! Outbound request payloads with local validation.
//!
//! Validation here mirrors what the server enforces so that statically
//! checkable mistakes never cost a round trip. The server stays the final
//! authority.

use serde::Serialize;

use super::{RoomMode, RoomStatus};
use crate::domain::foundation::{UserId, ValidationError};

pub const MAX_BID_MESSAGE_CHARS: usize = 500;
pub const MAX_CHAT_CHARS: usize = 1_000;
pub const MIN_EXPIRY_HOURS: u32 = 1;
pub const MAX_EXPIRY_HOURS: u32 = 168;
pub const DEFAULT_EXPIRY_HOURS: u32 = 24;
pub const MAX_PAGE_SIZE: u32 = 100;

fn ensure_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::not_positive(field, value))
    }
}

/// Body of `POST /bargain/{public|private}/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRoomRequest {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<UserId>,
    #[serde(rename = "room_type")]
    pub mode: RoomMode,
    pub quantity: u32,
    #[serde(rename = "initial_bid_price")]
    pub starting_price: f64,
    pub location_pincode: String,
    pub expires_in_hours: u32,
}

impl CreateRoomRequest {
    pub fn public(product_id: impl Into<String>, quantity: u32, starting_price: f64, pincode: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            seller_id: None,
            mode: RoomMode::Public,
            quantity,
            starting_price,
            location_pincode: pincode.into(),
            expires_in_hours: DEFAULT_EXPIRY_HOURS,
        }
    }

    pub fn private(
        product_id: impl Into<String>,
        seller_id: UserId,
        quantity: u32,
        starting_price: f64,
        pincode: impl Into<String>,
    ) -> Self {
        Self {
            seller_id: Some(seller_id),
            mode: RoomMode::Private,
            ..Self::public(product_id, quantity, starting_price, pincode)
        }
    }

    pub fn expiring_in(mut self, hours: u32) -> Self {
        self.expires_in_hours = hours;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_id.trim().is_empty() {
            return Err(ValidationError::empty_field("product_id"));
        }
        if self.quantity == 0 {
            return Err(ValidationError::not_positive("quantity", 0.0));
        }
        ensure_positive("initial_bid_price", self.starting_price)?;

        let pincode = self.location_pincode.trim();
        if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                "location_pincode",
                "Pincode must be 6 digits",
            ));
        }
        if !(MIN_EXPIRY_HOURS..=MAX_EXPIRY_HOURS).contains(&self.expires_in_hours) {
            return Err(ValidationError::out_of_range(
                "expires_in_hours",
                MIN_EXPIRY_HOURS as i64,
                MAX_EXPIRY_HOURS as i64,
                self.expires_in_hours as i64,
            ));
        }
        if self.mode == RoomMode::Private && self.seller_id.is_none() {
            return Err(ValidationError::empty_field("seller_id"));
        }
        Ok(())
    }
}

/// A bid the local user intends to place.
///
/// Serves as the body of both `POST /bargain/{room}/bid` and
/// `POST /bargain/public/{room}/respond`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidDraft {
    #[serde(rename = "bid_price")]
    pub price: f64,
    pub quantity: u32,
    pub message: Option<String>,
    pub is_counter_offer: bool,
}

impl BidDraft {
    pub fn new(price: f64, quantity: u32) -> Self {
        Self {
            price,
            quantity,
            message: None,
            is_counter_offer: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = if message.trim().is_empty() {
            None
        } else {
            Some(message)
        };
        self
    }

    pub fn counter_offer(mut self) -> Self {
        self.is_counter_offer = true;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_positive("bid_price", self.price)?;
        if self.quantity == 0 {
            return Err(ValidationError::not_positive("quantity", 0.0));
        }
        if let Some(message) = &self.message {
            let len = message.chars().count();
            if len > MAX_BID_MESSAGE_CHARS {
                return Err(ValidationError::out_of_range(
                    "message",
                    0,
                    MAX_BID_MESSAGE_CHARS as i64,
                    len as i64,
                ));
            }
        }
        Ok(())
    }
}

/// Body of `POST /bargain/{room}/accept`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptRequest {
    pub bid_id: crate::domain::foundation::BidId,
}

/// Validated chat text, trimmed, 1 to 1000 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChatContent(String);

impl ChatContent {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        let len = trimmed.chars().count();
        if len > MAX_CHAT_CHARS {
            return Err(ValidationError::out_of_range(
                "content",
                1,
                MAX_CHAT_CHARS as i64,
                len as i64,
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Body of `POST /bargain/{room}/chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub content: ChatContent,
    pub message_type: &'static str,
}

impl ChatRequest {
    pub fn text(content: ChatContent) -> Self {
        Self {
            content,
            message_type: "text",
        }
    }
}

/// Query for `GET /bargain/public/available`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AvailableQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_pincode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub page: Page,
}

/// Query for `GET /bargain/my-bargains`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MyBargainsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<RoomMode>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "status_filter"
    )]
    pub status: Option<RoomStatus>,
    #[serde(flatten)]
    pub page: Page,
}

/// The list filter only understands the persisted status names.
fn status_filter<S>(status: &Option<RoomStatus>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match status {
        Some(RoomStatus::Cancelled) => serializer.serialize_str("closed"),
        Some(other) => serializer.serialize_str(&other.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Offset pagination shared by the list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 20 }
    }
}

impl Page {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            return Err(ValidationError::out_of_range(
                "limit",
                1,
                MAX_PAGE_SIZE as i64,
                self.limit as i64,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_six_digit_pincode() {
        let bad = CreateRoomRequest::public("p-1", 5, 100.0, "5600");
        let err = bad.validate().unwrap_err();
        assert_eq!(err.field(), "location_pincode");

        let good = CreateRoomRequest::public("p-1", 5, 100.0, "560001");
        assert!(good.validate().is_ok());
    }

    #[test]
    fn create_request_bounds_expiry() {
        let zero = CreateRoomRequest::public("p-1", 5, 100.0, "560001").expiring_in(0);
        let week = CreateRoomRequest::public("p-1", 5, 100.0, "560001").expiring_in(168);
        let too_long = CreateRoomRequest::public("p-1", 5, 100.0, "560001").expiring_in(169);

        assert!(zero.validate().is_err());
        assert!(week.validate().is_ok());
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn create_request_rejects_non_positive_amounts() {
        assert!(CreateRoomRequest::public("p-1", 0, 100.0, "560001").validate().is_err());
        assert!(CreateRoomRequest::public("p-1", 1, 0.0, "560001").validate().is_err());
        assert!(CreateRoomRequest::public("p-1", 1, f64::NAN, "560001").validate().is_err());
    }

    #[test]
    fn private_room_needs_a_seller() {
        let mut request = CreateRoomRequest::private("p-1", UserId::new("s-1").unwrap(), 1, 10.0, "560001");
        assert!(request.validate().is_ok());

        request.seller_id = None;
        assert_eq!(request.validate().unwrap_err().field(), "seller_id");
    }

    #[test]
    fn create_request_serializes_server_names() {
        let request = CreateRoomRequest::public("p-1", 5, 100.0, "560001");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["room_type"], "public");
        assert_eq!(value["initial_bid_price"], 100.0);
        assert!(value.get("seller_id").is_none());
    }

    #[test]
    fn bid_draft_validation() {
        assert!(BidDraft::new(120.0, 5).validate().is_ok());
        assert!(BidDraft::new(-1.0, 5).validate().is_err());
        assert!(BidDraft::new(120.0, 0).validate().is_err());

        let long = BidDraft::new(120.0, 5).with_message("x".repeat(501));
        assert_eq!(long.validate().unwrap_err().field(), "message");
    }

    #[test]
    fn blank_bid_message_is_dropped() {
        let draft = BidDraft::new(120.0, 5).with_message("   ");
        assert!(draft.message.is_none());
    }

    #[test]
    fn chat_content_is_trimmed_and_bounded() {
        assert_eq!(ChatContent::new("  hi  ").unwrap().as_str(), "hi");
        assert!(ChatContent::new("   ").is_err());
        assert!(ChatContent::new(&"y".repeat(1_001)).is_err());
    }

    #[test]
    fn queries_flatten_pagination() {
        let query = MyBargainsQuery {
            status: Some(RoomStatus::Active),
            ..MyBargainsQuery::default()
        };
        let value = serde_json::to_value(&query).unwrap();

        assert_eq!(value["status"], "active");
        assert_eq!(value["limit"], 20);
        assert!(value.get("room_type").is_none());
    }

    #[test]
    fn cancelled_filter_uses_persisted_name() {
        let query = MyBargainsQuery {
            status: Some(RoomStatus::Cancelled),
            ..MyBargainsQuery::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["status"], "closed");
    }

    #[test]
    fn page_limit_is_bounded() {
        assert!(Page { skip: 0, limit: 0 }.validate().is_err());
        assert!(Page { skip: 0, limit: 101 }.validate().is_err());
        assert!(Page::default().validate().is_ok());
    }
}
