//! Chat messages exchanged inside a room.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Role, RoomId, StateMachine, Timestamp, UserId, ValidationError};

/// Client-local delivery state. Never sent to or read from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    #[default]
    Delivered,
    Read,
}

impl StateMachine for DeliveryStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        target > self
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            DeliveryStatus::Sent => vec![DeliveryStatus::Delivered, DeliveryStatus::Read],
            DeliveryStatus::Delivered => vec![DeliveryStatus::Read],
            DeliveryStatus::Read => vec![],
        }
    }
}

/// Append-only chat entry. Only `delivery` ever changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord")]
pub struct ChatMessage {
    #[serde(rename = "message_id")]
    pub id: MessageId,
    pub room_id: Option<RoomId>,
    #[serde(rename = "user_id")]
    pub sender_id: UserId,
    #[serde(rename = "user_type")]
    pub sender_role: Option<Role>,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(skip_serializing)]
    pub delivery: DeliveryStatus,
}

impl ChatMessage {
    pub fn new(sender_id: UserId, content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id: MessageId::new(),
            room_id: None,
            sender_id,
            sender_role: None,
            content: content.into(),
            created_at,
            delivery: DeliveryStatus::Delivered,
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    /// Advances delivery state; backwards moves are ignored.
    pub fn advance_delivery(&mut self, target: DeliveryStatus) -> bool {
        match self.delivery.transition_to(target) {
            Ok(next) => {
                self.delivery = next;
                true
            }
            Err(_) => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    message_id: Option<MessageId>,
    id: Option<MessageId>,
    room_id: Option<RoomId>,
    user_id: Option<UserId>,
    sender_id: Option<UserId>,
    user_type: Option<Role>,
    sender_role: Option<Role>,
    #[serde(alias = "message")]
    content: String,
    #[serde(alias = "timestamp")]
    created_at: Option<Timestamp>,
}

impl TryFrom<MessageRecord> for ChatMessage {
    type Error = ValidationError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let id = record
            .message_id
            .or(record.id)
            .ok_or_else(|| ValidationError::empty_field("message_id"))?;
        let sender_id = record
            .user_id
            .or(record.sender_id)
            .ok_or_else(|| ValidationError::empty_field("user_id"))?;

        Ok(Self {
            id,
            room_id: record.room_id,
            sender_id,
            sender_role: record.user_type.or(record.sender_role),
            content: record.content,
            created_at: record.created_at.unwrap_or_default(),
            delivery: DeliveryStatus::Delivered,
        })
    }
}
