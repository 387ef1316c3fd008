//! Room socket protocol codec.
//!
//! Frames are JSON objects tagged by `type`:
//! - Server → Client: room snapshots, bids, chat, presence, typing, errors, pongs
//! - Client → Server: backlog requests, chat, pings, typing indicators
//!
//! Decoding never fails hard. Unknown kinds and malformed payloads come back
//! as [`DecodeOutcome`] variants so the connection can log and move on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::bargain::optional_amount;
use crate::domain::bargain::{
    AcceptedDeal, Bid, ChatMessage, Participant, RoomEvent, RoomInfo, RoomStatus,
};
use crate::domain::foundation::{Role, Timestamp, UserId};

// ============================================
// Server → Client Messages
// ============================================

/// Every inbound kind the codec understands, after alias normalization.
pub const INBOUND_KINDS: &[&str] = &[
    "auth_success",
    "room_info",
    "bid_update",
    "new_bid",
    "new_message",
    "recent_activity",
    "bargain_accepted",
    "bargain_cancelled",
    "user_joined",
    "user_left",
    "active_users",
    "typing",
    "user_typing",
    "user_stopped_typing",
    "error",
    "pong",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    AuthSuccess {
        #[serde(default)]
        user_id: Option<UserId>,
    },
    RoomInfo {
        room: RoomInfo,
    },
    BidUpdate {
        #[serde(default)]
        bid: Option<Bid>,
        #[serde(default)]
        room: Option<RoomInfo>,
        #[serde(default, deserialize_with = "optional_amount")]
        current_bid_price: Option<f64>,
        #[serde(default)]
        status: Option<RoomStatus>,
    },
    NewBid {
        bid: Bid,
    },
    NewMessage {
        message: ChatMessage,
    },
    RecentActivity {
        #[serde(default)]
        bids: Vec<Bid>,
        #[serde(default)]
        messages: Vec<ChatMessage>,
    },
    BargainAccepted(AcceptedDeal),
    BargainCancelled {
        #[serde(default, alias = "message")]
        reason: Option<String>,
    },
    UserJoined {
        user_id: UserId,
        #[serde(default)]
        user_name: Option<String>,
        #[serde(default)]
        user_type: Option<Role>,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    UserLeft {
        user_id: UserId,
    },
    ActiveUsers {
        #[serde(default)]
        users: Vec<UserRef>,
    },
    Typing {
        user_id: UserId,
        #[serde(default)]
        user_name: Option<String>,
        #[serde(default)]
        is_typing: bool,
    },
    UserTyping {
        user_id: UserId,
        #[serde(default)]
        user_name: Option<String>,
    },
    UserStoppedTyping {
        user_id: UserId,
    },
    Error {
        #[serde(default, alias = "detail")]
        message: String,
    },
    Pong {
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
}

/// Presence snapshots list either bare ids or participant objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum UserRef {
    Id(UserId),
    Participant(Participant),
}

impl From<UserRef> for Participant {
    fn from(user: UserRef) -> Self {
        match user {
            UserRef::Id(id) => Participant::new(id),
            UserRef::Participant(p) => p,
        }
    }
}

impl From<ServerFrame> for RoomEvent {
    fn from(frame: ServerFrame) -> Self {
        match frame {
            ServerFrame::AuthSuccess { user_id } => RoomEvent::AuthSuccess { user_id },
            ServerFrame::RoomInfo { room } => RoomEvent::RoomInfo(room),
            ServerFrame::BidUpdate {
                bid,
                room,
                current_bid_price,
                status,
            } => {
                let mut info = room.unwrap_or_default();
                if current_bid_price.is_some() {
                    info.current_price = current_bid_price;
                }
                if status.is_some() {
                    info.status = status;
                }
                RoomEvent::BidUpdate { bid, info }
            }
            ServerFrame::NewBid { bid } => RoomEvent::NewBid(bid),
            ServerFrame::NewMessage { message } => RoomEvent::NewMessage(message),
            ServerFrame::RecentActivity { bids, messages } => {
                RoomEvent::RecentActivity { bids, messages }
            }
            ServerFrame::BargainAccepted(deal) => RoomEvent::BargainAccepted(deal),
            ServerFrame::BargainCancelled { reason } => RoomEvent::BargainCancelled { reason },
            ServerFrame::UserJoined {
                user_id,
                user_name,
                user_type,
                timestamp,
            } => RoomEvent::UserJoined(Participant {
                user_id,
                name: user_name,
                role: user_type,
                joined_at: timestamp,
            }),
            ServerFrame::UserLeft { user_id } => RoomEvent::UserLeft { user_id },
            ServerFrame::ActiveUsers { users } => {
                RoomEvent::ActiveUsers(users.into_iter().map(Participant::from).collect())
            }
            ServerFrame::Typing {
                user_id,
                user_name,
                is_typing,
            } => RoomEvent::Typing {
                user_id,
                name: user_name,
                is_typing,
            },
            ServerFrame::UserTyping { user_id, user_name } => RoomEvent::Typing {
                user_id,
                name: user_name,
                is_typing: true,
            },
            ServerFrame::UserStoppedTyping { user_id } => RoomEvent::Typing {
                user_id,
                name: None,
                is_typing: false,
            },
            ServerFrame::Error { message } => RoomEvent::ServerError { message },
            ServerFrame::Pong { timestamp } => RoomEvent::Pong { at: timestamp },
        }
    }
}

/// Result of decoding one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Event(RoomEvent),
    /// Well-formed frame of a kind this client does not handle.
    Unknown(String),
    /// Not JSON, no `type`, or a payload that does not match its kind.
    Malformed(String),
}

/// Maps legacy kind names onto the canonical ones.
fn canonical_kind(kind: &str) -> &str {
    match kind {
        "chat_message" => "new_message",
        "online_users" => "active_users",
        other => other,
    }
}

/// Decodes one inbound text frame.
pub fn decode(text: &str) -> DecodeOutcome {
    let mut value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return DecodeOutcome::Malformed(format!("invalid JSON: {}", e)),
    };

    let kind = match value.get("type").and_then(Value::as_str) {
        Some(kind) => canonical_kind(kind).to_string(),
        None => return DecodeOutcome::Malformed("missing message type".to_string()),
    };
    if !INBOUND_KINDS.contains(&kind.as_str()) {
        return DecodeOutcome::Unknown(kind);
    }
    if let Some(obj) = value.as_object_mut() {
        obj.insert("type".to_string(), Value::String(kind.clone()));
    }

    match serde_json::from_value::<ServerFrame>(value) {
        Ok(frame) => DecodeOutcome::Event(frame.into()),
        Err(e) => DecodeOutcome::Malformed(format!("{}: {}", kind, e)),
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Ask for the bid and chat backlog.
    GetRecentActivity,
    ChatMessage { content: String },
    /// Keep-alive.
    Ping,
    /// Typing indicator in the form the bargain server relays.
    Typing { is_typing: bool },
    UserTyping,
    UserStoppedTyping,
}

impl ClientFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientFrame::GetRecentActivity => "get_recent_activity",
            ClientFrame::ChatMessage { .. } => "chat_message",
            ClientFrame::Ping => "ping",
            ClientFrame::Typing { .. } => "typing",
            ClientFrame::UserTyping => "user_typing",
            ClientFrame::UserStoppedTyping => "user_stopped_typing",
        }
    }
}

/// Encodes an outbound frame as JSON text.
pub fn encode(frame: &ClientFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> RoomEvent {
        match decode(text) {
            DecodeOutcome::Event(event) => event,
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn decodes_new_bid_from_server() {
        let e = event(
            r#"{"type": "new_bid", "bid": {
                "bid_id": "0b0f8a4e-8d0a-4a53-9b3e-3e9f7a0f2c11",
                "user_type": "buyer", "bid_price": 120.0, "quantity": 5,
                "message": "Fresh stock?", "is_counter_offer": false,
                "created_at": "2030-01-01T10:00:00+00:00"}}"#,
        );
        match e {
            RoomEvent::NewBid(bid) => {
                assert_eq!(bid.price, 120.0);
                assert_eq!(bid.message.as_deref(), Some("Fresh stock?"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn decodes_room_info() {
        let e = event(
            r#"{"type": "room_info", "room": {
                "room_id": "6a2f41a3-c54b-4a8e-8b4a-2b8a5e2d9f10",
                "room_type": "public", "status": "closed",
                "current_bid_price": 99.5, "quantity": 10}}"#,
        );
        match e {
            RoomEvent::RoomInfo(info) => {
                assert_eq!(info.status, Some(RoomStatus::Cancelled));
                assert_eq!(info.current_price, Some(99.5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn legacy_chat_message_maps_to_new_message() {
        let e = event(
            r#"{"type": "chat_message", "message": {
                "message_id": "3c1d4f7e-2a3b-4c5d-8e9f-0a1b2c3d4e5f",
                "user_id": "u-2", "content": "hello",
                "created_at": "2030-01-01T10:00:00.123456"}}"#,
        );
        assert_eq!(e.kind(), "new_message");
    }

    #[test]
    fn online_users_accepts_ids_and_objects() {
        let e = event(
            r#"{"type": "online_users", "users": ["u-1", {"id": "u-2", "name": "Asha"}]}"#,
        );
        match e {
            RoomEvent::ActiveUsers(users) => {
                assert_eq!(users.len(), 2);
                assert_eq!(users[1].name.as_deref(), Some("Asha"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn typing_variants_normalize() {
        let started = event(r#"{"type": "user_typing", "user_id": "u-1", "user_name": "Asha"}"#);
        let stopped = event(r#"{"type": "user_stopped_typing", "user_id": "u-1"}"#);
        let relayed = event(r#"{"type": "typing", "user_id": "u-1", "is_typing": true}"#);

        assert!(matches!(started, RoomEvent::Typing { is_typing: true, .. }));
        assert!(matches!(stopped, RoomEvent::Typing { is_typing: false, .. }));
        assert!(matches!(relayed, RoomEvent::Typing { is_typing: true, .. }));
    }

    #[test]
    fn user_joined_reads_naive_timestamp() {
        let e = event(r#"{"type": "user_joined", "user_id": "u-5", "timestamp": "2030-01-01T10:00:00.5"}"#);
        match e {
            RoomEvent::UserJoined(p) => assert!(p.joined_at.is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bid_update_merges_flat_fields() {
        let e = event(r#"{"type": "bid_update", "current_bid_price": "130.00", "status": "active"}"#);
        match e {
            RoomEvent::BidUpdate { bid, info } => {
                assert!(bid.is_none());
                assert_eq!(info.current_price, Some(130.0));
                assert_eq!(info.status, Some(RoomStatus::Active));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn accepted_and_error_and_pong() {
        assert!(matches!(
            event(r#"{"type": "bargain_accepted", "accepted_bid_id": "0b0f8a4e-8d0a-4a53-9b3e-3e9f7a0f2c11", "final_price": 120.0, "quantity": 5}"#),
            RoomEvent::BargainAccepted(_)
        ));
        assert_eq!(
            event(r#"{"type": "error", "message": "Invalid token"}"#),
            RoomEvent::ServerError { message: "Invalid token".to_string() }
        );
        assert!(matches!(
            event(r#"{"type": "pong", "timestamp": "2030-01-01T10:00:00"}"#),
            RoomEvent::Pong { at: Some(_) }
        ));
    }

    #[test]
    fn unknown_kind_is_reported_not_fatal() {
        assert_eq!(
            decode(r#"{"type": "price_drop", "amount": 3}"#),
            DecodeOutcome::Unknown("price_drop".to_string())
        );
    }

    #[test]
    fn malformed_frames_are_reported() {
        assert!(matches!(decode("not json"), DecodeOutcome::Malformed(_)));
        assert!(matches!(decode(r#"{"bid": {}}"#), DecodeOutcome::Malformed(_)));
        assert!(matches!(
            decode(r#"{"type": "new_bid", "bid": {"bid_price": 1}}"#),
            DecodeOutcome::Malformed(_)
        ));
    }

    #[test]
    fn encodes_outbound_frames() {
        assert_eq!(
            encode(&ClientFrame::GetRecentActivity).unwrap(),
            r#"{"type":"get_recent_activity"}"#
        );
        assert_eq!(encode(&ClientFrame::Ping).unwrap(), r#"{"type":"ping"}"#);
        assert_eq!(
            encode(&ClientFrame::ChatMessage { content: "hi".to_string() }).unwrap(),
            r#"{"type":"chat_message","content":"hi"}"#
        );
        assert_eq!(
            encode(&ClientFrame::Typing { is_typing: true }).unwrap(),
            r#"{"type":"typing","is_typing":true}"#
        );
        assert_eq!(ClientFrame::UserStoppedTyping.kind(), "user_stopped_typing");
    }
}
