use serde::Serialize;

use super::format::{format_currency, format_relative_time, format_time_remaining};
use crate::domain::bargain::negotiation::{check_accept, check_bid};
use crate::domain::bargain::{
    ConnectionState, DeliveryStatus, PricePolicy, RoomMode, RoomPhase, RoomState,
};
use crate::domain::foundation::{BidId, MessageId, Role, RoomId, Session, Timestamp};

/// View-ready snapshot of one room, recomputed on every render tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_id: RoomId,
    pub mode: RoomMode,
    pub product_name: Option<String>,
    pub phase: RoomPhase,
    pub status_label: &'static str,
    pub current_price: f64,
    pub current_price_label: String,
    pub starting_price_label: String,
    pub quantity: u32,
    /// `None` when the room has no expiry.
    pub time_remaining: Option<String>,
    /// Newest first.
    pub bids: Vec<BidView>,
    pub messages: Vec<MessageView>,
    pub can_bid: bool,
    pub connection_label: String,
    pub online_count: usize,
    pub typing_line: Option<String>,
    pub accepted_price_label: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidView {
    pub bid_id: BidId,
    pub role: Role,
    pub price_label: String,
    pub quantity: u32,
    pub message: Option<String>,
    pub is_counter_offer: bool,
    pub is_own: bool,
    pub can_accept: bool,
    pub is_accepted: bool,
    pub placed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub message_id: MessageId,
    pub sender: String,
    pub content: String,
    pub is_own: bool,
    pub delivery: DeliveryStatus,
    pub sent: String,
}

impl RoomView {
    pub fn project(
        state: &RoomState,
        session: &Session,
        connection: &ConnectionState,
        now: &Timestamp,
    ) -> Self {
        let room = &state.room;
        let phase = state.phase(now);
        let accepted_id = state.accepted.as_ref().and_then(|d| d.accepted_bid_id);

        let bids = state
            .bids
            .iter()
            .rev()
            .map(|bid| BidView {
                bid_id: bid.id,
                role: bid.role,
                price_label: format_currency(bid.price),
                quantity: bid.quantity,
                message: bid.message.clone(),
                is_counter_offer: bid.is_counter_offer,
                is_own: match &bid.bidder_id {
                    Some(bidder) => bidder == &session.user_id,
                    None => bid.role == session.role,
                },
                can_accept: check_accept(state, session, &bid.id, now).is_ok(),
                is_accepted: accepted_id == Some(bid.id),
                placed: format_relative_time(&bid.created_at, now),
            })
            .collect();

        let messages = state
            .messages
            .iter()
            .map(|m| MessageView {
                message_id: m.id,
                sender: state
                    .presence
                    .get(&m.sender_id)
                    .and_then(|p| p.name.clone())
                    .unwrap_or_else(|| m.sender_id.to_string()),
                content: m.content.clone(),
                is_own: m.sender_id == session.user_id,
                delivery: m.delivery,
                sent: format_relative_time(&m.created_at, now),
            })
            .collect();

        Self {
            room_id: room.id,
            mode: room.mode,
            product_name: room.product_name.clone(),
            phase,
            status_label: phase_label(phase),
            current_price: room.current_price,
            current_price_label: format_currency(room.current_price),
            starting_price_label: format_currency(room.starting_price),
            quantity: room.quantity,
            time_remaining: room
                .expires_at
                .as_ref()
                .map(|expiry| format_time_remaining(expiry, now)),
            bids,
            messages,
            can_bid: connection.phase.is_open()
                && check_bid(state, session, PricePolicy::Open, room.current_price, now).is_ok(),
            connection_label: connection.label(),
            online_count: state.presence.len(),
            typing_line: typing_line(state, session, now),
            accepted_price_label: state
                .accepted
                .as_ref()
                .map(|_| format_currency(room.current_price)),
            last_error: state.last_error.clone(),
        }
    }
}

fn phase_label(phase: RoomPhase) -> &'static str {
    match phase {
        RoomPhase::Connecting => "Connecting",
        RoomPhase::Active => "Active",
        RoomPhase::Accepted => "Accepted",
        RoomPhase::Completed => "Completed",
        RoomPhase::Cancelled => "Cancelled",
        RoomPhase::Expired => "Expired",
    }
}

fn typing_line(state: &RoomState, session: &Session, now: &Timestamp) -> Option<String> {
    let names: Vec<String> = state
        .typing
        .active(now, Some(&session.user_id))
        .map(|entry| {
            entry
                .name
                .clone()
                .or_else(|| state.presence.get(&entry.user_id).and_then(|p| p.name.clone()))
                .unwrap_or_else(|| entry.user_id.to_string())
        })
        .collect();

    match names.as_slice() {
        [] => None,
        [one] => Some(format!("{} is typing…", one)),
        [first, second] => Some(format!("{} and {} are typing…", first, second)),
        _ => Some("Several people are typing…".to_string()),
    }
}

#[cfg(test)]
#[path = "room_view_test.rs"]
mod room_view_test;
