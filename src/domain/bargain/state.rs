//! Authoritative in-memory state of one room view.
//!
//! `RoomState::apply` is the only way state changes. It is a pure function of
//! the current state, the event and the supplied `now`, so every reducer rule
//! can be exercised without a runtime.

use serde::Serialize;

use super::{
    AcceptedDeal, BargainRoom, Bid, ChatMessage, DeliveryStatus, PresenceSet, RoomEvent,
    RoomInfo, RoomStatus, TypingSet,
};
use crate::domain::foundation::{BidId, MessageId, StateMachine, Timestamp, UserId};

/// Lifecycle of a room as the view sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    Connecting,
    Active,
    Accepted,
    Completed,
    Cancelled,
    Expired,
}

impl RoomPhase {
    pub fn allows_bidding(&self) -> bool {
        matches!(self, RoomPhase::Active)
    }
}

impl From<RoomStatus> for RoomPhase {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Active => RoomPhase::Active,
            RoomStatus::Accepted => RoomPhase::Accepted,
            RoomStatus::Completed => RoomPhase::Completed,
            RoomStatus::Cancelled => RoomPhase::Cancelled,
            RoomStatus::Expired => RoomPhase::Expired,
        }
    }
}

/// What `apply` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Same bid or message id seen before.
    Duplicate,
    /// Dropped because the room no longer accepts it.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomState {
    pub room: BargainRoom,
    /// Chronological, oldest first.
    pub bids: Vec<Bid>,
    /// Chronological, oldest first.
    pub messages: Vec<ChatMessage>,
    pub presence: PresenceSet,
    pub typing: TypingSet,
    pub accepted: Option<AcceptedDeal>,
    pub hydrated: bool,
    pub connected: bool,
    /// User id confirmed by `auth_success`.
    pub confirmed_user: Option<UserId>,
    pub last_error: Option<String>,
    pub last_pong: Option<Timestamp>,
}

impl RoomState {
    pub fn new(room: BargainRoom) -> Self {
        Self {
            room,
            bids: Vec::new(),
            messages: Vec::new(),
            presence: PresenceSet::new(),
            typing: TypingSet::new(),
            accepted: None,
            hydrated: false,
            connected: false,
            confirmed_user: None,
            last_error: None,
            last_pong: None,
        }
    }

    /// Phase derived from server status, hydration and local expiry.
    ///
    /// Recomputed on every call; never cached.
    pub fn phase(&self, now: &Timestamp) -> RoomPhase {
        match self.room.status {
            RoomStatus::Active if self.room.is_locally_expired(now) => RoomPhase::Expired,
            RoomStatus::Active if !self.hydrated => RoomPhase::Connecting,
            status => status.into(),
        }
    }

    pub fn current_price(&self) -> f64 {
        self.room.current_price
    }

    pub fn find_bid(&self, bid_id: &BidId) -> Option<&Bid> {
        self.bids.iter().find(|b| &b.id == bid_id)
    }

    pub fn apply(&mut self, event: RoomEvent, now: Timestamp) -> ApplyOutcome {
        match event {
            RoomEvent::ConnectionStatus { connected } => {
                self.connected = connected;
                if !connected {
                    self.typing = TypingSet::new();
                }
                ApplyOutcome::Applied
            }
            RoomEvent::ConnectionError { message } | RoomEvent::ServerError { message } => {
                self.last_error = Some(message);
                ApplyOutcome::Applied
            }
            RoomEvent::AuthSuccess { user_id } => {
                self.confirmed_user = user_id;
                ApplyOutcome::Applied
            }
            RoomEvent::RoomInfo(info) => {
                self.hydrated = true;
                self.apply_room_info(info, &now)
            }
            RoomEvent::BidUpdate { bid, info } => {
                let mut outcome = ApplyOutcome::Ignored;
                if let Some(bid) = bid {
                    outcome = self.apply_new_bid(bid, &now);
                }
                match self.apply_room_info(info, &now) {
                    ApplyOutcome::Applied => ApplyOutcome::Applied,
                    _ => outcome,
                }
            }
            RoomEvent::NewBid(bid) => self.apply_new_bid(bid, &now),
            RoomEvent::NewMessage(message) => self.apply_new_message(message),
            RoomEvent::RecentActivity { bids, messages } => {
                self.bids = dedupe_sorted(bids, |b| b.id, |b| b.created_at);
                self.messages = dedupe_sorted(messages, |m| m.id, |m| m.created_at);
                self.hydrated = true;
                ApplyOutcome::Applied
            }
            RoomEvent::BargainAccepted(deal) => self.apply_accepted(deal),
            RoomEvent::BargainCancelled { .. } => self.apply_status(RoomStatus::Cancelled),
            RoomEvent::UserJoined(participant) => {
                self.presence.upsert(participant);
                ApplyOutcome::Applied
            }
            RoomEvent::UserLeft { user_id } => {
                self.typing.stop(&user_id);
                self.presence.remove(&user_id);
                ApplyOutcome::Applied
            }
            RoomEvent::ActiveUsers(participants) => {
                self.presence.replace(participants);
                ApplyOutcome::Applied
            }
            RoomEvent::Typing {
                user_id,
                name,
                is_typing,
            } => {
                if is_typing {
                    self.typing.refresh(user_id, name, now);
                } else {
                    self.typing.stop(&user_id);
                }
                self.typing.prune(&now);
                ApplyOutcome::Applied
            }
            RoomEvent::Pong { at } => {
                self.last_pong = Some(at.unwrap_or(now));
                ApplyOutcome::Applied
            }
        }
    }

    /// Marks every message up to and including `through` as read.
    pub fn mark_read_through(&mut self, through: &MessageId) {
        let Some(index) = self.messages.iter().position(|m| &m.id == through) else {
            return;
        };
        for message in &mut self.messages[..=index] {
            message.advance_delivery(DeliveryStatus::Read);
        }
    }

    /// Price pushes only land while the room is open and not locally expired.
    fn accepts_price(&self, now: &Timestamp) -> bool {
        self.room.status.is_active() && !self.room.is_locally_expired(now)
    }

    fn apply_room_info(&mut self, info: RoomInfo, now: &Timestamp) -> ApplyOutcome {
        let price_open = self.accepts_price(now);
        let mut outcome = ApplyOutcome::Ignored;

        if let Some(mode) = info.mode {
            self.room.mode = mode;
        }
        if let Some(quantity) = info.quantity {
            self.room.quantity = quantity;
        }
        if let Some(price) = info.current_price {
            if price_open {
                self.room.current_price = price;
                outcome = ApplyOutcome::Applied;
            }
        }
        if let Some(status) = info.status {
            if self.apply_status(status) == ApplyOutcome::Applied {
                outcome = ApplyOutcome::Applied;
            }
        }
        if info.current_price.is_none() && info.status.is_none() {
            outcome = ApplyOutcome::Applied;
        }
        outcome
    }

    fn apply_new_bid(&mut self, bid: Bid, now: &Timestamp) -> ApplyOutcome {
        if self.find_bid(&bid.id).is_some() {
            return ApplyOutcome::Duplicate;
        }
        if !self.accepts_price(now) {
            return ApplyOutcome::Ignored;
        }
        self.room.current_price = bid.price;
        let index = self.bids.partition_point(|b| b.created_at <= bid.created_at);
        self.bids.insert(index, bid);
        ApplyOutcome::Applied
    }

    fn apply_new_message(&mut self, message: ChatMessage) -> ApplyOutcome {
        if self.messages.iter().any(|m| m.id == message.id) {
            return ApplyOutcome::Duplicate;
        }
        self.typing.stop(&message.sender_id);
        let index = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(index, message);
        ApplyOutcome::Applied
    }

    fn apply_accepted(&mut self, deal: AcceptedDeal) -> ApplyOutcome {
        if self.apply_status(RoomStatus::Accepted) == ApplyOutcome::Ignored {
            return ApplyOutcome::Ignored;
        }
        let final_price = deal.final_price.or_else(|| {
            deal.accepted_bid_id
                .as_ref()
                .and_then(|id| self.find_bid(id))
                .map(|b| b.price)
        });
        if let Some(price) = final_price {
            self.room.current_price = price;
        }
        if let Some(quantity) = deal.quantity {
            self.room.quantity = quantity;
        }
        self.accepted = Some(deal);
        ApplyOutcome::Applied
    }

    /// Moves the server status forward; backwards or sideways moves are dropped.
    fn apply_status(&mut self, target: RoomStatus) -> ApplyOutcome {
        if self.room.status == target {
            return ApplyOutcome::Applied;
        }
        match self.room.status.transition_to(target) {
            Ok(next) => {
                self.room.status = next;
                ApplyOutcome::Applied
            }
            Err(_) => ApplyOutcome::Ignored,
        }
    }
}

fn dedupe_sorted<T, K, F, G>(mut items: Vec<T>, key: F, created_at: G) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
    G: Fn(&T) -> Timestamp,
{
    items.sort_by_key(|item| created_at(item));
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.iter().any(|seen| key(seen) == key(&item)) {
            out.push(item);
        }
    }
    out
}
