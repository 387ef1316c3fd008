//! Role and price rules for bidding and accepting.
//!
//! Pure checks over a room snapshot and the local session. The application
//! layer runs them before any request leaves the process.

use serde::Deserialize;
use thiserror::Error;

use super::{Bid, RoomMode, RoomPhase, RoomState};
use crate::domain::foundation::{BidId, Role, Session, Timestamp};

/// How a new bid price relates to the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePolicy {
    /// Any positive price; the server arbitrates.
    #[default]
    Open,
    /// Each bid must be strictly above the current price.
    Raise,
}

impl PricePolicy {
    pub fn check(&self, price: f64, current: f64) -> Result<(), RuleViolation> {
        match self {
            PricePolicy::Open => Ok(()),
            PricePolicy::Raise if price > current => Ok(()),
            PricePolicy::Raise => Err(RuleViolation::PriceNotRaised { price, current }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("room is {0:?} and no longer accepts this action")]
    RoomNotActive(RoomPhase),

    #[error("a {role} is not a participant allowed to {action} in this room")]
    NotParticipant { role: Role, action: &'static str },

    #[error("a {role} cannot accept a bid placed by a {role}")]
    SameRoleAccept { role: Role },

    #[error("bid {0} is not part of this room's history")]
    UnknownBid(BidId),

    #[error("bid price {price} must be above the current price {current}")]
    PriceNotRaised { price: f64, current: f64 },

    #[error("only sellers can respond to a public bargain")]
    NotPublicResponder,
}

impl RuleViolation {
    /// True when the room itself is closed rather than the user being denied.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RuleViolation::RoomNotActive(phase) if *phase != RoomPhase::Connecting)
    }
}

/// Whether the session belongs on the given side of this room.
///
/// Unknown participant ids fall back to the role alone; the server rechecks.
fn is_participant(state: &RoomState, session: &Session) -> bool {
    let room = &state.room;
    match session.role {
        Role::Buyer => room
            .buyer_id
            .as_ref()
            .map(|buyer| buyer == &session.user_id)
            .unwrap_or(true),
        Role::Seller => match room.mode {
            RoomMode::Public => true,
            RoomMode::Private => room
                .seller_id
                .as_ref()
                .map(|seller| seller == &session.user_id)
                .unwrap_or(true),
        },
    }
}

fn ensure_active(state: &RoomState, now: &Timestamp) -> Result<(), RuleViolation> {
    let phase = state.phase(now);
    if phase.allows_bidding() {
        Ok(())
    } else {
        Err(RuleViolation::RoomNotActive(phase))
    }
}

/// Checks that the session may place a bid at `price` right now.
pub fn check_bid(
    state: &RoomState,
    session: &Session,
    policy: PricePolicy,
    price: f64,
    now: &Timestamp,
) -> Result<(), RuleViolation> {
    ensure_active(state, now)?;
    if !is_participant(state, session) {
        return Err(RuleViolation::NotParticipant {
            role: session.role,
            action: "bid",
        });
    }
    policy.check(price, state.current_price())
}

/// Checks a seller's first response to a public bargain.
pub fn check_public_response(
    state: &RoomState,
    session: &Session,
    policy: PricePolicy,
    price: f64,
    now: &Timestamp,
) -> Result<(), RuleViolation> {
    if session.role != Role::Seller || state.room.mode != RoomMode::Public {
        return Err(RuleViolation::NotPublicResponder);
    }
    check_bid(state, session, policy, price, now)
}

/// Checks that the session may accept `bid_id`; returns the bid on success.
pub fn check_accept<'a>(
    state: &'a RoomState,
    session: &Session,
    bid_id: &BidId,
    now: &Timestamp,
) -> Result<&'a Bid, RuleViolation> {
    ensure_active(state, now)?;
    let bid = state
        .find_bid(bid_id)
        .ok_or(RuleViolation::UnknownBid(*bid_id))?;
    if !can_accept(bid, session) {
        return Err(RuleViolation::SameRoleAccept { role: session.role });
    }
    if !is_participant(state, session) {
        return Err(RuleViolation::NotParticipant {
            role: session.role,
            action: "accept",
        });
    }
    Ok(bid)
}

/// Only the counterpart of the bid's originator may accept it.
pub fn can_accept(bid: &Bid, session: &Session) -> bool {
    bid.role == session.role.counterpart()
}
