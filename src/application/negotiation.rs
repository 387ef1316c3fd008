//! NegotiationEngine - validates and submits bids, accepts and chat.
//!
//! Every action is checked locally against the latest room snapshot before a
//! request leaves the process. Submission results never touch room state:
//! the server broadcasts the resulting event and the room session applies it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::adapters::websocket::{ClientFrame, ConnectionHandle};
use crate::domain::bargain::negotiation::{check_accept, check_bid, check_public_response};
use crate::domain::bargain::{
    AcceptedDeal, Bid, BidDraft, ChatContent, ChatRequest, PricePolicy, RoomPhase, RoomState,
    RuleViolation,
};
use crate::domain::foundation::{BidId, ErrorCode, Session, Timestamp, ValidationError};
use crate::domain::view::format_currency;
use crate::ports::{BargainApi, BargainApiError, ConfirmationPrompt, ConfirmationRequest};

/// Errors surfaced to the user for bargain actions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NegotiationError {
    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    /// Rejected by the server; `detail` is the server's text verbatim.
    #[error("{detail}")]
    Rejected { detail: String },

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("bargain is closed: {0}")]
    RoomClosed(String),

    #[error("network problem: {0}")]
    Network(String),

    #[error("unexpected server response: {0}")]
    Protocol(String),

    #[error("another submission is still pending")]
    SubmissionInFlight,

    #[error("accept was not confirmed")]
    ConfirmationDeclined,
}

impl NegotiationError {
    /// Transient failures the user may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NegotiationError::Network(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            NegotiationError::Validation(_) => ErrorCode::ValidationFailed,
            NegotiationError::Rejected { .. } => ErrorCode::BidRejected,
            NegotiationError::Forbidden(_) => ErrorCode::Forbidden,
            NegotiationError::RoomClosed(_) => ErrorCode::RoomClosed,
            NegotiationError::Network(_) => ErrorCode::NetworkError,
            NegotiationError::Protocol(_) => ErrorCode::ProtocolError,
            NegotiationError::SubmissionInFlight => ErrorCode::SubmissionInFlight,
            NegotiationError::ConfirmationDeclined => ErrorCode::ConfirmationDeclined,
        }
    }
}

impl From<ValidationError> for NegotiationError {
    fn from(err: ValidationError) -> Self {
        NegotiationError::Validation(err.to_string())
    }
}

impl From<RuleViolation> for NegotiationError {
    fn from(violation: RuleViolation) -> Self {
        match violation {
            RuleViolation::RoomNotActive(RoomPhase::Connecting) => {
                NegotiationError::Validation("room is still connecting".to_string())
            }
            RuleViolation::RoomNotActive(_) => NegotiationError::RoomClosed(violation.to_string()),
            RuleViolation::NotParticipant { .. }
            | RuleViolation::SameRoleAccept { .. }
            | RuleViolation::NotPublicResponder => NegotiationError::Forbidden(violation.to_string()),
            RuleViolation::UnknownBid(_) | RuleViolation::PriceNotRaised { .. } => {
                NegotiationError::Validation(violation.to_string())
            }
        }
    }
}

impl From<BargainApiError> for NegotiationError {
    fn from(err: BargainApiError) -> Self {
        match err {
            BargainApiError::Status { status, detail } => match status {
                401 | 403 => NegotiationError::Forbidden(detail),
                404 | 409 | 410 => NegotiationError::RoomClosed(detail),
                500..=599 => NegotiationError::Network(detail),
                _ => NegotiationError::Rejected { detail },
            },
            BargainApiError::Timeout => NegotiationError::Network("request timed out".to_string()),
            BargainApiError::Network(message) => NegotiationError::Network(message),
            BargainApiError::Decode(message) => NegotiationError::Protocol(message),
        }
    }
}

/// Where a chat message went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRoute {
    Socket,
    Http,
}

/// Clears the in-flight flag when the submission finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, NegotiationError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| NegotiationError::SubmissionInFlight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Bid, accept and chat submission for one room view.
pub struct NegotiationEngine {
    api: Arc<dyn BargainApi>,
    confirmation: Arc<dyn ConfirmationPrompt>,
    session: Session,
    policy: PricePolicy,
    in_flight: AtomicBool,
}

impl NegotiationEngine {
    pub fn new(
        api: Arc<dyn BargainApi>,
        confirmation: Arc<dyn ConfirmationPrompt>,
        session: Session,
        policy: PricePolicy,
    ) -> Self {
        Self {
            api,
            confirmation,
            session,
            policy,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// True while a bid or accept is awaiting the server.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Places a bid in the room described by `state`.
    pub async fn place_bid(&self, state: &RoomState, draft: &BidDraft) -> Result<Bid, NegotiationError> {
        draft.validate()?;
        check_bid(state, &self.session, self.policy, draft.price, &Timestamp::now())?;
        let _guard = InFlight::acquire(&self.in_flight)?;

        let room_id = state.room.id;
        tracing::info!(
            room_id = %room_id,
            role = %self.session.role,
            price = draft.price,
            quantity = draft.quantity,
            "placing bid"
        );
        self.api.place_bid(&room_id, draft).await.map_err(|e| {
            tracing::warn!(room_id = %room_id, error = %e, "bid submission failed");
            NegotiationError::from(e)
        })
    }

    /// A seller's first response to a public bargain.
    pub async fn respond_to_public(
        &self,
        state: &RoomState,
        draft: &BidDraft,
    ) -> Result<Bid, NegotiationError> {
        draft.validate()?;
        check_public_response(state, &self.session, self.policy, draft.price, &Timestamp::now())?;
        let _guard = InFlight::acquire(&self.in_flight)?;

        let room_id = state.room.id;
        tracing::info!(room_id = %room_id, price = draft.price, "responding to public bargain");
        self.api.respond_public(&room_id, draft).await.map_err(|e| {
            tracing::warn!(room_id = %room_id, error = %e, "public response failed");
            NegotiationError::from(e)
        })
    }

    /// Accepts `bid_id` after the user confirms. Ends the negotiation.
    pub async fn accept_bid(
        &self,
        state: &RoomState,
        bid_id: &BidId,
    ) -> Result<AcceptedDeal, NegotiationError> {
        let bid = check_accept(state, &self.session, bid_id, &Timestamp::now())?;
        let _guard = InFlight::acquire(&self.in_flight)?;

        let request = ConfirmationRequest {
            room_id: state.room.id,
            bid_id: bid.id,
            price: bid.price,
            quantity: bid.quantity,
            prompt: format!(
                "Accept this bid of {}? This will end the negotiation.",
                format_currency(bid.price)
            ),
        };
        if !self.confirmation.confirm(&request).await {
            tracing::debug!(room_id = %request.room_id, bid_id = %bid.id, "accept declined");
            return Err(NegotiationError::ConfirmationDeclined);
        }

        tracing::info!(room_id = %request.room_id, bid_id = %bid.id, price = bid.price, "accepting bid");
        self.api
            .accept_bid(&request.room_id, &bid.id)
            .await
            .map_err(|e| {
                tracing::warn!(room_id = %request.room_id, error = %e, "accept failed");
                NegotiationError::from(e)
            })
    }

    /// Sends chat over the socket when it is open, otherwise over REST.
    pub async fn send_chat(
        &self,
        state: &RoomState,
        socket: Option<&ConnectionHandle>,
        content: &str,
    ) -> Result<ChatRoute, NegotiationError> {
        let content = ChatContent::new(content)?;

        let frame = ClientFrame::ChatMessage {
            content: content.as_str().to_string(),
        };
        if socket.map(|s| s.send(&frame)).unwrap_or(false) {
            return Ok(ChatRoute::Socket);
        }

        let room_id = state.room.id;
        tracing::debug!(room_id = %room_id, "socket unavailable, posting chat over HTTP");
        self.api
            .post_chat(&room_id, &ChatRequest::text(content))
            .await
            .map_err(NegotiationError::from)?;
        Ok(ChatRoute::Http)
    }
}

#[cfg(test)]
#[path = "negotiation_test.rs"]
mod negotiation_test;
