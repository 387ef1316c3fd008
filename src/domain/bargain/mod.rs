//! Bargain domain - rooms, bids, chat, presence and the room state machine.

mod amount;
mod bid;
mod chat;
mod connection;
mod events;
pub mod negotiation;
mod presence;
mod requests;
mod room;
mod state;
mod typing;

pub use bid::Bid;
pub use chat::{ChatMessage, DeliveryStatus};
pub use connection::{ConnectionPhase, ConnectionState};
pub use events::{AcceptedDeal, RoomEvent, RoomInfo};
pub use negotiation::{PricePolicy, RuleViolation};
pub use presence::{Participant, PresenceSet};
pub use requests::{
    AcceptRequest, AvailableQuery, BidDraft, ChatContent, ChatRequest, CreateRoomRequest,
    MyBargainsQuery, Page,
};
pub use room::{BargainRoom, RoomMode, RoomStatus};
pub use state::{ApplyOutcome, RoomPhase, RoomState};
pub use typing::{TypingEntry, TypingSet, TYPING_TTL_MS};

pub(crate) use amount::optional_amount;
