//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `BargainApi` - bargain REST service
//! - `RoomTransport` / `FrameChannel` - live room connection
//! - `ConfirmationPrompt` - user consent before accepting a bid

mod bargain_api;
mod confirmation;
mod transport;

pub use bargain_api::{BargainApi, BargainApiError, HistoryEntry, HistoryKind, PublicBargain, RoomDetail};
pub use confirmation::{ConfirmationPrompt, ConfirmationRequest};
pub use transport::{Frame, FrameChannel, RoomTransport, TransportError};
