//! Presentation projections.
//!
//! Pure, stateless functions from room state to display-ready shapes.

pub mod format;
pub mod room_view;

pub use format::{
    derive_bargain_status, format_currency, format_relative_time, format_time_remaining,
};
pub use room_view::{BidView, MessageView, RoomView};
