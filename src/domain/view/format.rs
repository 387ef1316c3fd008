//! Display formatting for countdowns, money and relative times.
//!
//! Every function here is pure and cheap enough to call on each render tick.

use crate::domain::bargain::{BargainRoom, RoomStatus};
use crate::domain::foundation::Timestamp;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Countdown text: `Expired`, `Xd Yh`, `Xh Ym`, `Xm Ys` or `Xs`.
///
/// Only the two most significant units are shown.
pub fn format_time_remaining(expiry: &Timestamp, now: &Timestamp) -> String {
    let remaining_ms = expiry.duration_since(now).num_milliseconds();
    if remaining_ms <= 0 {
        return "Expired".to_string();
    }

    let secs = remaining_ms / 1000;
    let days = secs / SECS_PER_DAY;
    let hours = (secs % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = secs % SECS_PER_MINUTE;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Rupee amount with Indian digit grouping and two decimals, e.g. `₹1,23,456.50`.
pub fn format_currency(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = paise / 100;
    let fraction = paise % 100;
    let sign = if amount < 0.0 && paise > 0 { "-" } else { "" };

    format!("{}₹{}.{:02}", sign, group_indian(rupees), fraction)
}

/// Groups the last three digits, then every two: 12345678 -> 1,23,45,678.
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Short relative time for history entries: `Just now`, `5m ago`, `3h ago`, or a date.
pub fn format_relative_time(at: &Timestamp, now: &Timestamp) -> String {
    let elapsed = now.duration_since(at).num_seconds();
    if elapsed < SECS_PER_MINUTE {
        "Just now".to_string()
    } else if elapsed < SECS_PER_HOUR {
        format!("{}m ago", elapsed / SECS_PER_MINUTE)
    } else if elapsed < SECS_PER_DAY {
        format!("{}h ago", elapsed / SECS_PER_HOUR)
    } else {
        at.as_datetime().format("%d/%m/%Y").to_string()
    }
}

/// Server status combined with the local expiry check.
pub fn derive_bargain_status(room: &BargainRoom, now: &Timestamp) -> RoomStatus {
    room.effective_status(now)
}
