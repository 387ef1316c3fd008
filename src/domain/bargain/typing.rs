//! Typing indicators.

use serde::Serialize;

use crate::domain::foundation::{Timestamp, UserId};

/// How long an indicator stays visible without a refresh.
pub const TYPING_TTL_MS: i64 = 3_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypingEntry {
    pub user_id: UserId,
    pub name: Option<String>,
    pub refreshed_at: Timestamp,
}

/// Users currently typing. Expiry is evaluated lazily against `now`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypingSet {
    entries: Vec<TypingEntry>,
}

impl TypingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, user_id: UserId, name: Option<String>, now: Timestamp) {
        self.entries.retain(|e| e.user_id != user_id);
        self.entries.push(TypingEntry {
            user_id,
            name,
            refreshed_at: now,
        });
    }

    pub fn stop(&mut self, user_id: &UserId) {
        self.entries.retain(|e| &e.user_id != user_id);
    }

    /// Drops indicators whose last refresh is older than the TTL.
    pub fn prune(&mut self, now: &Timestamp) {
        self.entries.retain(|e| is_live(e, now));
    }

    /// Live typists other than `local`.
    pub fn active<'a>(
        &'a self,
        now: &'a Timestamp,
        local: Option<&'a UserId>,
    ) -> impl Iterator<Item = &'a TypingEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| is_live(e, now) && Some(&e.user_id) != local)
    }
}

fn is_live(entry: &TypingEntry, now: &Timestamp) -> bool {
    now.duration_since(&entry.refreshed_at).num_milliseconds() < TYPING_TTL_MS
}
