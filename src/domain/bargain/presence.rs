//! Online participants of a room.
//!
//! Maintained purely from join/leave/snapshot events; may be stale between
//! snapshots since the server offers no acknowledgement protocol.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Role, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(alias = "id")]
    pub user_id: UserId,
    #[serde(default, alias = "user_name")]
    pub name: Option<String>,
    #[serde(default, alias = "user_type")]
    pub role: Option<Role>,
    #[serde(default, alias = "timestamp")]
    pub joined_at: Option<Timestamp>,
}

impl Participant {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            role: None,
            joined_at: None,
        }
    }
}

/// Participants keyed by user id, in join order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresenceSet {
    participants: Vec<Participant>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for the participant's user id.
    pub fn upsert(&mut self, participant: Participant) {
        match self
            .participants
            .iter_mut()
            .find(|p| p.user_id == participant.user_id)
        {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
    }

    pub fn remove(&mut self, user_id: &UserId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| &p.user_id != user_id);
        before != self.participants.len()
    }

    /// Replaces the whole set from a snapshot, keeping the last entry per user id.
    pub fn replace(&mut self, participants: Vec<Participant>) {
        self.participants.clear();
        for participant in participants {
            self.upsert(participant);
        }
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.participants.iter().any(|p| &p.user_id == user_id)
    }

    pub fn get(&self, user_id: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }
}
