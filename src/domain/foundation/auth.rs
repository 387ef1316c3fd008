//! Session context for the bargaining subsystem.
//!
//! The session is passed in explicitly at construction time. Nothing in the
//! crate reads tokens or user identity from ambient global state.

use std::fmt;

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Marketplace role of a participant in a bargain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    /// The opposite side of the negotiation.
    pub fn counterpart(&self) -> Role {
        match self {
            Role::Buyer => Role::Seller,
            Role::Seller => Role::Buyer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        };
        write!(f, "{}", s)
    }
}

/// Authenticated local user plus the bearer token used for REST and socket auth.
#[derive(Clone)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
    pub display_name: Option<String>,
    token: Secret<String>,
}

impl Session {
    pub fn new(user_id: UserId, role: Role, token: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            display_name: None,
            token: Secret::new(token.into()),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Exposes the token for building a request or socket URL.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
