//! Local session configuration
//!
//! Token storage is owned by the host application; this section only lets
//! the watcher binary receive the values it would otherwise be handed.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::{Role, Session, UserId};

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Bearer token issued by the marketplace login endpoint
    pub token: Option<Secret<String>>,

    /// Local user id
    pub user_id: Option<String>,

    /// Local marketplace role
    #[serde(default = "default_role")]
    pub role: Role,

    /// Name shown to other participants
    pub display_name: Option<String>,
}

impl SessionConfig {
    /// Builds the explicit session context handed to the bargain core.
    pub fn to_session(&self) -> Result<Session, ValidationError> {
        let token = self
            .token
            .as_ref()
            .map(|t| t.expose_secret().clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or(ValidationError::MissingRequired("session.token"))?;
        let user_id = self
            .user_id
            .as_deref()
            .ok_or(ValidationError::MissingRequired("session.user_id"))?;
        let user_id = UserId::new(user_id).map_err(|_| ValidationError::InvalidUserId)?;

        let session = Session::new(user_id, self.role, token);
        Ok(match &self.display_name {
            Some(name) => session.with_display_name(name.clone()),
            None => session,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.to_session().map(|_| ())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token: None,
            user_id: None,
            role: default_role(),
            display_name: None,
        }
    }
}

fn default_role() -> Role {
    Role::Buyer
}
