//! Identity references.
//!
//! Identities are owned by an external auth layer; the store keeps just
//! enough of them (a UUID and a display name) to link and render messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Coarse authorization role. Interpreted by collaborators outside the core.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Guest,
  Host,
  Admin,
}

/// A registered user that messages can be addressed to and from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id:    Uuid,
  pub username:   String,
  pub email:      Option<String>,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::MessageStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub username: String,
  pub email:    Option<String>,
  pub role:     Role,
}

impl NewIdentity {
  pub fn new(username: impl Into<String>) -> Self {
    Self { username: username.into(), email: None, role: Role::default() }
  }

  /// Reject blank usernames; returns the trimmed name.
  pub fn validated_username(&self) -> Result<String> {
    let name = self.username.trim();
    if name.is_empty() {
      return Err(Error::Validation("username must not be empty".into()));
    }
    Ok(name.to_owned())
  }
}

/// The `{id, username}` pair used wherever a participant is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
  pub id:       Uuid,
  pub username: String,
}

impl From<&Identity> for UserRef {
  fn from(identity: &Identity) -> Self {
    Self { id: identity.user_id, username: identity.username.clone() }
  }
}

/// The per-request authenticated identity handed over by the auth layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Option<Uuid>,
  pub role:    Option<Role>,
}

impl Actor {
  pub fn anonymous() -> Self { Self::default() }

  pub fn authenticated(user_id: Uuid, role: Option<Role>) -> Self {
    Self { user_id: Some(user_id), role }
  }

  pub fn is_authenticated(&self) -> bool { self.user_id.is_some() }

  pub fn is_admin(&self) -> bool { self.role == Some(Role::Admin) }

  /// Whether this actor is `user_id` itself.
  pub fn is(&self, user_id: Uuid) -> bool { self.user_id == Some(user_id) }
}
