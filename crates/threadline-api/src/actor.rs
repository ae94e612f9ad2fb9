//! The current actor and the entitlement checks made on its behalf.
//!
//! Authentication happens upstream: the auth layer in front of this router
//! is expected to set the [`ACTOR_HEADER`] to the authenticated user's UUID.
//! The core never sees these checks; they are this layer's responsibility.

use axum::{extract::FromRequestParts, http::request::Parts};
use threadline_core::{identity::Actor, store::MessageStore};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_HEADER: &str = "x-user-id";

/// Extractor for the authenticated actor. Rejects with 401 when the header is
/// missing or malformed.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(ACTOR_HEADER)
      .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_HEADER} header")))?;

    let user_id = raw
      .to_str()
      .ok()
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
      .ok_or_else(|| ApiError::Unauthorized(format!("malformed {ACTOR_HEADER} header")))?;

    Ok(CurrentActor(Actor::authenticated(user_id, None)))
  }
}

/// Fill in the actor's role from the store. An actor whose identity no longer
/// exists is treated as unauthenticated.
pub async fn with_role<S>(store: &S, actor: Actor) -> Result<Actor, ApiError>
where
  S: MessageStore,
{
  let Some(user_id) = actor.user_id else {
    return Err(ApiError::Unauthorized("no authenticated actor".into()));
  };

  let identity = store
    .get_user(user_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::Unauthorized(format!("unknown actor {user_id}")))?;

  Ok(Actor::authenticated(user_id, Some(identity.role)))
}

/// The actor must be `owner` itself, or an admin.
pub async fn require_self_or_admin<S>(
  store: &S,
  actor: Actor,
  owner: Uuid,
) -> Result<(), ApiError>
where
  S: MessageStore,
{
  if actor.is(owner) {
    return Ok(());
  }
  if with_role(store, actor).await?.is_admin() {
    return Ok(());
  }
  Err(ApiError::Forbidden(format!("not entitled to act for {owner}")))
}

/// The actor must be exactly `expected`.
pub fn require_actor(actor: Actor, expected: Uuid, what: &str) -> Result<(), ApiError> {
  if actor.is(expected) {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!("only {what} may do this")))
  }
}
