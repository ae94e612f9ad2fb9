//! Handlers for `/identities` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/identities` | Body: `{"username":"...","email":"...","role":"guest"}`; 201 |
//! | `GET`    | `/identities/:id` | 404 if not found |
//! | `DELETE` | `/identities/:id` | Cascade delete; the identity itself or an admin |
//! | `GET`    | `/identities/:id/unread` | Unread messages addressed to the identity |
//! | `GET`    | `/identities/:id/notifications` | Optional `?unread_only=true` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use threadline_core::{
  identity::{Identity, NewIdentity, Role},
  message::UnreadMessage,
  notification::Notification,
  store::{DeletionReport, MessageStore},
};
use uuid::Uuid;

use crate::{
  actor::{CurrentActor, require_self_or_admin},
  error::ApiError,
};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username: String,
  pub email:    Option<String>,
  pub role:     Option<Role>,
}

/// `POST /identities`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessageStore,
{
  let identity = store
    .add_user(NewIdentity {
      username: body.username,
      email:    body.email,
      role:     body.role.unwrap_or_default(),
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(identity)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /identities/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Identity>, ApiError>
where
  S: MessageStore,
{
  let identity = store
    .get_user(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("identity {id} not found")))?;
  Ok(Json(identity))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /identities/:id` removes every message, notification and history
/// row belonging to the identity, atomically.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<DeletionReport>, ApiError>
where
  S: MessageStore,
{
  require_self_or_admin(store.as_ref(), actor, id).await?;

  let report = store
    .delete_identity(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(report))
}

// ─── Unread ───────────────────────────────────────────────────────────────────

/// `GET /identities/:id/unread`
pub async fn unread<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<UnreadMessage>>, ApiError>
where
  S: MessageStore,
{
  require_self_or_admin(store.as_ref(), actor, id).await?;

  let messages = store.list_unread(id).await.map_err(ApiError::from_store)?;
  Ok(Json(messages))
}

// ─── Notifications ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
  #[serde(default)]
  pub unread_only: bool,
}

/// `GET /identities/:id/notifications[?unread_only=true]`, newest first.
pub async fn notifications<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Query(params): Query<NotificationParams>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: MessageStore,
{
  require_self_or_admin(store.as_ref(), actor, id).await?;

  let notifications = store
    .list_notifications(id, params.unread_only)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(notifications))
}
