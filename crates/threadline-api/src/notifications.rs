//! Handler for `POST /notifications/:id/read`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use threadline_core::{notification::Notification, store::MessageStore};
use uuid::Uuid;

use crate::{
  actor::{CurrentActor, require_actor},
  error::ApiError,
};

/// `POST /notifications/:id/read`. Only the recipient may mark it.
pub async fn mark_read<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError>
where
  S: MessageStore,
{
  let current = store
    .get_notification(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("notification {id} not found")))?;
  require_actor(actor, current.user_id, "the recipient")?;

  let notification = store
    .mark_notification_read(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(notification))
}
