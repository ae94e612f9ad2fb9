//! Handler for `GET /threads/:id`.
//!
//! Accepts the id of any message in the thread and returns the whole thread
//! as a nested reply tree.

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
};
use threadline_core::{
  identity::UserRef,
  store::MessageStore,
  thread::{ThreadNode, build_tree},
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /threads/:id`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ThreadNode>>, ApiError>
where
  S: MessageStore,
{
  let messages = store.get_thread(id).await.map_err(ApiError::from_store)?;

  let mut ids: Vec<Uuid> = messages
    .iter()
    .flat_map(|m| [m.sender_id, m.receiver_id])
    .collect();
  ids.sort_unstable();
  ids.dedup();

  let participants: HashMap<Uuid, UserRef> = store
    .get_users(ids)
    .await
    .map_err(ApiError::from_store)?
    .iter()
    .map(|identity| (identity.user_id, UserRef::from(identity)))
    .collect();

  Ok(Json(build_tree(messages, &participants)))
}
