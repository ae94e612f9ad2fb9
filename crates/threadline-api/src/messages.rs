//! Handlers for `/messages` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/messages` | Query: [`ListParams`]; the actor's own messages, or all for an admin |
//! | `POST`  | `/messages` | Body: [`SendBody`]; actor must be the sender; 201 |
//! | `GET`   | `/messages/:id` | Single message |
//! | `PATCH` | `/messages/:id` | Body: `{"content":"..."}`; actor must be the sender |
//! | `GET`   | `/messages/:id/history` | Edit log, oldest first |
//! | `POST`  | `/messages/:id/read` | Actor must be the receiver |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use threadline_core::{
  message::{Message, MessageFilter, MessageHistory, NewMessage, SenderFilter},
  store::MessageStore,
};
use uuid::Uuid;

use crate::{
  actor::{CurrentActor, require_actor, with_role},
  error::ApiError,
};

async fn load<S>(store: &S, id: Uuid) -> Result<Message, ApiError>
where
  S: MessageStore,
{
  store
    .get_message(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("message {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// Query string accepted by `GET /messages`. Dates are RFC 3339.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Sender UUID or username.
  pub sender:     Option<String>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
  pub search:     Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

/// `GET /messages`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: MessageStore,
{
  let actor = with_role(store.as_ref(), actor).await?;
  let participant = if actor.is_admin() { None } else { actor.user_id };

  let filter = MessageFilter {
    participant,
    sender: non_blank(params.sender).map(|raw| SenderFilter::parse(&raw)),
    start_date: params.start_date,
    end_date: params.end_date,
    search: non_blank(params.search),
  };

  let messages = store
    .list_messages(filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(messages))
}

// ─── Send ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /messages`.
#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub sender:            Uuid,
  pub receiver:          Uuid,
  pub content:           String,
  pub parent_message_id: Option<Uuid>,
}

impl From<SendBody> for NewMessage {
  fn from(b: SendBody) -> Self {
    NewMessage {
      sender_id:         b.sender,
      receiver_id:       b.receiver,
      content:           b.content,
      parent_message_id: b.parent_message_id,
    }
  }
}

/// `POST /messages`: returns 201 + the stored [`Message`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessageStore,
{
  require_actor(actor, body.sender, "the sender")?;

  let message = store
    .send(NewMessage::from(body))
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(message)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /messages/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError>
where
  S: MessageStore,
{
  Ok(Json(load(store.as_ref(), id).await?))
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EditBody {
  pub content: String,
}

/// `PATCH /messages/:id`. The actor is recorded as the editor.
pub async fn edit<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(body): Json<EditBody>,
) -> Result<Json<Message>, ApiError>
where
  S: MessageStore,
{
  let current = load(store.as_ref(), id).await?;
  require_actor(actor, current.sender_id, "the sender")?;

  let editor = current.sender_id;
  let message = store
    .edit(id, editor, body.content)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(message))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /messages/:id/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageHistory>>, ApiError>
where
  S: MessageStore,
{
  let history = store.get_history(id).await.map_err(ApiError::from_store)?;
  Ok(Json(history))
}

// ─── Mark read ────────────────────────────────────────────────────────────────

/// `POST /messages/:id/read`
pub async fn mark_read<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError>
where
  S: MessageStore,
{
  let current = load(store.as_ref(), id).await?;
  require_actor(actor, current.receiver_id, "the receiver")?;

  let message = store.mark_read(id).await.map_err(ApiError::from_store)?;
  Ok(Json(message))
}
