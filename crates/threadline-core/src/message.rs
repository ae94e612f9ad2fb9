//! Messages, their thread linkage, and the append-only edit log.
//!
//! Reply links are stored as optional UUID references and resolved by
//! lookup. `thread_root_id` is denormalised at creation time so that a whole
//! thread can be fetched with a single indexed query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Message ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub message_id:        Uuid,
  pub sender_id:         Uuid,
  pub receiver_id:       Uuid,
  pub content:           String,
  /// Server-assigned creation time; never changes.
  pub timestamp:         DateTime<Utc>,
  /// The message this one replies to. `None` starts a thread.
  pub parent_message_id: Option<Uuid>,
  /// Always a root message (one without a parent), or `None` when this
  /// message is itself the root.
  pub thread_root_id:    Option<Uuid>,
  pub is_edited:         bool,
  pub read:              bool,
}

impl Message {
  /// The root of the thread this message belongs to.
  pub fn root_id(&self) -> Uuid {
    match self.parent_message_id {
      None => self.message_id,
      Some(parent) => self.thread_root_id.unwrap_or(parent),
    }
  }

  /// The `thread_root_id` a reply to `self` must carry.
  ///
  /// Collapses one level of indirection: replying to a reply points at the
  /// reply's root, never at the reply itself.
  pub fn root_for_reply(&self) -> Uuid {
    self.thread_root_id.unwrap_or(self.message_id)
  }
}

// ─── NewMessage ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::MessageStore::send`]. Timestamps, ids and thread
/// linkage are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub sender_id:         Uuid,
  pub receiver_id:       Uuid,
  pub content:           String,
  pub parent_message_id: Option<Uuid>,
}

impl NewMessage {
  pub fn new(sender_id: Uuid, receiver_id: Uuid, content: impl Into<String>) -> Self {
    Self {
      sender_id,
      receiver_id,
      content: content.into(),
      parent_message_id: None,
    }
  }

  pub fn reply_to(mut self, parent_message_id: Uuid) -> Self {
    self.parent_message_id = Some(parent_message_id);
    self
  }
}

/// Messages must carry some non-whitespace text.
pub fn validate_content(content: &str) -> Result<()> {
  if content.trim().is_empty() {
    return Err(Error::Validation("message content must not be empty".into()));
  }
  Ok(())
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One recorded edit. Rows are appended, never updated or merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHistory {
  pub history_id:  Uuid,
  pub message_id:  Uuid,
  /// The content as it was *before* the edit.
  pub old_content: String,
  pub editor_id:   Uuid,
  pub edited_at:   DateTime<Utc>,
}

// ─── Unread projection ───────────────────────────────────────────────────────

/// The minimal view returned by
/// [`crate::store::MessageStore::list_unread`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadMessage {
  pub message_id:        Uuid,
  pub sender_id:         Uuid,
  pub content:           String,
  pub timestamp:         DateTime<Utc>,
  pub parent_message_id: Option<Uuid>,
  pub is_edited:         bool,
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Selects a sender either by id or by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderFilter {
  Id(Uuid),
  Username(String),
}

impl SenderFilter {
  /// A value that parses as a UUID is an id; anything else is a username.
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    match Uuid::parse_str(raw) {
      Ok(id) => Self::Id(id),
      Err(_) => Self::Username(raw.to_string()),
    }
  }
}

/// Input to [`crate::store::MessageStore::list_messages`]. Every field that is
/// set narrows the result; the default matches every message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
  /// Only messages this user sent or received.
  pub participant: Option<Uuid>,
  pub sender:      Option<SenderFilter>,
  /// Inclusive lower bound on `timestamp`.
  pub start_date:  Option<DateTime<Utc>>,
  /// Inclusive upper bound on `timestamp`.
  pub end_date:    Option<DateTime<Utc>>,
  /// Case-insensitive substring of the content.
  pub search:      Option<String>,
}

impl MessageFilter {
  pub fn validate(&self) -> Result<()> {
    match (self.start_date, self.end_date) {
      (Some(start), Some(end)) if start > end => {
        Err(Error::Validation("start_date is after end_date".into()))
      }
      _ => Ok(()),
    }
  }

  /// Whether `content` satisfies the `search` term. Comparison uses full
  /// Unicode lowercasing, not just ASCII.
  pub fn matches_search(&self, content: &str) -> bool {
    match &self.search {
      None => true,
      Some(term) => content.to_lowercase().contains(&term.to_lowercase()),
    }
  }
}
