//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order in SQL equals chronological
//! order. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use threadline_core::{
  identity::{Identity, Role},
  message::{Message, MessageHistory, UnreadMessage},
  notification::{Notification, NotificationType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps, so values returned from
/// a write compare equal to the same values read back.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Guest => "guest",
    Role::Host => "host",
    Role::Admin => "admin",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "guest" => Ok(Role::Guest),
    "host" => Ok(Role::Host),
    "admin" => Ok(Role::Admin),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

// ─── NotificationType ────────────────────────────────────────────────────────

pub fn decode_notification_type(s: &str) -> Result<NotificationType> {
  NotificationType::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown notification type: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawMessage::from_row`].
pub const MESSAGE_COLUMNS: &str = "message_id, sender_id, receiver_id, content, \
   timestamp, parent_message_id, thread_root_id, is_edited, is_read";

/// Raw values read directly from a `messages` row.
pub struct RawMessage {
  pub message_id:        String,
  pub sender_id:         String,
  pub receiver_id:       String,
  pub content:           String,
  pub timestamp:         String,
  pub parent_message_id: Option<String>,
  pub thread_root_id:    Option<String>,
  pub is_edited:         bool,
  pub is_read:           bool,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:        row.get(0)?,
      sender_id:         row.get(1)?,
      receiver_id:       row.get(2)?,
      content:           row.get(3)?,
      timestamp:         row.get(4)?,
      parent_message_id: row.get(5)?,
      thread_root_id:    row.get(6)?,
      is_edited:         row.get(7)?,
      is_read:           row.get(8)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id:        decode_uuid(&self.message_id)?,
      sender_id:         decode_uuid(&self.sender_id)?,
      receiver_id:       decode_uuid(&self.receiver_id)?,
      content:           self.content,
      timestamp:         decode_dt(&self.timestamp)?,
      parent_message_id: decode_opt_uuid(self.parent_message_id)?,
      thread_root_id:    decode_opt_uuid(self.thread_root_id)?,
      is_edited:         self.is_edited,
      read:              self.is_read,
    })
  }
}

pub const USER_COLUMNS: &str = "user_id, username, email, role, created_at";

/// Raw values read directly from a `users` row.
pub struct RawIdentity {
  pub user_id:    String,
  pub username:   String,
  pub email:      Option<String>,
  pub role:       String,
  pub created_at: String,
}

impl RawIdentity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      email:      row.get(2)?,
      role:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      email:      self.email,
      role:       decode_role(&self.role)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const HISTORY_COLUMNS: &str =
  "history_id, message_id, old_content, editor_id, edited_at";

pub struct RawHistory {
  pub history_id:  String,
  pub message_id:  String,
  pub old_content: String,
  pub editor_id:   String,
  pub edited_at:   String,
}

impl RawHistory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:  row.get(0)?,
      message_id:  row.get(1)?,
      old_content: row.get(2)?,
      editor_id:   row.get(3)?,
      edited_at:   row.get(4)?,
    })
  }

  pub fn into_history(self) -> Result<MessageHistory> {
    Ok(MessageHistory {
      history_id:  decode_uuid(&self.history_id)?,
      message_id:  decode_uuid(&self.message_id)?,
      old_content: self.old_content,
      editor_id:   decode_uuid(&self.editor_id)?,
      edited_at:   decode_dt(&self.edited_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str = "notification_id, user_id, message_id, \
   content, notification_type, is_read, created_at, parent_message_id";

pub struct RawNotification {
  pub notification_id:   String,
  pub user_id:           String,
  pub message_id:        String,
  pub content:           String,
  pub notification_type: String,
  pub is_read:           bool,
  pub created_at:        String,
  pub parent_message_id: Option<String>,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id:   row.get(0)?,
      user_id:           row.get(1)?,
      message_id:        row.get(2)?,
      content:           row.get(3)?,
      notification_type: row.get(4)?,
      is_read:           row.get(5)?,
      created_at:        row.get(6)?,
      parent_message_id: row.get(7)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id:   decode_uuid(&self.notification_id)?,
      user_id:           decode_uuid(&self.user_id)?,
      message_id:        decode_uuid(&self.message_id)?,
      content:           self.content,
      notification_type: decode_notification_type(&self.notification_type)?,
      is_read:           self.is_read,
      created_at:        decode_dt(&self.created_at)?,
      parent_message_id: decode_opt_uuid(self.parent_message_id)?,
    })
  }
}

/// Raw values for the unread-message projection.
pub struct RawUnread {
  pub message_id:        String,
  pub sender_id:         String,
  pub content:           String,
  pub timestamp:         String,
  pub parent_message_id: Option<String>,
  pub is_edited:         bool,
}

impl RawUnread {
  pub fn into_unread(self) -> Result<UnreadMessage> {
    Ok(UnreadMessage {
      message_id:        decode_uuid(&self.message_id)?,
      sender_id:         decode_uuid(&self.sender_id)?,
      content:           self.content,
      timestamp:         decode_dt(&self.timestamp)?,
      parent_message_id: decode_opt_uuid(self.parent_message_id)?,
      is_edited:         self.is_edited,
    })
  }
}
