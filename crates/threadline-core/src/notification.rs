//! Notifications and the rules that derive them from message lifecycle
//! events.
//!
//! The hook functions here are pure: they decide *whether* a notification is
//! due and render its text. Storage backends persist the result inside the
//! same transaction as the triggering write, so a message is never considered
//! sent (or edited) without its notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;

/// Number of characters of message content shown in a notification.
pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
  Message,
  Reply,
  Edit,
}

impl NotificationType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Message => "message",
      Self::Reply => "reply",
      Self::Edit => "edit",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "message" => Some(Self::Message),
      "reply" => Some(Self::Reply),
      "edit" => Some(Self::Edit),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id:   Uuid,
  /// The recipient.
  pub user_id:           Uuid,
  pub message_id:        Uuid,
  pub content:           String,
  pub notification_type: NotificationType,
  pub is_read:           bool,
  pub created_at:        DateTime<Utc>,
  /// Set on reply notifications: the message that was replied to.
  pub parent_message_id: Option<Uuid>,
}

/// A notification decided by one of the hooks, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
  pub user_id:           Uuid,
  pub message_id:        Uuid,
  pub content:           String,
  pub notification_type: NotificationType,
  pub parent_message_id: Option<Uuid>,
}

impl NewNotification {
  /// Stamp with an id and creation time.
  pub fn into_notification(self, created_at: DateTime<Utc>) -> Notification {
    Notification {
      notification_id: Uuid::new_v4(),
      user_id: self.user_id,
      message_id: self.message_id,
      content: self.content,
      notification_type: self.notification_type,
      is_read: false,
      created_at,
      parent_message_id: self.parent_message_id,
    }
  }
}

/// First [`PREVIEW_CHARS`] characters of `content`, with `...` appended when
/// anything was cut.
pub fn preview(content: &str) -> String {
  match content.char_indices().nth(PREVIEW_CHARS) {
    Some((cut, _)) => format!("{}...", &content[..cut]),
    None => content.to_owned(),
  }
}

// ─── Hooks ───────────────────────────────────────────────────────────────────

/// Exactly one notification for the receiver of a freshly created message.
pub fn on_message_created(message: &Message, sender_name: &str) -> NewNotification {
  let (notification_type, content) = match message.parent_message_id {
    Some(_) => (
      NotificationType::Reply,
      format!("{sender_name} replied to your message: {}", preview(&message.content)),
    ),
    None => (
      NotificationType::Message,
      format!("{sender_name} sent you a message: {}", preview(&message.content)),
    ),
  };

  NewNotification {
    user_id: message.receiver_id,
    message_id: message.message_id,
    content,
    notification_type,
    parent_message_id: message.parent_message_id,
  }
}

/// An `edit` notification for the original receiver, unless the edited
/// message's sender is also its receiver.
pub fn on_message_edited(
  old: &Message,
  new: &Message,
  editor_name: &str,
) -> Option<NewNotification> {
  if old.sender_id == new.receiver_id {
    return None;
  }

  Some(NewNotification {
    user_id:           old.receiver_id,
    message_id:        new.message_id,
    content:           format!("{editor_name} edited a message: {}", preview(&new.content)),
    notification_type: NotificationType::Edit,
    parent_message_id: None,
  })
}
