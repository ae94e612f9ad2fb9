//! Notification persistence.
//!
//! The decision rules live in [`threadline_core::notification`]; this module
//! only writes and reads rows. The hook functions are called with the
//! triggering operation's open transaction, so a failed insert here aborts
//! the message write as well.

use rusqlite::{Connection, OptionalExtension as _};
use threadline_core::{
  Error as CoreError,
  message::Message,
  notification::{self, NewNotification, Notification},
};
use uuid::Uuid;

use crate::{
  encode::{NOTIFICATION_COLUMNS, RawNotification, encode_dt, encode_uuid, now},
  Result,
};

fn insert(conn: &Connection, pending: NewNotification) -> Result<Notification> {
  let n = pending.into_notification(now());

  conn.execute(
    "INSERT INTO notifications (
       notification_id, user_id, message_id, content,
       notification_type, is_read, created_at, parent_message_id
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(n.notification_id),
      encode_uuid(n.user_id),
      encode_uuid(n.message_id),
      n.content,
      n.notification_type.as_str(),
      n.is_read,
      encode_dt(n.created_at),
      n.parent_message_id.map(encode_uuid),
    ],
  )?;

  tracing::trace!(
    notification_id = %n.notification_id,
    kind = n.notification_type.as_str(),
    "notification recorded"
  );
  Ok(n)
}

// ─── Hooks ───────────────────────────────────────────────────────────────────

pub fn on_message_created(
  conn: &Connection,
  message: &Message,
  sender_name: &str,
) -> Result<Notification> {
  insert(conn, notification::on_message_created(message, sender_name))
}

pub fn on_message_edited(
  conn: &Connection,
  old: &Message,
  new: &Message,
  editor_name: &str,
) -> Result<Option<Notification>> {
  notification::on_message_edited(old, new, editor_name)
    .map(|pending| insert(conn, pending))
    .transpose()
}

// ─── Reads and flags ─────────────────────────────────────────────────────────

pub fn list_for_user(
  conn: &Connection,
  user_id: Uuid,
  unread_only: bool,
) -> Result<Vec<Notification>> {
  let filter = if unread_only { "AND is_read = 0" } else { "" };
  let mut stmt = conn.prepare(&format!(
    "SELECT {NOTIFICATION_COLUMNS} FROM notifications
     WHERE user_id = ?1 {filter}
     ORDER BY created_at DESC, rowid DESC"
  ))?;

  let raws = stmt
    .query_map(rusqlite::params![encode_uuid(user_id)], RawNotification::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawNotification::into_notification).collect()
}

pub fn fetch(conn: &Connection, notification_id: Uuid) -> Result<Option<Notification>> {
  let raw = conn
    .query_row(
      &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE notification_id = ?1"),
      rusqlite::params![encode_uuid(notification_id)],
      RawNotification::from_row,
    )
    .optional()?;
  raw.map(RawNotification::into_notification).transpose()
}

pub fn mark_read(conn: &Connection, notification_id: Uuid) -> Result<Notification> {
  conn.execute(
    "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1",
    rusqlite::params![encode_uuid(notification_id)],
  )?;
  fetch(conn, notification_id)?
    .ok_or_else(|| CoreError::NotificationNotFound(notification_id).into())
}
