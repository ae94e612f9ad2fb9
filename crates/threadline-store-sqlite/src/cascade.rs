//! Cascade deletion of an identity's footprint.
//!
//! Runs inside the caller's transaction. Explicit deletes cover the rows the
//! identity owns directly, plus every reply hanging below one of its
//! messages. `ON DELETE CASCADE` in the schema removes the history and
//! notifications of each deleted message, which is always one level deep.

use rusqlite::Connection;
use threadline_core::store::DeletionReport;
use uuid::Uuid;

use crate::{encode::encode_uuid, store::require_user, Result};

/// Every message sent or received by `?1`, closed over replies.
///
/// The recursive CTE is evaluated iteratively by SQLite, so chain depth is
/// unbounded. Every thread member descends from its root through
/// `parent_message_id`, so following parents alone reaches `thread_root_id`
/// references too. The whole set goes in one statement: foreign keys without
/// a cascade are checked when the statement ends, by which point no
/// surviving row points into the set.
const DELETE_MESSAGES_AND_REPLIES: &str = "
  WITH RECURSIVE doomed(id) AS (
    SELECT message_id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1
    UNION
    SELECT m.message_id FROM messages m JOIN doomed d ON m.parent_message_id = d.id
  )
  DELETE FROM messages WHERE message_id IN (SELECT id FROM doomed)";

pub fn delete_identity(conn: &Connection, user_id: Uuid) -> Result<DeletionReport> {
  require_user(conn, user_id)?;
  let id = encode_uuid(user_id);

  let history = conn.execute(
    "DELETE FROM message_history WHERE editor_id = ?1",
    rusqlite::params![id],
  )?;

  let notifications = conn.execute(
    "DELETE FROM notifications WHERE user_id = ?1",
    rusqlite::params![id],
  )?;

  // Only the identity's own messages are reported; third-party replies go
  // with them but are not counted.
  let messages: i64 = conn.query_row(
    "SELECT COUNT(*) FROM messages WHERE sender_id = ?1 OR receiver_id = ?1",
    rusqlite::params![id],
    |row| row.get(0),
  )?;
  conn.execute(DELETE_MESSAGES_AND_REPLIES, rusqlite::params![id])?;

  conn.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id])?;

  Ok(DeletionReport { messages: messages as usize, notifications, history })
}
