//! [`SqliteStore`], the SQLite implementation of [`MessageStore`].

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _};
use threadline_core::{
  Error as CoreError,
  identity::{Identity, NewIdentity},
  message::{
    Message, MessageFilter, MessageHistory, NewMessage, SenderFilter, UnreadMessage,
    validate_content,
  },
  notification::Notification,
  store::{DeletionReport, MessageStore},
};
use uuid::Uuid;

use crate::{
  cascade,
  encode::{
    HISTORY_COLUMNS, MESSAGE_COLUMNS, RawHistory, RawIdentity, RawMessage,
    RawUnread, USER_COLUMNS, encode_dt, encode_role, encode_uuid, now,
  },
  notify,
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Threadline message store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Execute raw SQL; tests use it to inject storage faults.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the connection outside any explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside one SQLite transaction.
  ///
  /// The transaction commits only if `f` returns `Ok`; any error drops it
  /// uncommitted, which rolls back every statement `f` issued. Storage faults
  /// surface as [`Error::Transaction`].
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match f(&tx) {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(Error::Sqlite(e)) => Ok(Err(Error::Transaction(e.into()))),
          Err(e) => Ok(Err(e)),
        }
      })
      .await
      .map_err(Error::Transaction)?
  }
}

// ─── Row access shared by all operations ─────────────────────────────────────

pub(crate) fn fetch_message(conn: &Connection, id: Uuid) -> Result<Option<Message>> {
  let raw = conn
    .query_row(
      &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawMessage::from_row,
    )
    .optional()?;
  raw.map(RawMessage::into_message).transpose()
}

pub(crate) fn require_message(conn: &Connection, id: Uuid) -> Result<Message> {
  fetch_message(conn, id)?.ok_or(Error::Core(CoreError::MessageNotFound(id)))
}

pub(crate) fn fetch_user(conn: &Connection, id: Uuid) -> Result<Option<Identity>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawIdentity::from_row,
    )
    .optional()?;
  raw.map(RawIdentity::into_identity).transpose()
}

pub(crate) fn require_user(conn: &Connection, id: Uuid) -> Result<Identity> {
  fetch_user(conn, id)?.ok_or(Error::Core(CoreError::UserNotFound(id)))
}

fn insert_message(conn: &Connection, m: &Message) -> Result<()> {
  conn.execute(
    "INSERT INTO messages (
       message_id, sender_id, receiver_id, content, timestamp,
       parent_message_id, thread_root_id, is_edited, is_read
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      encode_uuid(m.message_id),
      encode_uuid(m.sender_id),
      encode_uuid(m.receiver_id),
      m.content,
      encode_dt(m.timestamp),
      m.parent_message_id.map(encode_uuid),
      m.thread_root_id.map(encode_uuid),
      m.is_edited,
      m.read,
    ],
  )?;
  Ok(())
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewIdentity) -> Result<Identity> {
    let identity = Identity {
      user_id:    Uuid::new_v4(),
      username:   input.validated_username()?,
      email:      input.email,
      role:       input.role,
      created_at: now(),
    };

    let identity = self
      .transact(move |tx| {
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![identity.username],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Err(CoreError::UsernameTaken(identity.username).into());
        }

        tx.execute(
          "INSERT INTO users (user_id, username, email, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(identity.user_id),
            identity.username,
            identity.email,
            encode_role(identity.role),
            encode_dt(identity.created_at),
          ],
        )?;
        Ok(identity)
      })
      .await?;

    tracing::debug!(user_id = %identity.user_id, username = %identity.username, "user added");
    Ok(identity)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<Identity>> {
    self.read(move |conn| fetch_user(conn, id)).await
  }

  async fn get_users(&self, ids: Vec<Uuid>) -> Result<Vec<Identity>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    self
      .read(move |conn| {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users WHERE user_id IN ({placeholders})"
        ))?;
        let raws = stmt
          .query_map(
            rusqlite::params_from_iter(ids.into_iter().map(encode_uuid)),
            RawIdentity::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawIdentity::into_identity).collect()
      })
      .await
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn send(&self, input: NewMessage) -> Result<Message> {
    validate_content(&input.content)?;

    let message = self
      .transact(move |tx| {
        let sender = require_user(tx, input.sender_id)?;
        require_user(tx, input.receiver_id)?;

        let thread_root_id = input
          .parent_message_id
          .map(|parent_id| require_message(tx, parent_id).map(|p| p.root_for_reply()))
          .transpose()?;

        let message = Message {
          message_id: Uuid::new_v4(),
          sender_id: input.sender_id,
          receiver_id: input.receiver_id,
          content: input.content,
          timestamp: now(),
          parent_message_id: input.parent_message_id,
          thread_root_id,
          is_edited: false,
          read: false,
        };

        insert_message(tx, &message)?;
        notify::on_message_created(tx, &message, &sender.username)?;
        Ok(message)
      })
      .await?;

    tracing::debug!(
      message_id = %message.message_id,
      thread_root_id = ?message.thread_root_id,
      "message sent"
    );
    Ok(message)
  }

  async fn edit(
    &self,
    message_id:  Uuid,
    editor_id:   Uuid,
    new_content: String,
  ) -> Result<Message> {
    let (message, changed) = self
      .transact(move |tx| {
        let old = require_message(tx, message_id)?;
        let editor = require_user(tx, editor_id)?;
        validate_content(&new_content)?;

        if old.content == new_content {
          return Ok((old, false));
        }

        tx.execute(
          "INSERT INTO message_history (history_id, message_id, old_content, editor_id, edited_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(Uuid::new_v4()),
            encode_uuid(message_id),
            old.content,
            encode_uuid(editor_id),
            encode_dt(now()),
          ],
        )?;

        tx.execute(
          "UPDATE messages SET content = ?1, is_edited = 1 WHERE message_id = ?2",
          rusqlite::params![new_content, encode_uuid(message_id)],
        )?;

        let updated = Message {
          content: new_content,
          is_edited: true,
          ..old.clone()
        };

        if editor_id != old.receiver_id {
          notify::on_message_edited(tx, &old, &updated, &editor.username)?;
        }
        Ok((updated, true))
      })
      .await?;

    if changed {
      tracing::debug!(%message_id, %editor_id, "message edited");
    } else {
      tracing::trace!(%message_id, "edit with unchanged content ignored");
    }
    Ok(message)
  }

  async fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
    self.read(move |conn| fetch_message(conn, id)).await
  }

  async fn get_thread(&self, message_id: Uuid) -> Result<Vec<Message>> {
    self
      .read(move |conn| {
        let root_id = require_message(conn, message_id)?.root_id();

        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE message_id = ?1 OR thread_root_id = ?1
           ORDER BY timestamp ASC, rowid ASC"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![encode_uuid(root_id)], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawMessage::into_message).collect()
      })
      .await
  }

  async fn list_messages(&self, filter: MessageFilter) -> Result<Vec<Message>> {
    filter.validate()?;

    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(user_id) = filter.participant {
      clauses.push("(sender_id = ? OR receiver_id = ?)");
      params.push(encode_uuid(user_id));
      params.push(encode_uuid(user_id));
    }
    match &filter.sender {
      Some(SenderFilter::Id(id)) => {
        clauses.push("sender_id = ?");
        params.push(encode_uuid(*id));
      }
      Some(SenderFilter::Username(name)) => {
        clauses.push("sender_id = (SELECT user_id FROM users WHERE username = ?)");
        params.push(name.clone());
      }
      None => {}
    }
    if let Some(start) = filter.start_date {
      clauses.push("timestamp >= ?");
      params.push(encode_dt(start));
    }
    if let Some(end) = filter.end_date {
      clauses.push("timestamp <= ?");
      params.push(encode_dt(end));
    }

    let predicate = if clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", clauses.join(" AND "))
    };

    let messages = self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages {predicate}
           ORDER BY timestamp ASC, rowid ASC"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params_from_iter(params), RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawMessage::into_message).collect::<Result<Vec<_>>>()
      })
      .await?;

    // Content search runs here: SQLite's LIKE only folds ASCII case.
    Ok(
      messages
        .into_iter()
        .filter(|m| filter.matches_search(&m.content))
        .collect(),
    )
  }

  async fn get_history(&self, message_id: Uuid) -> Result<Vec<MessageHistory>> {
    self
      .read(move |conn| {
        require_message(conn, message_id)?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {HISTORY_COLUMNS} FROM message_history
           WHERE message_id = ?1
           ORDER BY edited_at ASC, rowid ASC"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![encode_uuid(message_id)], RawHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawHistory::into_history).collect()
      })
      .await
  }

  async fn mark_read(&self, message_id: Uuid) -> Result<Message> {
    self
      .transact(move |tx| {
        let changed = tx.execute(
          "UPDATE messages SET is_read = 1 WHERE message_id = ?1",
          rusqlite::params![encode_uuid(message_id)],
        )?;
        if changed == 0 {
          return Err(CoreError::MessageNotFound(message_id).into());
        }
        require_message(tx, message_id)
      })
      .await
  }

  async fn list_unread(&self, user_id: Uuid) -> Result<Vec<UnreadMessage>> {
    self
      .read(move |conn| {
        require_user(conn, user_id)?;

        let mut stmt = conn.prepare(
          "SELECT message_id, sender_id, content, timestamp, parent_message_id, is_edited
           FROM messages
           WHERE receiver_id = ?1 AND is_read = 0
           ORDER BY rowid ASC",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![encode_uuid(user_id)], |row| {
            Ok(RawUnread {
              message_id:        row.get(0)?,
              sender_id:         row.get(1)?,
              content:           row.get(2)?,
              timestamp:         row.get(3)?,
              parent_message_id: row.get(4)?,
              is_edited:         row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawUnread::into_unread).collect()
      })
      .await
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn list_notifications(
    &self,
    user_id:     Uuid,
    unread_only: bool,
  ) -> Result<Vec<Notification>> {
    self
      .read(move |conn| {
        require_user(conn, user_id)?;
        notify::list_for_user(conn, user_id, unread_only)
      })
      .await
  }

  async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
    self.read(move |conn| notify::fetch(conn, id)).await
  }

  async fn mark_notification_read(&self, notification_id: Uuid) -> Result<Notification> {
    self
      .transact(move |tx| notify::mark_read(tx, notification_id))
      .await
  }

  // ── Cascade deletion ──────────────────────────────────────────────────────

  async fn delete_identity(&self, user_id: Uuid) -> Result<DeletionReport> {
    let report = self
      .transact(move |tx| cascade::delete_identity(tx, user_id))
      .await?;

    tracing::info!(
      %user_id,
      messages = report.messages,
      notifications = report.notifications,
      history = report.history,
      "identity deleted"
    );
    Ok(report)
  }
}
