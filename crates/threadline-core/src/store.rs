//! The `MessageStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `threadline-store-sqlite`). Higher layers (`threadline-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Classify,
  identity::{Identity, NewIdentity},
  message::{Message, MessageFilter, MessageHistory, NewMessage, UnreadMessage},
  notification::Notification,
};

/// Rows removed directly by
/// [`MessageStore::delete_identity`]. Rows removed by structural cascade
/// (history and notifications of deleted messages, replies) are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
  pub messages:      usize,
  pub notifications: usize,
  pub history:       usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Threadline storage backend.
///
/// Every mutating method is one atomic, isolated unit: either all of its
/// effects (including derived notifications) are persisted, or none are.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Register a new identity. Fails if the username is blank or taken.
  fn add_user(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Retrieve an identity by UUID. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Bulk lookup; unknown ids are skipped.
  fn get_users(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Persist a new message, compute its thread root, and notify the
  /// receiver.
  fn send(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Replace a message's content, recording the old content in its history
  /// and notifying the receiver. Unchanged content is a no-op.
  fn edit(
    &self,
    message_id: Uuid,
    editor_id: Uuid,
    new_content: String,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Retrieve a message by UUID. Returns `None` if not found.
  fn get_message(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send + '_;

  /// Every message in the thread containing `message_id`, oldest first.
  fn get_thread(
    &self,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Messages matching every criterion in `filter`, oldest first. An unknown
  /// sender username matches nothing.
  fn list_messages(
    &self,
    filter: MessageFilter,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// The edit log of a message, oldest edit first.
  fn get_history(
    &self,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MessageHistory>, Self::Error>> + Send + '_;

  /// Flag a message as read by its receiver.
  fn mark_read(
    &self,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Messages addressed to `user_id` that have not been read.
  fn list_unread(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UnreadMessage>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Notifications addressed to `user_id`, newest first.
  fn list_notifications(
    &self,
    user_id: Uuid,
    unread_only: bool,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  /// Retrieve a notification by UUID. Returns `None` if not found.
  fn get_notification(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Notification>, Self::Error>> + Send + '_;

  fn mark_notification_read(
    &self,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  // ── Cascade deletion ──────────────────────────────────────────────────

  /// Remove an identity and its entire footprint in one transaction.
  fn delete_identity(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<DeletionReport, Self::Error>> + Send + '_;
}
