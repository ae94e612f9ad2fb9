//! Error types for `threadline-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("message not found: {0}")]
  MessageNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("permission denied: {0}")]
  Permission(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure category, independent of any storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A referenced message, identity or notification does not exist.
  NotFound,
  /// Empty content, missing required field.
  Validation,
  /// The actor is not entitled to perform the operation.
  Permission,
  /// A unique value (e.g. a username) is already in use.
  Conflict,
  /// The atomic unit could not commit; nothing was applied.
  TransactionFailure,
  /// Anything else: decoding faults, read-side storage errors.
  Internal,
}

/// Implemented by every error type that crosses the [`crate::store`] seam,
/// so callers can react to a failure without knowing the backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::MessageNotFound(_)
      | Self::UserNotFound(_)
      | Self::NotificationNotFound(_) => ErrorKind::NotFound,
      Self::UsernameTaken(_) => ErrorKind::Conflict,
      Self::Validation(_) => ErrorKind::Validation,
      Self::Permission(_) => ErrorKind::Permission,
    }
  }
}
