//! Error type for `threadline-store-sqlite`.

use thiserror::Error;
use threadline_core::{Classify, ErrorKind};

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] threadline_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A mutating operation could not commit. Nothing was applied.
  #[error("transaction failed: {0}")]
  Transaction(#[source] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Transaction(_) => ErrorKind::TransactionFailure,
      Error::Database(_) | Error::Sqlite(_) | Error::Uuid(_) | Error::Decode(_) => {
        ErrorKind::Internal
      }
    }
  }
}
