//! Error type for `tally-store-sqlite`.

use tally_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("amount parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  /// A record was written against a business that does not exist.
  #[error("business not found: {0}")]
  NotFound(uuid::Uuid),
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Error::DuplicateEmail(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
