//! Error types for `tally-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Returned both when the business does not exist and when another user
  /// owns it.
  #[error("access to business {0} is not authorized")]
  Unauthorized(Uuid),

  #[error("unknown report kind: {0:?}")]
  UnknownReport(String),

  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error coming out of a [`LedgerStore`](crate::store::LedgerStore).
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
