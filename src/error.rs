//! Classified failures surfaced by the sync engine.

use std::sync::Arc;
use thiserror::Error;

/// Message used when the remote host cannot be resolved.
pub const UNRESOLVED_ADDRESS: &str = "Unable to resolve address. Is your internet connection working?";

/// Errors returned by the remote source, the coordinator and the facade.
///
/// Cloneable so callers that join an in-flight pagination step receive the
/// same outcome as the caller that started it.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
  /// The connectivity probe reported the network unreachable; no I/O happened.
  #[error("no network connection")]
  NoConnection,

  /// The remote answered unsuccessfully, or the host could not be resolved.
  #[error("network error: {0}")]
  NetworkError(String),

  /// A local precondition is missing (unknown id, blank filter).
  #[error("no data")]
  NoData,

  /// Unclassified fault, cause preserved for diagnostics.
  #[error("unexpected error: {0}")]
  Unknown(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl SyncError {
  pub fn unknown<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    SyncError::Unknown(Arc::new(err))
  }
}

/// Errors raised by the local store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("repository {0} not found in cache")]
  NotFound(i64),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("storage task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("lock poisoned: {0}")]
  Lock(String),
}

impl From<StoreError> for SyncError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(_) => SyncError::NoData,
      other => SyncError::unknown(other),
    }
  }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
