//! Detached owner-table writes.
//!
//! Owner rows are written off the caller's path, so they may briefly lag the
//! repository rows. The tracker exposes whether any write is still pending
//! and lets a reader wait until all have landed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

use super::traits::LocalStore;
use crate::github::types::OwnerRecord;

#[derive(Debug, Default)]
pub struct OwnerWrites {
  pending: AtomicUsize,
  settled: Notify,
}

impl OwnerWrites {
  pub fn new() -> Self {
    Self::default()
  }

  /// Spawn the upsert without waiting for it.
  pub fn spawn<S: LocalStore>(self: &Arc<Self>, store: Arc<S>, owners: Vec<OwnerRecord>) {
    if owners.is_empty() {
      return;
    }
    self.pending.fetch_add(1, Ordering::SeqCst);
    let tracker = Arc::clone(self);

    tokio::spawn(async move {
      let count = owners.len();
      if let Err(e) = store.upsert_owners(owners).await {
        warn!(count, "Failed to store owners: {}", e);
      }
      if tracker.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
        tracker.settled.notify_waiters();
      }
    });
  }

  pub fn is_pending(&self) -> bool {
    self.pending.load(Ordering::SeqCst) > 0
  }

  /// Resolve once no owner write is pending.
  pub async fn settled(&self) {
    loop {
      let notified = self.settled.notified();
      tokio::pin!(notified);
      notified.as_mut().enable();
      if !self.is_pending() {
        return;
      }
      notified.await;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SqliteStorage;

  #[tokio::test]
  async fn test_settled_waits_for_spawned_write() {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let writes = Arc::new(OwnerWrites::new());
    assert!(!writes.is_pending());

    writes.spawn(
      Arc::clone(&store),
      vec![OwnerRecord {
        id: 1,
        username: "octocat".to_string(),
        avatar_url: "https://a/1".to_string(),
      }],
    );
    writes.settled().await;

    assert!(!writes.is_pending());
    assert_eq!(store.count_owners().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_empty_batch_is_not_pending() {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let writes = Arc::new(OwnerWrites::new());
    writes.spawn(store, Vec::new());
    assert!(!writes.is_pending());
    writes.settled().await;
  }
}
