//! One in-flight task per key; later callers join the running task.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

type Flight<T> = Shared<BoxFuture<'static, T>>;

pub struct SingleFlight<T: Clone> {
  inflight: Mutex<HashMap<String, (u64, Flight<T>)>>,
  next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
  T: Clone + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      inflight: Mutex::new(HashMap::new()),
      next_id: AtomicU64::new(0),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, (u64, Flight<T>)>> {
    // The map holds no invariant a panicking holder could break
    self.inflight.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Run `start()` unless a task for `key` is already running, in which case
  /// wait for that one and return its output.
  ///
  /// Dropping the caller that started a task unregisters it, so the next
  /// caller starts fresh instead of resuming the abandoned one.
  pub async fn run<F>(&self, key: &str, start: F) -> T
  where
    F: FnOnce() -> BoxFuture<'static, T>,
  {
    let (id, flight, _leader) = {
      let mut inflight = self.lock();
      match inflight.get(key) {
        Some((id, flight)) => {
          debug!(key, "joining in-flight task");
          (*id, flight.clone(), None)
        }
        None => {
          let id = self.next_id.fetch_add(1, Ordering::Relaxed);
          let flight = start().shared();
          inflight.insert(key.to_string(), (id, flight.clone()));
          let leader = LeaderGuard {
            flights: self,
            key: key.to_string(),
            id,
          };
          (id, flight, Some(leader))
        }
      }
    };

    let output = flight.await;
    self.remove(key, id);
    output
  }

  fn remove(&self, key: &str, id: u64) {
    let mut inflight = self.lock();
    if inflight.get(key).is_some_and(|(current, _)| *current == id) {
      inflight.remove(key);
    }
  }

  pub fn is_in_flight(&self, key: &str) -> bool {
    self.lock().contains_key(key)
  }
}

/// Unregisters the leader's task when the leader goes away, finished or not.
struct LeaderGuard<'a, T>
where
  T: Clone + Send + Sync + 'static,
{
  flights: &'a SingleFlight<T>,
  key: String,
  id: u64,
}

impl<T> Drop for LeaderGuard<'_, T>
where
  T: Clone + Send + Sync + 'static,
{
  fn drop(&mut self) {
    self.flights.remove(&self.key, self.id);
  }
}

impl<T> Default for SingleFlight<T>
where
  T: Clone + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test]
  async fn test_concurrent_callers_share_one_run() {
    let flights = SingleFlight::<usize>::new();
    let runs = Arc::new(AtomicUsize::new(0));

    let start = |runs: Arc<AtomicUsize>| {
      move || {
        async move {
          tokio::time::sleep(Duration::from_millis(50)).await;
          runs.fetch_add(1, Ordering::SeqCst) + 1
        }
        .boxed()
      }
    };

    let (a, b) = tokio::join!(
      flights.run("language:rust", start(Arc::clone(&runs))),
      flights.run("language:rust", start(Arc::clone(&runs))),
    );
    assert_eq!(a, 1);
    assert_eq!(b, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!flights.is_in_flight("language:rust"));
  }

  #[tokio::test]
  async fn test_sequential_callers_run_again() {
    let flights = SingleFlight::<u32>::new();
    let first = flights.run("", || async { 1 }.boxed()).await;
    let second = flights.run("", || async { 2 }.boxed()).await;
    assert_eq!((first, second), (1, 2));
  }

  #[tokio::test]
  async fn test_cancelled_leader_unregisters_task() {
    let flights = SingleFlight::<u32>::new();

    let slow = flights.run("", || {
      async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        1
      }
      .boxed()
    });
    assert!(tokio::time::timeout(Duration::from_millis(10), slow)
      .await
      .is_err());
    assert!(!flights.is_in_flight(""));

    let next = flights.run("", || async { 2 }.boxed()).await;
    assert_eq!(next, 2);
  }

  #[tokio::test]
  async fn test_distinct_keys_do_not_join() {
    let flights = SingleFlight::<&'static str>::new();
    let (a, b) = tokio::join!(
      flights.run("a", || async { "a" }.boxed()),
      flights.run("b", || async { "b" }.boxed()),
    );
    assert_eq!((a, b), ("a", "b"));
  }
}
