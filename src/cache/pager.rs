//! Windowed loading over the local store, back-filled by the mediator.

use std::sync::Arc;

use super::mediator::{LoadTrigger, RemoteMediator};
use super::traits::{LocalStore, RemoteSource};
use crate::error::SyncError;
use crate::github::types::Repository;

/// Outcome reported for each requested window.
#[derive(Debug, Clone)]
pub enum LoadResult {
  Success { end_of_data: bool },
  Error(SyncError),
}

impl LoadResult {
  pub fn is_error(&self) -> bool {
    matches!(self, LoadResult::Error(_))
  }
}

/// Paged, id-ordered listing of cached repositories.
///
/// Every `load` calls the mediator exactly once and then reads the next window
/// from the local store, so cached rows stay visible when the remote fails.
pub struct PagedView<S: LocalStore, R: RemoteSource> {
  store: Arc<S>,
  mediator: RemoteMediator<S, R>,
  language_prefix: Option<String>,
  page_size: usize,
  items: Vec<Repository>,
  end_of_data: bool,
}

impl<S: LocalStore, R: RemoteSource> PagedView<S, R> {
  pub fn new(
    store: Arc<S>,
    mediator: RemoteMediator<S, R>,
    language_prefix: Option<String>,
    page_size: usize,
  ) -> Self {
    Self {
      store,
      mediator,
      language_prefix,
      page_size: page_size.max(1),
      items: Vec::new(),
      end_of_data: false,
    }
  }

  pub async fn load(&mut self, trigger: LoadTrigger) -> LoadResult {
    let result = match self.mediator.load(trigger).await {
      Ok(outcome) => LoadResult::Success {
        end_of_data: outcome.end_of_data(),
      },
      Err(e) => LoadResult::Error(e),
    };

    match trigger {
      LoadTrigger::Backward => return result,
      LoadTrigger::Initial => {
        self.items.clear();
        self.end_of_data = false;
      }
      LoadTrigger::Forward => {}
    }

    if let Err(e) = self.read_window().await {
      return LoadResult::Error(e);
    }
    if let LoadResult::Success { end_of_data } = result {
      self.end_of_data = end_of_data;
    }
    result
  }

  async fn read_window(&mut self) -> Result<(), SyncError> {
    let rows = self
      .store
      .items_window(self.language_prefix.clone(), self.items.len(), self.page_size)
      .await?;
    self.items.extend(rows.into_iter().map(Repository::from));
    Ok(())
  }

  /// Everything loaded so far, in id order.
  pub fn items(&self) -> &[Repository] {
    &self.items
  }

  /// Whether the remote has reported the end of this listing.
  pub fn is_end_of_data(&self) -> bool {
    self.end_of_data
  }

  pub fn query(&self) -> &str {
    self.mediator.query()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::background::OwnerWrites;
  use crate::cache::mediator::StepFlights;
  use crate::cache::testing::{feed_page, search_page, FakeRemote, RemoteCall};
  use crate::cache::SqliteStorage;
  use crate::github::mapper::deconstruct_all;

  fn view(
    store: &Arc<SqliteStorage>,
    remote: &Arc<FakeRemote>,
    query: &str,
    prefix: Option<&str>,
    page_size: usize,
  ) -> PagedView<SqliteStorage, FakeRemote> {
    let mediator = RemoteMediator::new(
      Arc::clone(store),
      Arc::clone(remote),
      query,
      Arc::new(OwnerWrites::new()),
      Arc::new(StepFlights::new()),
    );
    PagedView::new(Arc::clone(store), mediator, prefix.map(String::from), page_size)
  }

  #[tokio::test]
  async fn test_feed_windows_grow_in_id_order() {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let remote = Arc::new(FakeRemote::new());
    remote.push_feed(Ok(feed_page(0..100)));
    remote.push_feed(Ok(feed_page(100..200)));

    let mut view = view(&store, &remote, "", None, 50);
    assert!(matches!(
      view.load(LoadTrigger::Initial).await,
      LoadResult::Success { end_of_data: false }
    ));
    assert_eq!(view.items().len(), 50);
    assert_eq!(view.items()[0].id, 0);

    view.load(LoadTrigger::Forward).await;
    assert_eq!(view.items().len(), 100);
    assert_eq!(view.items()[99].id, 99);
    assert_eq!(
      remote.calls(),
      vec![RemoteCall::Feed { since: 0 }, RemoteCall::Feed { since: 99 }]
    );
  }

  #[tokio::test]
  async fn test_each_window_calls_mediator_once() {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let remote = Arc::new(FakeRemote::new());
    remote.push_feed(Ok(feed_page(0..5)));
    let mut view = view(&store, &remote, "", None, 10);

    view.load(LoadTrigger::Initial).await;
    view.load(LoadTrigger::Forward).await;
    view.load(LoadTrigger::Backward).await;
    assert_eq!(remote.calls().len(), 2);
  }

  #[tokio::test]
  async fn test_offline_initial_still_shows_cached_rows() {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    store
      .upsert_items(deconstruct_all(feed_page(0..5)).0)
      .await
      .unwrap();
    let remote = Arc::new(FakeRemote::new());
    remote.push_feed(Err(SyncError::NoConnection));

    let mut view = view(&store, &remote, "", None, 50);
    let result = view.load(LoadTrigger::Initial).await;
    assert!(matches!(result, LoadResult::Error(SyncError::NoConnection)));
    assert_eq!(view.items().len(), 5);
    assert!(!view.is_end_of_data());
  }

  #[tokio::test]
  async fn test_search_view_filters_by_language() {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    store
      .upsert_items(deconstruct_all(feed_page(0..5)).0)
      .await
      .unwrap();
    let remote = Arc::new(FakeRemote::new());
    remote.push_search(Ok(search_page(10..20, "Kotlin")));

    let mut view = view(&store, &remote, "language:kotlin", Some("kotlin"), 50);
    view.load(LoadTrigger::Initial).await;
    assert_eq!(view.items().len(), 10);
    assert!(view
      .items()
      .iter()
      .all(|r| r.language.as_deref() == Some("Kotlin")));
  }

  #[tokio::test]
  async fn test_backward_reports_end_of_data() {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let remote = Arc::new(FakeRemote::new());
    let mut view = view(&store, &remote, "", None, 50);

    let result = view.load(LoadTrigger::Backward).await;
    assert!(matches!(result, LoadResult::Success { end_of_data: true }));
    assert!(remote.calls().is_empty());
  }
}
