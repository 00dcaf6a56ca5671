//! Seams between the sync engine, the remote API and local persistence.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::{Result, StoreError};
use crate::github::api_types::{ApiRepository, ApiSearchResponse};
use crate::github::types::{OwnerRecord, RepositoryRecord};

/// Stream that re-emits the complete result set after every relevant write.
pub type WatchStream<T> = BoxStream<'static, Result<T, StoreError>>;

/// Remote catalog reads.
///
/// Implementations consult connectivity before any I/O and never retry.
#[async_trait]
pub trait RemoteSource: Send + Sync + 'static {
  /// Up to one page of repositories with an id greater than `since`.
  async fn fetch_feed_page(&self, since: i64) -> Result<Vec<ApiRepository>>;

  /// One page (1-indexed) of search results.
  async fn search_page(&self, query: &str, page: u32) -> Result<ApiSearchResponse>;

  /// Complete record for one repository.
  async fn fetch_detail(&self, full_name: &str) -> Result<ApiRepository>;
}

/// Persisted pagination position for one search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCursor {
  pub query: String,
  pub next_page: Option<u32>,
}

/// Local replica of repositories, owners and query cursors.
///
/// Upserts replace the whole row. Nothing is ever evicted.
#[async_trait]
pub trait LocalStore: Send + Sync + 'static {
  async fn upsert_item(&self, item: RepositoryRecord) -> Result<(), StoreError>;

  async fn upsert_items(&self, items: Vec<RepositoryRecord>) -> Result<(), StoreError>;

  async fn upsert_owner(&self, owner: OwnerRecord) -> Result<(), StoreError>;

  async fn upsert_owners(&self, owners: Vec<OwnerRecord>) -> Result<(), StoreError>;

  async fn get_item_by_id(&self, id: i64) -> Result<Option<RepositoryRecord>, StoreError>;

  async fn get_owner_by_id(&self, id: i64) -> Result<Option<OwnerRecord>, StoreError>;

  async fn count_items(&self) -> Result<u64, StoreError>;

  async fn count_owners(&self) -> Result<u64, StoreError>;

  /// Highest repository id stored, `None` when empty.
  async fn max_item_id(&self) -> Result<Option<i64>, StoreError>;

  /// Id-ordered slice, optionally restricted to a language prefix.
  async fn items_window(
    &self,
    language_prefix: Option<String>,
    offset: usize,
    limit: usize,
  ) -> Result<Vec<RepositoryRecord>, StoreError>;

  /// Cursor row for `query`, matched case-insensitively.
  async fn get_cursor(&self, query: &str) -> Result<Option<QueryCursor>, StoreError>;

  async fn set_cursor(&self, query: &str, next_page: Option<u32>) -> Result<(), StoreError>;

  fn observe_all_items(&self) -> WatchStream<Vec<RepositoryRecord>>;

  /// Case-insensitive prefix match on `language`.
  fn observe_items_by_language_prefix(&self, prefix: &str) -> WatchStream<Vec<RepositoryRecord>>;

  /// Yields [`StoreError::NotFound`] while the id is absent.
  fn observe_item_by_id(&self, id: i64) -> WatchStream<RepositoryRecord>;
}
