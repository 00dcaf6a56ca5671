//! Scripted remote source for engine tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

use super::traits::RemoteSource;
use crate::error::{Result, SyncError};
use crate::github::api_types::{ApiRepository, ApiSearchResponse};
use crate::github::mapper::fixtures;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
  Feed { since: i64 },
  Search { query: String, page: u32 },
  Detail { full_name: String },
}

/// Replays queued responses in order. An empty queue answers with an empty
/// page; an unknown detail answers `NetworkError("Not Found")`.
#[derive(Default)]
pub struct FakeRemote {
  feed: Mutex<VecDeque<Result<Vec<ApiRepository>>>>,
  search: Mutex<VecDeque<Result<ApiSearchResponse>>>,
  details: Mutex<HashMap<String, ApiRepository>>,
  calls: Mutex<Vec<RemoteCall>>,
  delay: Option<Duration>,
}

impl FakeRemote {
  pub fn new() -> Self {
    Self::default()
  }

  /// Hold every response for `delay`, so concurrent callers overlap.
  pub fn with_delay(delay: Duration) -> Self {
    Self {
      delay: Some(delay),
      ..Self::default()
    }
  }

  pub fn push_feed(&self, page: Result<Vec<ApiRepository>>) {
    self.feed.lock().unwrap().push_back(page);
  }

  pub fn push_search(&self, page: Result<ApiSearchResponse>) {
    self.search.lock().unwrap().push_back(page);
  }

  pub fn insert_detail(&self, repo: ApiRepository) {
    self
      .details
      .lock()
      .unwrap()
      .insert(repo.full_name.clone(), repo);
  }

  pub fn calls(&self) -> Vec<RemoteCall> {
    self.calls.lock().unwrap().clone()
  }

  async fn record(&self, call: RemoteCall) {
    self.calls.lock().unwrap().push(call);
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
  }
}

#[async_trait]
impl RemoteSource for FakeRemote {
  async fn fetch_feed_page(&self, since: i64) -> Result<Vec<ApiRepository>> {
    self.record(RemoteCall::Feed { since }).await;
    self.feed.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
  }

  async fn search_page(&self, query: &str, page: u32) -> Result<ApiSearchResponse> {
    self
      .record(RemoteCall::Search {
        query: query.to_string(),
        page,
      })
      .await;
    self.search.lock().unwrap().pop_front().unwrap_or_else(|| {
      Ok(ApiSearchResponse {
        total_count: 0,
        incomplete_results: false,
        items: Vec::new(),
      })
    })
  }

  async fn fetch_detail(&self, full_name: &str) -> Result<ApiRepository> {
    self
      .record(RemoteCall::Detail {
        full_name: full_name.to_string(),
      })
      .await;
    self
      .details
      .lock()
      .unwrap()
      .get(full_name)
      .cloned()
      .ok_or_else(|| SyncError::NetworkError("Not Found".to_string()))
  }
}

/// Feed page with one summary record per id.
pub fn feed_page(ids: Range<i64>) -> Vec<ApiRepository> {
  ids.map(fixtures::summary).collect()
}

/// Search page whose items all carry `language`.
pub fn search_page(ids: Range<i64>, language: &str) -> ApiSearchResponse {
  let items: Vec<ApiRepository> = ids.map(|id| fixtures::with_language(id, language)).collect();
  ApiSearchResponse {
    total_count: items.len() as u64,
    incomplete_results: false,
    items,
  }
}
