//! Cached GitHub client: the single contract consumed by presentation code.

use color_eyre::Result as EyreResult;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info};

use crate::cache::{
  LoadTrigger, LocalStore, OwnerWritePolicy, OwnerWrites, PagedView, RemoteMediator, RemoteSource,
  SqliteStorage, StepFlights, StepOutcome,
};
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::github::client::GithubClient;
use crate::github::connectivity::ConnectivityProbe;
use crate::github::types::{OwnerRecord, Repository};

/// Search expression used as the cursor key for a language filter.
pub fn language_query(language: &str) -> String {
  format!("language:{}", language.trim())
}

/// GitHub client backed by a local replica.
///
/// Reads are local-first and never touch the network. Fetch operations write
/// through to the store and report classified failures unchanged. Owner rows
/// from `refresh`, `fetch_next_page` and `fetch_details` are written in the
/// background; see [`CachedGithubClient::owner_sync_pending`].
pub struct CachedGithubClient<S: LocalStore = SqliteStorage, R: RemoteSource = GithubClient> {
  store: Arc<S>,
  remote: Arc<R>,
  owner_writes: Arc<OwnerWrites>,
  flights: Arc<StepFlights>,
  page_size: usize,
}

impl CachedGithubClient<SqliteStorage, GithubClient> {
  /// Create a client using the configured database and API settings.
  pub fn new(config: &Config, probe: Arc<dyn ConnectivityProbe>) -> EyreResult<Self> {
    let remote = GithubClient::new(&config.github, Config::get_api_token(), probe)?;
    let storage = SqliteStorage::open(&config.database_path()?)?;

    Ok(Self::with_parts(Arc::new(storage), Arc::new(remote)).with_page_size(config.page_size))
  }
}

impl<S: LocalStore, R: RemoteSource> CachedGithubClient<S, R> {
  pub fn with_parts(store: Arc<S>, remote: Arc<R>) -> Self {
    Self {
      store,
      remote,
      owner_writes: Arc::new(OwnerWrites::new()),
      flights: Arc::new(StepFlights::new()),
      page_size: 50,
    }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size;
    self
  }

  fn mediator(&self, query: impl Into<String>) -> RemoteMediator<S, R> {
    RemoteMediator::new(
      Arc::clone(&self.store),
      Arc::clone(&self.remote),
      query,
      Arc::clone(&self.owner_writes),
      Arc::clone(&self.flights),
    )
  }

  /// Every cached repository in id order, re-emitted after each write.
  pub fn observe_all(&self) -> BoxStream<'static, Result<Vec<Repository>>> {
    self
      .store
      .observe_all_items()
      .map(|batch| Ok(batch?.into_iter().map(Repository::from).collect()))
      .boxed()
  }

  /// Cached repositories whose language starts with `prefix` (any case).
  pub fn observe_by_language(&self, prefix: &str) -> BoxStream<'static, Result<Vec<Repository>>> {
    self
      .store
      .observe_items_by_language_prefix(prefix)
      .map(|batch| Ok(batch?.into_iter().map(Repository::from).collect()))
      .boxed()
  }

  /// Cached repository, or `None`. Never fetches.
  pub async fn get_by_id(&self, id: i64) -> Result<Option<Repository>> {
    Ok(self.store.get_item_by_id(id).await?.map(Repository::from))
  }

  /// One cached repository; yields `NoData` while `id` is not cached.
  pub fn observe_by_id(&self, id: i64) -> BoxStream<'static, Result<Repository>> {
    self
      .store
      .observe_item_by_id(id)
      .map(|record| Ok(Repository::from(record?)))
      .boxed()
  }

  /// Fetch the first feed page.
  pub async fn refresh(&self) -> Result<()> {
    self
      .mediator("")
      .with_owner_policy(OwnerWritePolicy::Background)
      .load(LoadTrigger::Initial)
      .await?;
    Ok(())
  }

  /// Fetch the feed page after the highest cached id.
  pub async fn fetch_next_page(&self) -> Result<()> {
    self
      .mediator("")
      .with_owner_policy(OwnerWritePolicy::Background)
      .load(LoadTrigger::Forward)
      .await?;
    Ok(())
  }

  /// Fetch and store the full record for a cached repository.
  ///
  /// Returns the fresh record without waiting on a read-back.
  pub async fn fetch_details(&self, id: i64) -> Result<Repository> {
    let Some(existing) = self.store.get_item_by_id(id).await? else {
      error!(id, "Repository not found in local cache");
      return Err(SyncError::NoData);
    };

    let detailed = self.remote.fetch_detail(&existing.full_name).await?;
    let repository = detailed.to_domain();
    let (record, owner) = detailed.deconstruct();

    self.store.upsert_item(record).await?;
    self
      .owner_writes
      .spawn(Arc::clone(&self.store), vec![owner]);

    info!(id, full_name = %existing.full_name, "Stored repository details");
    Ok(repository)
  }

  /// Fetch the next search page for `language`.
  ///
  /// Once the search page limit is reached this succeeds without a remote
  /// call, distinguishing "no more pages" from a failed request.
  pub async fn fetch_by_language(&self, language: &str) -> Result<()> {
    if language.trim().is_empty() {
      return Err(SyncError::NoData);
    }

    let outcome = self
      .mediator(language_query(language))
      .load(LoadTrigger::Forward)
      .await?;

    if outcome == StepOutcome::Exhausted {
      info!(language, "Reached search page limit, no further pages will be fetched");
    }
    Ok(())
  }

  pub async fn is_empty(&self) -> Result<bool> {
    Ok(self.store.count_items().await? == 0)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(self.store.count_items().await?)
  }

  /// Owner row as last persisted; may lag a just-completed fetch.
  pub async fn get_owner(&self, id: i64) -> Result<Option<OwnerRecord>> {
    Ok(self.store.get_owner_by_id(id).await?)
  }

  /// Paged listing. An empty `language` pages the feed; anything else pages
  /// the language search and filters the cache by that language.
  pub fn paginated_view(&self, language: &str) -> PagedView<S, R> {
    let language = language.trim();
    if language.is_empty() {
      PagedView::new(Arc::clone(&self.store), self.mediator(""), None, self.page_size)
    } else {
      PagedView::new(
        Arc::clone(&self.store),
        self.mediator(language_query(language)),
        Some(language.to_string()),
        self.page_size,
      )
    }
  }

  /// Whether a background owner write has not landed yet.
  pub fn owner_sync_pending(&self) -> bool {
    self.owner_writes.is_pending()
  }

  /// Wait until every background owner write has landed.
  pub async fn owner_writes_settled(&self) {
    self.owner_writes.settled().await
  }
}

impl<S: LocalStore, R: RemoteSource> Clone for CachedGithubClient<S, R> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      remote: Arc::clone(&self.remote),
      owner_writes: Arc::clone(&self.owner_writes),
      flights: Arc::clone(&self.flights),
      page_size: self.page_size,
    }
  }
}
