//! Pagination state machine that back-fills the local store from the remote.
//!
//! A step picks a page key from the query's [`CursorStrategy`], fetches that
//! page, writes repositories and owners, then advances the cursor. Failures
//! end the step; nothing here retries.

use futures::FutureExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::background::OwnerWrites;
use super::cursor::{CursorStrategy, PageKey};
use super::single_flight::SingleFlight;
use super::traits::{LocalStore, RemoteSource};
use crate::error::Result;
use crate::github::api_types::ApiRepository;
use crate::github::mapper::deconstruct_all;

/// Trigger issued by a windowed loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTrigger {
  Initial,
  Forward,
  Backward,
}

/// Result of one successful step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
  /// A page was fetched and stored.
  Advanced {
    key: PageKey,
    fetched: usize,
    end_of_data: bool,
  },
  /// No remote call was made; there is nothing further in this direction.
  Exhausted,
}

impl StepOutcome {
  pub fn end_of_data(&self) -> bool {
    match self {
      StepOutcome::Advanced { end_of_data, .. } => *end_of_data,
      StepOutcome::Exhausted => true,
    }
  }
}

/// How owner rows from a fetched page are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerWritePolicy {
  /// Written before the step completes
  Await,
  /// Handed to [`OwnerWrites`] and not awaited
  Background,
}

pub type StepFlights = SingleFlight<Result<StepOutcome>>;

/// Key under which steps for `query` are deduplicated.
pub fn flight_key(query: &str) -> String {
  query.trim().to_lowercase()
}

pub struct RemoteMediator<S: LocalStore, R: RemoteSource> {
  store: Arc<S>,
  remote: Arc<R>,
  query: String,
  strategy: CursorStrategy,
  owner_policy: OwnerWritePolicy,
  owner_writes: Arc<OwnerWrites>,
  flights: Arc<StepFlights>,
}

impl<S: LocalStore, R: RemoteSource> RemoteMediator<S, R> {
  pub fn new(
    store: Arc<S>,
    remote: Arc<R>,
    query: impl Into<String>,
    owner_writes: Arc<OwnerWrites>,
    flights: Arc<StepFlights>,
  ) -> Self {
    let query = query.into();
    Self {
      strategy: CursorStrategy::for_query(&query),
      store,
      remote,
      query,
      owner_policy: OwnerWritePolicy::Await,
      owner_writes,
      flights,
    }
  }

  pub fn with_owner_policy(mut self, policy: OwnerWritePolicy) -> Self {
    self.owner_policy = policy;
    self
  }

  pub fn with_strategy(mut self, strategy: CursorStrategy) -> Self {
    self.strategy = strategy;
    self
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  /// Run one pagination step.
  ///
  /// Only one step per query runs at a time; a caller arriving while one is
  /// in flight receives that step's outcome instead of starting another.
  pub async fn load(&self, trigger: LoadTrigger) -> Result<StepOutcome> {
    if trigger == LoadTrigger::Backward {
      // The feed only grows forward; there is never anything to prepend
      return Ok(StepOutcome::Exhausted);
    }

    let step = self.clone();
    self
      .flights
      .run(&flight_key(&self.query), move || {
        async move { step.run(trigger).await }.boxed()
      })
      .await
  }

  async fn run(self, trigger: LoadTrigger) -> Result<StepOutcome> {
    let key = match trigger {
      LoadTrigger::Initial => self.strategy.initial_key(),
      LoadTrigger::Forward => {
        match self.strategy.forward_key(&*self.store, &self.query).await? {
          Some(key) => key,
          None => {
            info!(query = %self.query, "No further pages, not fetching");
            return Ok(StepOutcome::Exhausted);
          }
        }
      }
      LoadTrigger::Backward => return Ok(StepOutcome::Exhausted),
    };

    debug!(query = %self.query, ?trigger, ?key, "loading page");
    let items = self.fetch(key).await.inspect_err(|e| {
      warn!(query = %self.query, ?key, "Page load failed: {}", e);
    })?;
    let fetched = items.len();

    let (repositories, owners) = deconstruct_all(items);
    match self.owner_policy {
      OwnerWritePolicy::Await => self.store.upsert_owners(owners).await?,
      OwnerWritePolicy::Background => self.owner_writes.spawn(Arc::clone(&self.store), owners),
    }
    self.store.upsert_items(repositories).await?;

    let end_of_data = self
      .strategy
      .advance(&*self.store, &self.query, key, fetched)
      .await?;

    info!(query = %self.query, ?key, fetched, end_of_data, "Stored page");
    Ok(StepOutcome::Advanced {
      key,
      fetched,
      end_of_data,
    })
  }

  async fn fetch(&self, key: PageKey) -> Result<Vec<ApiRepository>> {
    match key {
      PageKey::Since(since) => self.remote.fetch_feed_page(since).await,
      PageKey::Page(page) => Ok(self.remote.search_page(&self.query, page).await?.items),
    }
  }
}

impl<S: LocalStore, R: RemoteSource> Clone for RemoteMediator<S, R> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      remote: Arc::clone(&self.remote),
      query: self.query.clone(),
      strategy: self.strategy,
      owner_policy: self.owner_policy,
      owner_writes: Arc::clone(&self.owner_writes),
      flights: Arc::clone(&self.flights),
    }
  }
}
