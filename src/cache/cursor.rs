//! Pagination cursors for the default feed and for search queries.

use super::traits::LocalStore;
use crate::error::StoreError;

/// Highest page the search API serves for any query. Pages stop one short
/// of it, so at most 900 results are reachable per query.
pub const SEARCH_PAGE_CEILING: u32 = 10;

/// Whether a search cursor has reached the page ceiling. Applied to the next
/// page a query would request; once true, no further remote calls are made.
pub fn is_at_or_past_ceiling(page: u32) -> bool {
  page >= SEARCH_PAGE_CEILING
}

/// Key handed to the remote source for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKey {
  /// Feed listing: repositories with an id greater than this
  Since(i64),
  /// Search listing: 1-indexed page number
  Page(u32),
}

/// How a query tracks its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStrategy {
  /// Position is the highest stored id; nothing is persisted for the query.
  Derived,
  /// Position is an explicit next-page number in `remote_pages`.
  Stored,
}

impl CursorStrategy {
  /// Empty queries are the id-ordered feed, anything else is a search.
  pub fn for_query(query: &str) -> Self {
    if query.trim().is_empty() {
      CursorStrategy::Derived
    } else {
      CursorStrategy::Stored
    }
  }

  pub fn initial_key(self) -> PageKey {
    match self {
      CursorStrategy::Derived => PageKey::Since(0),
      CursorStrategy::Stored => PageKey::Page(1),
    }
  }

  /// Key for the next forward page, or `None` when the sequence is exhausted.
  /// An empty feed has no id to advance from and is exhausted until an
  /// initial load stores something.
  pub async fn forward_key<S: LocalStore + ?Sized>(
    self,
    store: &S,
    query: &str,
  ) -> Result<Option<PageKey>, StoreError> {
    match self {
      CursorStrategy::Derived => {
        Ok(store.max_item_id().await?.map(PageKey::Since))
      }
      CursorStrategy::Stored => {
        let page = store
          .get_cursor(query)
          .await?
          .and_then(|c| c.next_page)
          .unwrap_or(1);
        if is_at_or_past_ceiling(page) {
          Ok(None)
        } else {
          Ok(Some(PageKey::Page(page)))
        }
      }
    }
  }

  /// Record that `key` was fetched with `fetched` results. Returns whether the
  /// sequence has reached its end.
  pub async fn advance<S: LocalStore + ?Sized>(
    self,
    store: &S,
    query: &str,
    key: PageKey,
    fetched: usize,
  ) -> Result<bool, StoreError> {
    match (self, key) {
      (CursorStrategy::Stored, PageKey::Page(page)) => {
        let next_page = page + 1;
        store.set_cursor(query, Some(next_page)).await?;
        Ok(fetched == 0 || is_at_or_past_ceiling(next_page))
      }
      _ => Ok(fetched == 0),
    }
  }
}
