//! Sync engine: local replica, pagination cursors and remote back-fill.
//!
//! This module provides:
//! - A SQLite-backed local store with reactive, full-result-set streams
//! - Derived (feed) and stored (search) pagination cursors
//! - A pagination mediator with single-flight steps per query
//! - A paged view that drives the mediator one window at a time

mod background;
mod cursor;
mod mediator;
mod pager;
mod single_flight;
mod storage;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use background::OwnerWrites;
pub use cursor::{is_at_or_past_ceiling, CursorStrategy, PageKey, SEARCH_PAGE_CEILING};
pub use mediator::{flight_key, LoadTrigger, OwnerWritePolicy, RemoteMediator, StepFlights, StepOutcome};
pub use pager::{LoadResult, PagedView};
pub use single_flight::SingleFlight;
pub use storage::SqliteStorage;
pub use traits::{LocalStore, QueryCursor, RemoteSource, WatchStream};
