//! Offline-first local replica of the GitHub repository catalog.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod github;

pub use error::{Result, StoreError, SyncError};
pub use github::{CachedGithubClient, Repository};
