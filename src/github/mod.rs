//! GitHub repository catalog: wire types, HTTP client and the cached facade.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod connectivity;
pub mod mapper;
pub mod types;

pub use cached_client::{language_query, CachedGithubClient};
pub use client::GithubClient;
pub use connectivity::{ConnectivityProbe, ManualProbe, Reachability};
pub use types::{OwnerRecord, Repository, RepositoryRecord};
