use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result as EyreResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::error::Error as _;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

use crate::cache::RemoteSource;
use crate::config::GithubConfig;
use crate::error::{Result, SyncError, UNRESOLVED_ADDRESS};
use crate::github::api_types::{ApiRepository, ApiSearchResponse};
use crate::github::connectivity::ConnectivityProbe;

/// Results per search page. The search API serves at most 100 per page.
pub const SEARCH_PAGE_SIZE: u32 = 100;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// GitHub REST API client
#[derive(Clone)]
pub struct GithubClient {
  http: reqwest::Client,
  base_url: Url,
  probe: Arc<dyn ConnectivityProbe>,
}

impl GithubClient {
  pub fn new(
    config: &GithubConfig,
    token: Option<String>,
    probe: Arc<dyn ConnectivityProbe>,
  ) -> EyreResult<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
    headers.insert(
      "X-GitHub-Api-Version",
      HeaderValue::from_str(&config.api_version)
        .map_err(|e| eyre!("Invalid API version header {:?}: {}", config.api_version, e))?,
    );
    if let Some(token) = token {
      let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| eyre!("Invalid GitHub token: {}", e))?;
      value.set_sensitive(true);
      headers.insert(AUTHORIZATION, value);
    }

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .user_agent(config.user_agent.clone())
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    // Url::join drops the last path segment unless the base ends with '/'
    let base = if config.base_url.ends_with('/') {
      config.base_url.clone()
    } else {
      format!("{}/", config.base_url)
    };
    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid GitHub base URL {}: {}", config.base_url, e))?;

    Ok(Self {
      http,
      base_url,
      probe,
    })
  }

  /// Issue one GET and classify the outcome.
  async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    if !self.probe.snapshot().is_online() {
      debug!(path, "skipping request, network unreachable");
      return Err(SyncError::NoConnection);
    }

    let url = self.base_url.join(path).map_err(SyncError::unknown)?;

    let response = self
      .http
      .get(url)
      .query(query)
      .send()
      .await
      .map_err(classify_transport_error)?;

    let status = response.status();
    if !status.is_success() {
      error!(%status, path, "GitHub request failed");
      let reason = status.canonical_reason().unwrap_or("Unknown status");
      return Err(SyncError::NetworkError(reason.to_string()));
    }

    let body = response.bytes().await.map_err(classify_transport_error)?;
    serde_json::from_slice(&body).map_err(|e| {
      error!(path, "Failed to parse GitHub response: {}", e);
      SyncError::unknown(e)
    })
  }
}

#[async_trait]
impl RemoteSource for GithubClient {
  async fn fetch_feed_page(&self, since: i64) -> Result<Vec<ApiRepository>> {
    self
      .get("repositories", &[("since", since.to_string())])
      .await
  }

  async fn search_page(&self, query: &str, page: u32) -> Result<ApiSearchResponse> {
    self
      .get(
        "search/repositories",
        &[
          ("q", query.to_string()),
          ("per_page", SEARCH_PAGE_SIZE.to_string()),
          ("page", page.to_string()),
        ],
      )
      .await
  }

  async fn fetch_detail(&self, full_name: &str) -> Result<ApiRepository> {
    self.get(&format!("repos/{}", full_name), &[]).await
  }
}

/// Map a transport-level failure onto the error taxonomy.
fn classify_transport_error(err: reqwest::Error) -> SyncError {
  if is_name_resolution_failure(&err) {
    warn!("Network error: unable to resolve address: {}", err);
    return SyncError::NetworkError(UNRESOLVED_ADDRESS.to_string());
  }
  error!("Unexpected error during GitHub request: {}", err);
  SyncError::unknown(err)
}

fn is_name_resolution_failure(err: &reqwest::Error) -> bool {
  if !err.is_connect() {
    return false;
  }
  let mut source = err.source();
  while let Some(cause) = source {
    let message = cause.to_string().to_lowercase();
    if message.contains("dns error") || message.contains("failed to lookup address") {
      return true;
    }
    source = cause.source();
  }
  false
}
