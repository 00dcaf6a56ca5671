//! Serde-deserializable types matching GitHub REST API responses.
//!
//! Only the fields the cache persists are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOwner {
  pub id: i64,
  pub login: String,
  pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLicense {
  pub key: String,
  pub name: String,
  pub spdx_id: Option<String>,
  pub url: Option<String>,
  pub node_id: Option<String>,
}

/// Repository payload. The `/repositories` listing only carries summary
/// fields, so everything from the detail endpoint is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepository {
  pub id: i64,
  pub name: String,
  pub full_name: String,
  pub owner: ApiOwner,
  pub description: Option<String>,
  pub html_url: String,
  pub stargazers_count: Option<u32>,
  pub forks_count: Option<u32>,
  pub open_issues_count: Option<u32>,
  pub updated_at: Option<String>,
  pub language: Option<String>,
  pub license: Option<ApiLicense>,
}

// ============================================================================
// Search endpoint response
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub total_count: u64,
  #[serde(default)]
  pub incomplete_results: bool,
  #[serde(default)]
  pub items: Vec<ApiRepository>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_feed_summary_without_detail_fields() {
    let json = r#"{
      "id": 1,
      "name": "grit",
      "full_name": "mojombo/grit",
      "owner": {"id": 1, "login": "mojombo", "avatar_url": "https://a/1", "type": "User"},
      "private": false,
      "html_url": "https://github.com/mojombo/grit",
      "description": null,
      "fork": false
    }"#;

    let repo: ApiRepository = serde_json::from_str(json).unwrap();
    assert_eq!(repo.full_name, "mojombo/grit");
    assert_eq!(repo.owner.login, "mojombo");
    assert!(repo.stargazers_count.is_none());
    assert!(repo.updated_at.is_none());
    assert!(repo.license.is_none());
  }

  #[test]
  fn test_search_response() {
    let json = r#"{
      "total_count": 2,
      "incomplete_results": false,
      "items": [{
        "id": 7,
        "name": "ktor",
        "full_name": "ktorio/ktor",
        "owner": {"id": 3, "login": "ktorio", "avatar_url": "https://a/3"},
        "html_url": "https://github.com/ktorio/ktor",
        "description": "Framework",
        "stargazers_count": 13000,
        "forks_count": 1000,
        "open_issues_count": 150,
        "updated_at": "2025-12-24T00:24:46Z",
        "language": "Kotlin",
        "license": {"key": "apache-2.0", "name": "Apache License 2.0", "spdx_id": "Apache-2.0", "url": null, "node_id": "MDc6"}
      }]
    }"#;

    let response: ApiSearchResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.total_count, 2);
    assert_eq!(response.items.len(), 1);
    let license = response.items[0].license.as_ref().unwrap();
    assert_eq!(license.name, "Apache License 2.0");
  }
}
