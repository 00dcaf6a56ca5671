//! Conversions between wire, storage and domain representations.

use chrono::{DateTime, FixedOffset};

use super::api_types::ApiRepository;
use super::types::{OwnerRecord, Repository, RepositoryRecord};

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
  value.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

impl ApiRepository {
  /// Split the payload into a repository row and a standalone owner row.
  ///
  /// The owner's avatar is copied onto the repository so list rendering never
  /// needs the owners table.
  pub fn deconstruct(self) -> (RepositoryRecord, OwnerRecord) {
    let owner = OwnerRecord {
      id: self.owner.id,
      username: self.owner.login,
      avatar_url: self.owner.avatar_url,
    };

    let repository = RepositoryRecord {
      id: self.id,
      name: self.name,
      full_name: self.full_name,
      description: self.description,
      owner_avatar_url: owner.avatar_url.clone(),
      html_url: self.html_url,
      stargazers_count: self.stargazers_count,
      forks_count: self.forks_count,
      open_issues_count: self.open_issues_count,
      last_updated: self.updated_at,
      language: self.language,
      license: self.license.map(|l| l.name),
    };

    (repository, owner)
  }

  pub fn to_domain(&self) -> Repository {
    Repository {
      id: self.id,
      name: self.name.clone(),
      full_name: self.full_name.clone(),
      description: self.description.clone(),
      owner_avatar_url: self.owner.avatar_url.clone(),
      html_url: self.html_url.clone(),
      stargazers_count: self.stargazers_count.unwrap_or(0),
      forks_count: self.forks_count.unwrap_or(0),
      open_issues_count: self.open_issues_count.unwrap_or(0),
      last_updated: parse_timestamp(self.updated_at.as_deref()),
      language: self.language.clone(),
      license: self.license.as_ref().map(|l| l.name.clone()),
    }
  }
}

/// Deconstruct a whole page into parallel repository and owner batches.
pub fn deconstruct_all(items: Vec<ApiRepository>) -> (Vec<RepositoryRecord>, Vec<OwnerRecord>) {
  items.into_iter().map(ApiRepository::deconstruct).unzip()
}

impl From<RepositoryRecord> for Repository {
  fn from(record: RepositoryRecord) -> Self {
    let last_updated = parse_timestamp(record.last_updated.as_deref());
    Repository {
      id: record.id,
      name: record.name,
      full_name: record.full_name,
      description: record.description,
      owner_avatar_url: record.owner_avatar_url,
      html_url: record.html_url,
      stargazers_count: record.stargazers_count.unwrap_or(0),
      forks_count: record.forks_count.unwrap_or(0),
      open_issues_count: record.open_issues_count.unwrap_or(0),
      last_updated,
      language: record.language,
      license: record.license,
    }
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use crate::github::api_types::{ApiLicense, ApiOwner, ApiRepository};

  /// Summary-only payload as returned by the feed listing.
  pub fn summary(id: i64) -> ApiRepository {
    ApiRepository {
      id,
      name: format!("repo-{}", id),
      full_name: format!("owner-{}/repo-{}", id, id),
      owner: ApiOwner {
        id: 1000 + id,
        login: format!("owner-{}", id),
        avatar_url: format!("https://avatars.example/{}", id),
      },
      description: Some(format!("Repository {}", id)),
      html_url: format!("https://github.com/owner-{}/repo-{}", id, id),
      stargazers_count: None,
      forks_count: None,
      open_issues_count: None,
      updated_at: None,
      language: None,
      license: None,
    }
  }

  /// Summary payload with a language, as returned by search.
  pub fn with_language(id: i64, language: &str) -> ApiRepository {
    ApiRepository {
      language: Some(language.to_string()),
      ..summary(id)
    }
  }

  /// Full payload as returned by the detail endpoint.
  pub fn detailed(id: i64) -> ApiRepository {
    ApiRepository {
      stargazers_count: Some(42),
      forks_count: Some(7),
      open_issues_count: Some(3),
      updated_at: Some("2025-12-24T00:24:46Z".to_string()),
      language: Some("Rust".to_string()),
      license: Some(ApiLicense {
        key: "mit".to_string(),
        name: "MIT License".to_string(),
        spdx_id: Some("MIT".to_string()),
        url: None,
        node_id: None,
      }),
      ..summary(id)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::fixtures;
  use super::*;

  #[test]
  fn test_deconstruct_extracts_owner_and_denormalizes_avatar() {
    let (repo, owner) = fixtures::summary(5).deconstruct();
    assert_eq!(owner.id, 1005);
    assert_eq!(owner.username, "owner-5");
    assert_eq!(repo.owner_avatar_url, owner.avatar_url);
    assert_eq!(repo.full_name, "owner-5/repo-5");
  }

  #[test]
  fn test_storage_keeps_unknown_counts_absent() {
    let (repo, _) = fixtures::summary(1).deconstruct();
    assert_eq!(repo.stargazers_count, None);
    assert_eq!(repo.last_updated, None);

    let domain = Repository::from(repo);
    assert_eq!(domain.stargazers_count, 0);
    assert_eq!(domain.forks_count, 0);
    assert!(!domain.has_details());
  }

  #[test]
  fn test_detailed_record_round_trips_timestamp() {
    let (repo, _) = fixtures::detailed(9).deconstruct();
    assert_eq!(repo.license.as_deref(), Some("MIT License"));

    let domain = Repository::from(repo);
    let updated = domain.last_updated.expect("timestamp parsed");
    assert_eq!(updated.to_rfc3339(), "2025-12-24T00:24:46+00:00");
    assert_eq!(domain.stargazers_count, 42);
  }

  #[test]
  fn test_wire_to_domain_fast_path_matches_stored_path() {
    let api = fixtures::detailed(3);
    let direct = api.to_domain();
    let (record, _) = api.deconstruct();
    assert_eq!(direct, Repository::from(record));
  }

  #[test]
  fn test_unparseable_timestamp_stays_absent() {
    let (mut repo, _) = fixtures::summary(2).deconstruct();
    repo.last_updated = Some("yesterday".to_string());
    assert!(Repository::from(repo).last_updated.is_none());
  }
}
