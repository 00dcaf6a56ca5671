use chrono::{DateTime, FixedOffset};

/// Repository as exposed to presentation code.
///
/// Counts that were never fetched in detail read as zero here; the stored
/// record keeps them absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
  pub id: i64,
  pub name: String,
  pub full_name: String,
  pub description: Option<String>,
  pub owner_avatar_url: String,
  pub html_url: String,
  pub stargazers_count: u32,
  pub forks_count: u32,
  pub open_issues_count: u32,
  /// `None` for summary-only records
  pub last_updated: Option<DateTime<FixedOffset>>,
  pub language: Option<String>,
  pub license: Option<String>,
}

impl Repository {
  /// Whether a detail fetch has populated this record.
  pub fn has_details(&self) -> bool {
    self.last_updated.is_some()
  }
}

/// Stored repository row.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryRecord {
  pub id: i64,
  pub name: String,
  pub full_name: String,
  pub description: Option<String>,
  pub owner_avatar_url: String,
  pub html_url: String,
  pub stargazers_count: Option<u32>,
  pub forks_count: Option<u32>,
  pub open_issues_count: Option<u32>,
  /// RFC 3339 timestamp as returned by the API
  pub last_updated: Option<String>,
  pub language: Option<String>,
  pub license: Option<String>,
}

/// Stored owner row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRecord {
  pub id: i64,
  pub username: String,
  pub avatar_url: String,
}
