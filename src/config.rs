use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub github: GithubConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Treat the network as unreachable; only cached data is served
  #[serde(default)]
  pub offline: bool,
  /// Window size for paged browsing
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      github: GithubConfig::default(),
      cache: CacheConfig::default(),
      offline: false,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

fn default_page_size() -> usize {
  DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
  pub base_url: String,
  /// Value of the `X-GitHub-Api-Version` header
  pub api_version: String,
  pub user_agent: String,
}

impl Default for GithubConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.github.com".to_string(),
      api_version: "2022-11-28".to_string(),
      user_agent: concat!("repocache/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// SQLite database path (default: $XDG_DATA_HOME/repocache/cache.db)
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./repocache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/repocache/config.yaml
  ///
  /// Falls back to defaults when no file exists; an explicit path must exist.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("repocache.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("repocache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Resolved database path.
  pub fn database_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.cache.path {
      return Ok(path.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("repocache").join("cache.db"))
  }

  /// Optional GitHub token from the environment.
  ///
  /// Checks REPOCACHE_GITHUB_TOKEN first, then GITHUB_TOKEN. Unauthenticated
  /// access works with a lower rate limit.
  pub fn get_api_token() -> Option<String> {
    std::env::var("REPOCACHE_GITHUB_TOKEN")
      .or_else(|_| std::env::var("GITHUB_TOKEN"))
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
