use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub fetch: FetchConfig,
  pub cache: CacheConfig,
  /// Source tabs in display order
  pub sources: Vec<SourceProfile>,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      fetch: FetchConfig::default(),
      cache: CacheConfig::default(),
      sources: SourceProfile::defaults(),
      title: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Request timeout; the HTTP client default applies when unset
  pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080".to_string(),
      timeout_secs: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
  /// Extra attempts after the first failed one
  pub max_retries: u32,
  /// Delay between attempts
  pub retry_backoff_ms: u64,
  /// Pages per source to load into the cache at startup (0 = off)
  pub prefetch_pages: u32,
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self {
      max_retries: 2,
      retry_backoff_ms: 0,
      prefetch_pages: 0,
    }
  }
}

impl FetchConfig {
  pub fn retry_backoff(&self) -> Duration {
    Duration::from_millis(self.retry_backoff_ms)
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// SQLite file in the data directory
  #[default]
  Sqlite,
  /// In-process map, gone on exit
  Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  pub backend: CacheBackend,
  /// Database path override for the sqlite backend
  pub path: Option<PathBuf>,
  /// Upper bound on the summed approximate size of all entries
  pub max_bytes: u64,
  pub sweep_interval_hours: u64,
  pub ttl: TtlConfig,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      backend: CacheBackend::Sqlite,
      path: None,
      max_bytes: 5 * 1024 * 1024,
      sweep_interval_hours: 6,
      ttl: TtlConfig::default(),
    }
  }
}

impl CacheConfig {
  pub fn sweep_interval(&self) -> Duration {
    Duration::from_secs(self.sweep_interval_hours.max(1) * 60 * 60)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
  /// First page of recent content
  pub short_mins: i64,
  /// Default
  pub medium_mins: i64,
  /// Archival content
  pub long_hours: i64,
  /// Content whose newest date is at most this many days old counts as recent
  pub recent_days: i64,
  /// Content whose newest date is older than this counts as archival
  pub archive_after_days: i64,
}

impl Default for TtlConfig {
  fn default() -> Self {
    Self {
      short_mins: 15,
      medium_mins: 30,
      long_hours: 24,
      recent_days: 1,
      archive_after_days: 7,
    }
  }
}

/// How a source's records are presented.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  /// Posts with follower/like/repost counts
  #[default]
  Social,
  /// Investment records with company and round details
  Funding,
  /// Daily briefing items
  Briefing,
}

/// Per-source rendering and pagination rules.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceProfile {
  /// Tab key, also the cache category
  pub key: String,
  /// Source id sent to the API
  pub source: String,
  pub label: String,
  #[serde(default)]
  pub kind: SourceKind,
  pub per_page: u32,
  /// Records shown per group before "show more"
  pub initial_visible: usize,
  /// Date groups per date page
  pub date_groups_per_page: usize,
  #[serde(default = "default_true")]
  pub group_by_date: bool,
  /// Send `date_page` to the API
  #[serde(default)]
  pub date_paging: bool,
}

fn default_true() -> bool {
  true
}

impl SourceProfile {
  pub fn defaults() -> Vec<SourceProfile> {
    vec![
      SourceProfile {
        key: "x".to_string(),
        source: "x.com".to_string(),
        label: "X".to_string(),
        kind: SourceKind::Social,
        per_page: 9,
        initial_visible: 9,
        date_groups_per_page: 2,
        group_by_date: true,
        date_paging: false,
      },
      SourceProfile {
        key: "crunchbase".to_string(),
        source: "crunchbase.com".to_string(),
        label: "Crunchbase".to_string(),
        kind: SourceKind::Funding,
        per_page: 3,
        initial_visible: 3,
        date_groups_per_page: 3,
        group_by_date: false,
        date_paging: false,
      },
      SourceProfile {
        key: "briefing".to_string(),
        source: "hotnews".to_string(),
        label: "Briefing".to_string(),
        kind: SourceKind::Briefing,
        per_page: 10,
        initial_visible: 3,
        date_groups_per_page: 2,
        group_by_date: true,
        date_paging: true,
      },
    ]
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./newsdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/newsdesk/config.yaml
  ///
  /// Without any file the defaults apply. `NEWSDESK_API_URL` overrides `api.base_url`.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(url) = std::env::var("NEWSDESK_API_URL") {
      config.api.base_url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("newsdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("newsdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Reject configurations the rest of the program cannot work with.
  pub fn validate(&self) -> Result<()> {
    if self.sources.is_empty() {
      return Err(eyre!("At least one source must be configured"));
    }

    let mut keys = BTreeSet::new();
    for profile in &self.sources {
      if !keys.insert(profile.key.as_str()) {
        return Err(eyre!("Duplicate source key '{}'", profile.key));
      }
      if profile.per_page == 0 || profile.date_groups_per_page == 0 {
        return Err(eyre!(
          "Source '{}': per_page and date_groups_per_page must be positive",
          profile.key
        ));
      }
    }

    url::Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", self.api.base_url, e))?;

    Ok(())
  }

  pub fn profile(&self, key: &str) -> Option<&SourceProfile> {
    self.sources.iter().find(|p| p.key == key)
  }

  /// Directory for the cache database and log files.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("newsdesk"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_validate() {
    let config = Config::default();
    config.validate().unwrap();
    assert_eq!(config.fetch.max_retries, 2);
    assert_eq!(config.cache.sweep_interval(), Duration::from_secs(6 * 60 * 60));
    assert_eq!(config.sources.len(), 3);
  }

  #[test]
  fn test_partial_yaml_keeps_defaults() {
    let config = Config::from_yaml(
      r#"
api:
  base_url: https://news.example.com
cache:
  backend: memory
  ttl:
    short_mins: 5
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://news.example.com");
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.cache.ttl.short_mins, 5);
    assert_eq!(config.cache.ttl.medium_mins, 30);
    assert_eq!(config.profile("crunchbase").unwrap().initial_visible, 3);
  }

  #[test]
  fn test_custom_sources_replace_defaults() {
    let config = Config::from_yaml(
      r#"
sources:
  - key: tech
    source: techfeed
    label: Tech
    per_page: 5
    initial_visible: 2
    date_groups_per_page: 1
"#,
    )
    .unwrap();

    let tech = config.profile("tech").unwrap();
    assert!(tech.group_by_date);
    assert!(!tech.date_paging);
    assert_eq!(tech.kind, SourceKind::Social);
    assert!(config.profile("x").is_none());
  }

  #[test]
  fn test_duplicate_keys_rejected() {
    let mut config = Config::default();
    config.sources.push(config.sources[0].clone());
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_bad_base_url_rejected() {
    let mut config = Config::default();
    config.api.base_url = "not a url".to_string();
    assert!(config.validate().is_err());
  }
}
