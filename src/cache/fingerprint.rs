//! Request fingerprints: the cache keys for page requests.

use sha2::{Digest, Sha256};
use std::fmt;

const SCHEMA_VERSION: &str = "v2";

/// Identifies one cacheable page request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
  /// Source tab key; doubles as the cache category
  pub tab: String,
  /// Source id sent to the API
  pub source: String,
  pub page: u32,
  /// Present only for sources paged by date on the server
  pub date_page: Option<u32>,
}

impl Fingerprint {
  pub fn new(tab: &str, source: &str, page: u32, date_page: Option<u32>) -> Self {
    Self {
      tab: tab.to_string(),
      source: source.to_string(),
      page,
      date_page,
    }
  }

  pub fn category(&self) -> &str {
    &self.tab
  }

  /// Current key schema: `v2|<tab>|<source>|p<page>[|d<date_page>]`.
  pub fn canonical(&self) -> String {
    let mut key = format!("{}|{}|{}|p{}", SCHEMA_VERSION, self.tab, self.source, self.page);
    if let Some(date_page) = self.date_page {
      key.push_str(&format!("|d{}", date_page));
    }
    key
  }

  /// Shape written by older clients: `<tab>_<source>_<page>[_<date_page>]`.
  pub fn legacy(&self) -> String {
    let mut key = format!("{}_{}_{}", self.tab, self.source, self.page);
    if let Some(date_page) = self.date_page {
      key.push_str(&format!("_{}", date_page));
    }
    key
  }

  /// Storage key for the canonical shape.
  pub fn storage_key(&self) -> String {
    hash_key(&self.canonical())
  }

  /// Storage key for the legacy shape.
  pub fn legacy_storage_key(&self) -> String {
    hash_key(&self.legacy())
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical())
  }
}

/// SHA256 hash for stable, fixed-length keys
pub fn hash_key(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  hex::encode(hasher.finalize())
}
