//! Core traits and types for the caching system.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::fingerprint::Fingerprint;

/// Trait for payloads that can be cached.
///
/// Implementors report the newest calendar date they contain so the TTL policy
/// can tell recent content from archival content.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Newest content date, if the payload carries dates at all.
  fn content_date(&self) -> Option<NaiveDate>;
}

/// One stored response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
  /// Canonical fingerprint string, kept for inspection
  pub fingerprint: String,
  /// Category the entry belongs to (one per source tab)
  pub category: String,
  /// Serialized payload (JSON)
  pub data: String,
  pub created_at: DateTime<Utc>,
  pub last_accessed_at: DateTime<Utc>,
  pub ttl_ms: i64,
  pub approx_size_bytes: u64,
}

impl CacheEntry {
  /// Serialize a payload into a new entry created now.
  pub fn new<T: Serialize>(
    fingerprint: &Fingerprint,
    value: &T,
    ttl: Duration,
  ) -> serde_json::Result<Self> {
    let data = serde_json::to_string(value)?;
    let now = now_millis();
    let approx_size_bytes = (data.len() + fingerprint.canonical().len()) as u64;

    Ok(Self {
      fingerprint: fingerprint.canonical(),
      category: fingerprint.category().to_string(),
      data,
      created_at: now,
      last_accessed_at: now,
      ttl_ms: ttl.num_milliseconds(),
      approx_size_bytes,
    })
  }

  pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
    serde_json::from_str(&self.data)
  }

  pub fn ttl(&self) -> Duration {
    Duration::milliseconds(self.ttl_ms)
  }

  /// Expiry is always computed against the given wall-clock time.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    now - self.created_at > self.ttl()
  }

  pub fn is_expired(&self) -> bool {
    self.is_expired_at(Utc::now())
  }

  /// The same entry with timestamps at storage precision.
  pub fn at_storage_precision(&self) -> Self {
    Self {
      created_at: truncate_millis(self.created_at),
      last_accessed_at: truncate_millis(self.last_accessed_at),
      ..self.clone()
    }
  }
}

/// Drop precision below what storage keeps (milliseconds).
pub fn truncate_millis(t: DateTime<Utc>) -> DateTime<Utc> {
  DateTime::from_timestamp_millis(t.timestamp_millis()).unwrap_or(t)
}

/// Current time truncated to the millisecond precision storage keeps.
pub fn now_millis() -> DateTime<Utc> {
  truncate_millis(Utc::now())
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
  /// Non-fatal problem worth showing to the user
  pub warning: Option<String>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
      warning: None,
    }
  }

  /// Create a new cache result from unexpired cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
      warning: None,
    }
  }

  /// Create a degraded result: the network failed and this cached data is all we have.
  pub fn stale(data: T, cached_at: DateTime<Utc>, warning: String) -> Self {
    Self {
      data,
      source: CacheSource::Stale,
      cached_at: Some(cached_at),
      warning: Some(warning),
    }
  }

  pub fn is_stale(&self) -> bool {
    self.source == CacheSource::Stale
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still within its TTL
  CacheFresh,
  /// Network unavailable, serving cached data regardless of age
  Stale,
}
