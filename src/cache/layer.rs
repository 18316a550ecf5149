//! Cache layer that orchestrates caching logic with network fetching.

use chrono::Duration;
use std::future::Future;
use tracing::{debug, info, warn};

use super::fingerprint::Fingerprint;
use super::store::CacheStore;
use super::traits::{CacheEntry, CacheResult, Cacheable};
use crate::error::{FetchError, LoadError};

/// How failed fetches are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Attempts after the first one
  pub max_retries: u32,
  /// Pause between attempts
  pub backoff: std::time::Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 2,
      backoff: std::time::Duration::ZERO,
    }
  }
}

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the application and the network client,
/// providing transparent caching with stale fallback.
#[derive(Clone)]
pub struct CacheLayer {
  store: CacheStore,
  retry: RetryPolicy,
}

impl CacheLayer {
  /// Create a new cache layer over the given store.
  pub fn new(store: CacheStore) -> Self {
    Self {
      store,
      retry: RetryPolicy::default(),
    }
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn store(&self) -> &CacheStore {
    &self.store
  }

  /// Load with a cache-first strategy.
  ///
  /// 1. Unless `force`, an unexpired cache entry is returned without any fetch
  /// 2. Otherwise fetch, retrying up to the retry budget
  /// 3. On success, store under `fingerprint` with the TTL from `ttl_for`
  /// 4. If every attempt fails, return any cached entry (even expired) as stale
  /// 5. With nothing cached, fail with the last fetch error
  pub async fn load<T, F, Fut, P>(
    &self,
    fingerprint: &Fingerprint,
    force: bool,
    ttl_for: P,
    mut fetcher: F,
  ) -> Result<CacheResult<T>, LoadError>
  where
    T: Cacheable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
    P: Fn(&T) -> Duration,
  {
    let cached = self.cached_value::<T>(fingerprint);

    if !force {
      if let Some((entry, value)) = &cached {
        if !entry.is_expired() {
          debug!(%fingerprint, "cache hit");
          self.store.touch(fingerprint);
          return Ok(CacheResult::from_cache(value.clone(), entry.created_at));
        }
      }
    }

    let attempts = self.retry.max_retries + 1;
    let mut last_error = None;

    for attempt in 1..=attempts {
      match fetcher().await {
        Ok(value) => {
          let ttl = ttl_for(&value);
          match CacheEntry::new(fingerprint, &value, ttl) {
            Ok(entry) => {
              self.store.put(fingerprint, &entry);
            }
            Err(e) => warn!(%fingerprint, error = %e, "could not serialize result for cache"),
          }
          info!(%fingerprint, attempt, ttl_mins = ttl.num_minutes(), "fetched from network");
          return Ok(CacheResult::from_network(value));
        }
        Err(e) => {
          warn!(%fingerprint, attempt, error = %e, "fetch failed");
          let retryable = e.is_retryable();
          last_error = Some(e);
          if !retryable {
            break;
          }
          if attempt < attempts && !self.retry.backoff.is_zero() {
            tokio::time::sleep(self.retry.backoff).await;
          }
        }
      }
    }

    let source = last_error.unwrap_or_else(|| FetchError::Api("no attempt was made".to_string()));

    match cached {
      Some((entry, value)) => {
        let warning = format!(
          "Showing cached data from {} ({})",
          entry
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M"),
          source
        );
        info!(%fingerprint, "serving stale cache after failed fetch");
        Ok(CacheResult::stale(value, entry.created_at, warning))
      }
      None => Err(LoadError {
        what: fingerprint.canonical(),
        attempts,
        source,
      }),
    }
  }

  /// Cached entry and its decoded value; an undecodable entry is dropped.
  fn cached_value<T: Cacheable>(&self, fingerprint: &Fingerprint) -> Option<(CacheEntry, T)> {
    let entry = self.store.get(fingerprint)?;
    match entry.decode::<T>() {
      Ok(value) => Some((entry, value)),
      Err(e) => {
        warn!(%fingerprint, error = %e, "discarding undecodable cache entry");
        self.store.evict(fingerprint);
        None
      }
    }
  }
}
