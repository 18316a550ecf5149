//! Best-effort cache store over a storage backend.
//!
//! Caching is an optimization, never a correctness requirement: every backend
//! failure is logged here and turned into a miss or a skipped write.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::fingerprint::Fingerprint;
use super::storage::CacheStorage;
use super::traits::{now_millis, CacheEntry};

/// Cache store shared between the fetch path and the sweeper.
#[derive(Clone)]
pub struct CacheStore {
  storage: Arc<dyn CacheStorage>,
  max_bytes: u64,
}

impl CacheStore {
  pub fn new(storage: impl CacheStorage + 'static, max_bytes: u64) -> Self {
    Self {
      storage: Arc::new(storage),
      max_bytes,
    }
  }

  /// Read an entry whatever its age.
  ///
  /// The canonical key is tried first; a hit under the legacy key is migrated
  /// to the canonical key so the fallback read happens once per entry.
  pub fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
    match self.storage.read(&fingerprint.storage_key()) {
      Ok(Some(entry)) => return Some(entry),
      Ok(None) => {}
      Err(e) => {
        warn!(%fingerprint, error = %e, "cache read failed");
        return None;
      }
    }

    let legacy_key = fingerprint.legacy_storage_key();
    match self.storage.read(&legacy_key) {
      Ok(Some(mut entry)) => {
        entry.fingerprint = fingerprint.canonical();
        entry.category = fingerprint.category().to_string();
        self.migrate(fingerprint, &legacy_key, &entry);
        Some(entry)
      }
      Ok(None) => None,
      Err(e) => {
        warn!(%fingerprint, error = %e, "legacy cache read failed");
        None
      }
    }
  }

  fn migrate(&self, fingerprint: &Fingerprint, legacy_key: &str, entry: &CacheEntry) {
    let result = self
      .storage
      .write(&fingerprint.storage_key(), entry)
      .and_then(|_| self.storage.remove(legacy_key));

    match result {
      Ok(_) => info!(%fingerprint, "migrated legacy cache entry"),
      Err(e) => warn!(%fingerprint, error = %e, "legacy cache migration failed"),
    }
  }

  /// Record a cache hit.
  pub fn touch(&self, fingerprint: &Fingerprint) {
    if let Err(e) = self.storage.touch(&fingerprint.storage_key(), now_millis()) {
      debug!(%fingerprint, error = %e, "cache touch failed");
    }
  }

  /// Store an entry, replacing any previous one.
  ///
  /// Returns whether the entry was stored. Writes that would push the cache
  /// past its size limit are refused.
  pub fn put(&self, fingerprint: &Fingerprint, entry: &CacheEntry) -> bool {
    let key = fingerprint.storage_key();
    // Every backend then hands back exactly what was written
    let entry = &entry.at_storage_precision();

    let used = match self.storage.total_size() {
      Ok(total) => {
        let replaced = self
          .storage
          .read(&key)
          .ok()
          .flatten()
          .map(|e| e.approx_size_bytes)
          .unwrap_or(0);
        total.saturating_sub(replaced)
      }
      Err(e) => {
        warn!(%fingerprint, error = %e, "cache unavailable, skipping write");
        return false;
      }
    };

    if used + entry.approx_size_bytes > self.max_bytes {
      warn!(
        %fingerprint,
        used,
        size = entry.approx_size_bytes,
        limit = self.max_bytes,
        "cache quota exceeded, skipping write"
      );
      return false;
    }

    match self.storage.write(&key, entry) {
      Ok(()) => true,
      Err(e) => {
        warn!(%fingerprint, error = %e, "cache write failed");
        false
      }
    }
  }

  /// Remove one entry (under either key shape). No-op if absent.
  pub fn evict(&self, fingerprint: &Fingerprint) {
    for key in [fingerprint.storage_key(), fingerprint.legacy_storage_key()] {
      if let Err(e) = self.storage.remove(&key) {
        warn!(%fingerprint, error = %e, "cache eviction failed");
      }
    }
  }

  /// Evict every expired entry in every category. Returns the number evicted.
  pub fn sweep(&self) -> usize {
    let now = Utc::now();
    let metas = match self.storage.list(None) {
      Ok(metas) => metas,
      Err(e) => {
        warn!(error = %e, "cache sweep could not list entries");
        return 0;
      }
    };

    let mut evicted = 0;
    for meta in metas.iter().filter(|m| m.is_expired_at(now)) {
      match self.storage.remove(&meta.key) {
        Ok(true) => evicted += 1,
        Ok(false) => {}
        Err(e) => warn!(key = %meta.key, error = %e, "cache sweep eviction failed"),
      }
    }

    info!(evicted, scanned = metas.len(), "cache sweep finished");
    evicted
  }

  /// Remove every entry in one category.
  pub fn clear(&self, category: &str) -> usize {
    match self.storage.remove_category(category) {
      Ok(removed) => {
        info!(category, removed, "cache category cleared");
        removed
      }
      Err(e) => {
        warn!(category, error = %e, "cache clear failed");
        0
      }
    }
  }
}
