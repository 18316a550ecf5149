//! Cache storage trait and its SQLite, in-memory and no-op implementations.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::CacheEntry;

/// Bookkeeping for one stored entry, enough to decide expiry without the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMeta {
  pub key: String,
  pub category: String,
  pub created_at: DateTime<Utc>,
  pub ttl_ms: i64,
  pub approx_size_bytes: u64,
}

impl StoredMeta {
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    (now - self.created_at).num_milliseconds() > self.ttl_ms
  }
}

/// Trait for cache storage backends.
///
/// Backends report every failure; deciding what to do about it is the caller's job.
pub trait CacheStorage: Send + Sync {
  /// Read the entry stored under `key`.
  fn read(&self, key: &str) -> Result<Option<CacheEntry>>;

  /// Insert or replace the entry stored under `key`.
  fn write(&self, key: &str, entry: &CacheEntry) -> Result<()>;

  /// Remove one entry. Returns whether anything was removed.
  fn remove(&self, key: &str) -> Result<bool>;

  /// Update the last access time of an entry.
  fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<()>;

  /// List entry metadata, optionally restricted to one category.
  fn list(&self, category: Option<&str>) -> Result<Vec<StoredMeta>>;

  /// Remove every entry in a category. Returns the number removed.
  fn remove_category(&self, category: &str) -> Result<usize>;

  /// Sum of approximate entry sizes.
  fn total_size(&self) -> Result<u64>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn read(&self, _key: &str) -> Result<Option<CacheEntry>> {
    Ok(None) // Always miss
  }

  fn write(&self, _key: &str, _entry: &CacheEntry) -> Result<()> {
    Ok(()) // Discard
  }

  fn remove(&self, _key: &str) -> Result<bool> {
    Ok(false)
  }

  fn touch(&self, _key: &str, _at: DateTime<Utc>) -> Result<()> {
    Ok(())
  }

  fn list(&self, _category: Option<&str>) -> Result<Vec<StoredMeta>> {
    Ok(Vec::new())
  }

  fn remove_category(&self, _category: &str) -> Result<usize> {
    Ok(0)
  }

  fn total_size(&self) -> Result<u64> {
    Ok(0)
  }
}

/// Process-local storage backed by a map.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>> {
    self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStorage for MemoryStorage {
  fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn write(&self, key: &str, entry: &CacheEntry) -> Result<()> {
    self.lock()?.insert(key.to_string(), entry.clone());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<bool> {
    Ok(self.lock()?.remove(key).is_some())
  }

  fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
    if let Some(entry) = self.lock()?.get_mut(key) {
      entry.last_accessed_at = at;
    }
    Ok(())
  }

  fn list(&self, category: Option<&str>) -> Result<Vec<StoredMeta>> {
    Ok(
      self
        .lock()?
        .iter()
        .filter(|(_, e)| category.map_or(true, |c| e.category == c))
        .map(|(key, e)| StoredMeta {
          key: key.clone(),
          category: e.category.clone(),
          created_at: e.created_at,
          ttl_ms: e.ttl_ms,
          approx_size_bytes: e.approx_size_bytes,
        })
        .collect(),
    )
  }

  fn remove_category(&self, category: &str) -> Result<usize> {
    let mut entries = self.lock()?;
    let before = entries.len();
    entries.retain(|_, e| e.category != category);
    Ok(before - entries.len())
  }

  fn total_size(&self) -> Result<u64> {
    Ok(self.lock()?.values().map(|e| e.approx_size_bytes).sum())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the cache database at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory database.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    Ok(crate::config::Config::data_dir()?.join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS response_cache (
    cache_key TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    last_accessed_at INTEGER NOT NULL,
    ttl_ms INTEGER NOT NULL,
    approx_size_bytes INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_response_cache_category
    ON response_cache(category);
"#;

impl CacheStorage for SqliteStorage {
  fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
    let conn = self.lock()?;

    let row: Option<(String, String, String, i64, i64, i64, i64)> = conn
      .query_row(
        "SELECT category, fingerprint, data, created_at, last_accessed_at, ttl_ms, approx_size_bytes
         FROM response_cache WHERE cache_key = ?",
        params![key],
        |row| {
          Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
          ))
        },
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry: {}", e))?;

    match row {
      Some((category, fingerprint, data, created_at, last_accessed_at, ttl_ms, size)) => {
        Ok(Some(CacheEntry {
          fingerprint,
          category,
          data,
          created_at: from_millis(created_at)?,
          last_accessed_at: from_millis(last_accessed_at)?,
          ttl_ms,
          approx_size_bytes: size.max(0) as u64,
        }))
      }
      None => Ok(None),
    }
  }

  fn write(&self, key: &str, entry: &CacheEntry) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO response_cache
           (cache_key, category, fingerprint, data, created_at, last_accessed_at, ttl_ms, approx_size_bytes)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
          key,
          entry.category,
          entry.fingerprint,
          entry.data,
          entry.created_at.timestamp_millis(),
          entry.last_accessed_at.timestamp_millis(),
          entry.ttl_ms,
          entry.approx_size_bytes as i64,
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<bool> {
    let conn = self.lock()?;

    let removed = conn
      .execute("DELETE FROM response_cache WHERE cache_key = ?", params![key])
      .map_err(|e| eyre!("Failed to delete cache entry: {}", e))?;

    Ok(removed > 0)
  }

  fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "UPDATE response_cache SET last_accessed_at = ? WHERE cache_key = ?",
        params![at.timestamp_millis(), key],
      )
      .map_err(|e| eyre!("Failed to touch cache entry: {}", e))?;

    Ok(())
  }

  fn list(&self, category: Option<&str>) -> Result<Vec<StoredMeta>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare(
        "SELECT cache_key, category, created_at, ttl_ms, approx_size_bytes
         FROM response_cache
         WHERE ?1 IS NULL OR category = ?1",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let rows: Vec<(String, String, i64, i64, i64)> = stmt
      .query_map(params![category], |row| {
        Ok((
          row.get(0)?,
          row.get(1)?,
          row.get(2)?,
          row.get(3)?,
          row.get(4)?,
        ))
      })
      .map_err(|e| eyre!("Failed to list cache entries: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    rows
      .into_iter()
      .map(|(key, category, created_at, ttl_ms, size)| {
        Ok(StoredMeta {
          key,
          category,
          created_at: from_millis(created_at)?,
          ttl_ms,
          approx_size_bytes: size.max(0) as u64,
        })
      })
      .collect()
  }

  fn remove_category(&self, category: &str) -> Result<usize> {
    let conn = self.lock()?;

    conn
      .execute(
        "DELETE FROM response_cache WHERE category = ?",
        params![category],
      )
      .map_err(|e| eyre!("Failed to clear cache category {}: {}", category, e))
  }

  fn total_size(&self) -> Result<u64> {
    let conn = self.lock()?;

    let total: i64 = conn
      .query_row(
        "SELECT COALESCE(SUM(approx_size_bytes), 0) FROM response_cache",
        [],
        |row| row.get(0),
      )
      .map_err(|e| eyre!("Failed to sum cache sizes: {}", e))?;

    Ok(total.max(0) as u64)
  }
}

/// Parse a stored millisecond timestamp.
fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms).ok_or_else(|| eyre!("Invalid stored timestamp {}", ms))
}
