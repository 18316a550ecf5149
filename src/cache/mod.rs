//! Response caching with time-based expiry and stale-on-error fallback.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Keys responses by request fingerprint, one category per source tab
//! - Picks a TTL per write (short for fresh first pages, long for archives)
//! - Sweeps expired entries on a schedule
//! - Serves stale entries when the network is unavailable

mod fingerprint;
mod layer;
mod storage;
mod store;
mod sweeper;
mod traits;
mod ttl;

pub use fingerprint::Fingerprint;
pub use layer::{CacheLayer, RetryPolicy};
pub use storage::{CacheStorage, MemoryStorage, NoopStorage, SqliteStorage, StoredMeta};
pub use store::CacheStore;
pub use sweeper::{spawn_sweeper, SweeperHandle};
pub use traits::{CacheEntry, CacheResult, CacheSource, Cacheable};
pub use ttl::{TtlInput, TtlPolicy, TtlTier};

use color_eyre::Result;
use tracing::info;

use crate::config::{CacheBackend, CacheConfig};

/// Build the cache store the configuration asks for.
pub fn open_store(config: &CacheConfig) -> Result<CacheStore> {
  if !config.enabled {
    info!("response cache disabled");
    return Ok(CacheStore::new(NoopStorage, config.max_bytes));
  }

  let store = match config.backend {
    CacheBackend::Sqlite => {
      CacheStore::new(SqliteStorage::open(config.path.as_deref())?, config.max_bytes)
    }
    CacheBackend::Memory => CacheStore::new(MemoryStorage::new(), config.max_bytes),
  };

  Ok(store)
}
