//! Background task that periodically evicts expired cache entries.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::store::CacheStore;

pub struct SweeperHandle {
  cancel_tx: broadcast::Sender<()>,
  join: JoinHandle<()>,
}

impl SweeperHandle {
  /// Stop the sweeper and wait for it to finish.
  pub async fn stop(self) {
    let _ = self.cancel_tx.send(());
    if let Err(e) = self.join.await {
      debug!(error = %e, "cache sweeper ended abnormally");
    }
  }
}

/// Sweep once right away, then every `interval` until stopped.
pub fn spawn_sweeper(store: CacheStore, interval: Duration) -> SweeperHandle {
  let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
  let join = tokio::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
      tokio::select! {
        _ = cancel_rx.recv() => {
          info!("cache sweeper shutdown requested");
          break;
        }
        _ = ticker.tick() => {
          let store = store.clone();
          // Storage calls block; keep them off the async workers
          match tokio::task::spawn_blocking(move || store.sweep()).await {
            Ok(evicted) => debug!(evicted, "scheduled cache sweep"),
            Err(e) => debug!(error = %e, "scheduled cache sweep panicked"),
          }
        }
      }
    }
  });

  SweeperHandle { cancel_tx, join }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::fingerprint::Fingerprint;
  use crate::cache::storage::MemoryStorage;
  use crate::cache::traits::CacheEntry;
  use chrono::Utc;

  #[tokio::test]
  async fn test_sweeps_at_startup_and_stops() {
    let store = CacheStore::new(MemoryStorage::new(), u64::MAX);
    let fp = Fingerprint::new("x", "x.com", 1, None);
    let mut entry = CacheEntry::new(&fp, &"old", chrono::Duration::minutes(15)).unwrap();
    entry.created_at = Utc::now() - chrono::Duration::hours(1);
    store.put(&fp, &entry);

    let handle = spawn_sweeper(store.clone(), Duration::from_secs(6 * 60 * 60));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(store.get(&fp), None);
    handle.stop().await;
  }
}
