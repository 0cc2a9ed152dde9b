//! Expired Entry Purge Task
//!
//! Sweeps a [`MemoryStore`] at a fixed interval so expired keys do not linger
//! until their next fetch.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::MemoryStoreConfig;
use crate::store::MemoryStore;

/// Spawns a task that calls [`MemoryStore::purge_expired`] every
/// `config.purge_interval` seconds.
///
/// Must be called from within a tokio runtime. The task never finishes on its
/// own; abort the returned handle to stop it.
///
/// # Example
/// ```ignore
/// let config = MemoryStoreConfig::from_env();
/// let store = MemoryStore::from_config(&config);
/// let purge = spawn_purge_task(store.clone(), &config);
/// // Later, during shutdown:
/// purge.abort();
/// ```
pub fn spawn_purge_task(store: MemoryStore, config: &MemoryStoreConfig) -> JoinHandle<()> {
    let period = Duration::from_secs(config.purge_interval.max(1));

    tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), "Starting expired entry purge task");

        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = store.purge_expired();
            if removed > 0 {
                let stats = store.stats();
                info!(
                    removed,
                    remaining = stats.total_entries,
                    hit_rate = stats.hit_rate(),
                    "Purged expired entries"
                );
            } else {
                debug!("No expired entries to purge");
            }
        }
    })
}
