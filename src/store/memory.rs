//! In-Memory Store
//!
//! A [`RemoteStore`] living in the current process. It behaves like a
//! memcached-style server: values are opaque bytes, TTLs are enforced by the
//! store (lazily on fetch and by [`MemoryStore::purge_expired`]), and when the
//! capacity is reached the least recently used key is evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::{LruTracker, StoreStats};
use crate::config::MemoryStoreConfig;
use crate::driver::RemoteStore;
use crate::error::{CacheError, Result};

#[derive(Debug)]
struct StoredItem {
    bytes: Vec<u8>,
    /// Unix milliseconds, None = no expiration
    expires_at_ms: Option<i64>,
}

impl StoredItem {
    fn is_expired_at(&self, now_ms: i64) -> bool {
        matches!(self.expires_at_ms, Some(expires) if now_ms >= expires)
    }
}

#[derive(Debug)]
struct StoreState {
    items: HashMap<String, StoredItem>,
    lru: LruTracker,
    stats: StoreStats,
    max_entries: usize,
    address: Option<String>,
}

impl StoreState {
    fn drop_key(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.items.remove(key).is_some()
    }
}

// == Memory Store ==
/// Shared handle to an in-process key-value store.
///
/// Clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    online: Arc<AtomicBool>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                items: HashMap::new(),
                lru: LruTracker::new(),
                stats: StoreStats::default(),
                max_entries: max_entries.max(1),
                address: None,
            })),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Creates a store from configuration.
    pub fn from_config(config: &MemoryStoreConfig) -> Self {
        Self::new(config.max_entries)
    }

    /// Marks the store reachable or unreachable. While offline, `connect`
    /// and every data operation fail with [`CacheError::ConnectionFailed`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Address given to the last successful `connect`.
    pub fn address(&self) -> Option<String> {
        self.state.lock().address.clone()
    }

    // == Purge Expired ==
    /// Removes every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = now_ms();
        let mut state = self.state.lock();

        let expired: Vec<String> = state
            .items
            .iter()
            .filter(|(_, item)| item.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.drop_key(key);
        }
        state.stats.expirations += expired.len() as u64;
        expired.len()
    }

    /// Returns current statistics.
    pub fn stats(&self) -> StoreStats {
        let state = self.state.lock();
        StoreStats {
            total_entries: state.items.len(),
            ..state.stats.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Locks the state for a data operation on a connected, online store.
    fn session(&self) -> Result<MutexGuard<'_, StoreState>> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionFailed("store is offline".to_string()));
        }
        let state = self.state.lock();
        if state.address.is_none() {
            return Err(CacheError::ConnectionFailed(
                "not connected. Call server() first".to_string(),
            ));
        }
        Ok(state)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_config(&MemoryStoreConfig::default())
    }
}

impl RemoteStore for MemoryStore {
    fn connect(&self, host: &str, port: u16) -> Result<()> {
        let address = format!("{host}:{port}");
        if !self.online.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionFailed(format!(
                "{address} did not answer the liveness check"
            )));
        }
        info!(%address, "Connected to in-memory store");
        self.state.lock().address = Some(address);
        Ok(())
    }

    fn store_with_ttl(&self, key: &str, value: Vec<u8>, ttl_seconds: Option<u64>) -> Result<()> {
        let now = now_ms();
        let mut state = self.session()?;

        if !state.items.contains_key(key) && state.items.len() >= state.max_entries {
            if let Some(evicted) = state.lru.evict_oldest() {
                state.items.remove(&evicted);
                state.stats.evictions += 1;
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }

        let expires_at_ms = ttl_seconds.map(|ttl| {
            i64::try_from(ttl.saturating_mul(1000))
                .map(|ttl_ms| now.saturating_add(ttl_ms))
                .unwrap_or(i64::MAX)
        });
        state.items.insert(
            key.to_string(),
            StoredItem {
                bytes: value,
                expires_at_ms,
            },
        );
        state.lru.touch(key);
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = now_ms();
        let mut state = self.session()?;

        match state.items.get(key).map(|item| item.is_expired_at(now)) {
            None => {
                state.stats.misses += 1;
                Ok(None)
            }
            Some(true) => {
                state.drop_key(key);
                state.stats.expirations += 1;
                state.stats.misses += 1;
                Ok(None)
            }
            Some(false) => {
                state.lru.touch(key);
                state.stats.hits += 1;
                Ok(state.items.get(key).map(|item| item.bytes.clone()))
            }
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.session()?;
        state.drop_key(key);
        Ok(())
    }

    fn flush_all(&self) -> Result<usize> {
        let mut state = self.session()?;
        let flushed = state.items.len();
        state.items.clear();
        state.lru.clear();
        info!(flushed, "Flushed in-memory store");
        Ok(flushed)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
