//! LRU Tracker Module
//!
//! Recency ordering for the in-memory store's eviction policy.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order with a monotonically increasing stamp per touch.
///
/// The smallest stamp belongs to the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    next_stamp: u64,
    stamps: HashMap<String, u64>,
    order: BTreeMap<u64, String>,
}

impl LruTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as most recently used.
    pub fn touch(&mut self, key: &str) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        if let Some(previous) = self.stamps.insert(key.to_string(), stamp) {
            self.order.remove(&previous);
        }
        self.order.insert(stamp, key.to_string());
    }

    /// Stops tracking `key`.
    pub fn remove(&mut self, key: &str) {
        if let Some(stamp) = self.stamps.remove(key) {
            self.order.remove(&stamp);
        }
    }

    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.stamps.remove(&key);
        Some(key)
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.stamps.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}
