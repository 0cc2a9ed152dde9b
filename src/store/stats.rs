//! Store Statistics Module
//!
//! Counters for the in-memory store: hits, misses, evictions and expirations.

// == Store Stats ==
/// Performance counters of a [`crate::store::MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Fetches that returned a value
    pub hits: u64,
    /// Fetches that found nothing (absent or expired)
    pub misses: u64,
    /// Entries dropped to make room under the capacity limit
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries
    pub total_entries: usize,
}

impl StoreStats {
    /// Hit rate as hits / (hits + misses), 0.0 before any fetch.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}
