//! Store Module
//!
//! In-process key-value store implementing the remote store contract, with
//! TTL enforcement and LRU eviction.

mod lru;
mod memory;
mod stats;

pub(crate) use lru::LruTracker;
pub use memory::MemoryStore;
pub use stats::StoreStats;
