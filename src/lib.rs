//! CacheBox - A pluggable key-value cache
//!
//! Stores values on the local filesystem or in a remote key-value store, with
//! optional TTL expiration expressed as `"30s"`, `"5m"`, `"2h"` or `"1d"`.

pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod facade;
pub mod store;
pub mod tasks;
pub mod ttl;

pub use codec::{CacheEntry, CacheValue, Format, TaggedFormat};
pub use config::{FileCacheConfig, MemoryStoreConfig};
pub use driver::{CacheDriver, FileCache, MemcachedDriver, RedisDriver, RemoteStore};
pub use error::{CacheError, Result};
pub use facade::{CacheBox, DriverKind};
pub use store::MemoryStore;
pub use tasks::spawn_purge_task;
pub use ttl::parse_ttl;
