//! Remote Drivers
//!
//! Adapters over a connected key-value service. Both wrap values with the
//! tagged codec and hand the parsed TTL to the store, which owns expiration.
//! Unlike the filesystem driver, a missing key reads as `Ok(None)` and
//! deleting a missing key succeeds.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::CacheDriver;
use crate::codec::{decode_tagged, encode_tagged, CacheValue, TaggedFormat};
use crate::error::{CacheError, Result};
use crate::ttl::parse_ttl;

// == Remote Store ==
/// Contract of a remote key-value service.
///
/// Implementations enforce TTLs themselves and keep values as opaque bytes.
pub trait RemoteStore: Send + Sync {
    /// Connects to `host:port` and checks the service is alive.
    ///
    /// # Errors
    /// [`CacheError::ConnectionFailed`] if the liveness check fails.
    fn connect(&self, host: &str, port: u16) -> Result<()>;

    /// Stores `value` under `key`, expiring after `ttl_seconds` if given.
    fn store_with_ttl(&self, key: &str, value: Vec<u8>, ttl_seconds: Option<u64>) -> Result<()>;

    /// Fetches the bytes under `key`, `None` if absent or expired.
    fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removes `key`. A missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Drops every key. Returns how many were dropped, or 0 if unknown.
    fn flush_all(&self) -> Result<usize>;
}

fn fetch_value(store: &dyn RemoteStore, key: &str) -> Result<Option<CacheValue>> {
    match store.fetch(key)? {
        Some(bytes) => decode_tagged(&bytes).map(Some),
        None => {
            debug!(key, "Remote cache miss");
            Ok(None)
        }
    }
}

// == Memcached Driver ==
/// Memcached-style driver with a selectable wrapper format (`string` or `json`).
#[derive(Clone)]
pub struct MemcachedDriver {
    store: Arc<dyn RemoteStore>,
    format: Option<TaggedFormat>,
}

impl MemcachedDriver {
    /// Creates a driver over `store`. A format must be selected before `set`.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            format: None,
        }
    }

    /// Connects the underlying store.
    pub fn connect(&self, host: &str, port: u16) -> Result<()> {
        self.store.connect(host, port)
    }

    /// Selects the wrapper format by name.
    pub fn configure_format(&mut self, name: &str) -> Result<TaggedFormat> {
        let format: TaggedFormat = name.parse()?;
        self.format = Some(format);
        Ok(format)
    }
}

impl fmt::Debug for MemcachedDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemcachedDriver")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl CacheDriver for MemcachedDriver {
    fn set(&self, key: &str, value: CacheValue, ttl: Option<&str>) -> Result<()> {
        let format = self.format.ok_or(CacheError::UninitializedFormat)?;
        let ttl_seconds = parse_ttl(ttl)?;
        let bytes = encode_tagged(&value, format)?;
        self.store.store_with_ttl(key, bytes, ttl_seconds)
    }

    fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        fetch_value(self.store.as_ref(), key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key)
    }

    fn clear(&self) -> Result<usize> {
        self.store.flush_all()
    }
}

// == Redis Driver ==
/// Redis-style driver. Values always use the binary wrapper.
#[derive(Clone)]
pub struct RedisDriver {
    store: Arc<dyn RemoteStore>,
}

impl RedisDriver {
    /// Creates a driver over `store`.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Connects the underlying store.
    pub fn connect(&self, host: &str, port: u16) -> Result<()> {
        self.store.connect(host, port)
    }
}

impl fmt::Debug for RedisDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisDriver").finish_non_exhaustive()
    }
}

impl CacheDriver for RedisDriver {
    fn set(&self, key: &str, value: CacheValue, ttl: Option<&str>) -> Result<()> {
        let ttl_seconds = parse_ttl(ttl)?;
        let bytes = encode_tagged(&value, TaggedFormat::String)?;
        self.store.store_with_ttl(key, bytes, ttl_seconds)
    }

    fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        fetch_value(self.store.as_ref(), key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key)
    }

    fn clear(&self) -> Result<usize> {
        self.store.flush_all()
    }
}
