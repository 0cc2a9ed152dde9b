//! Driver Module
//!
//! The common driver contract and its implementations: the filesystem driver
//! and the adapters over remote key-value stores.

mod file;
mod remote;


pub use file::FileCache;
pub use remote::{MemcachedDriver, RedisDriver, RemoteStore};

use crate::codec::CacheValue;
use crate::error::{CacheError, Result};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 240;

// == Cache Driver ==
/// Operations every cache backend provides.
///
/// `ttl` is a duration string such as `"30s"` or `"2h"`, parsed with
/// [`crate::parse_ttl`]; `None` stores the value without expiration.
pub trait CacheDriver: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<&str>) -> Result<()>;

    /// Reads the value under `key`. `Ok(None)` means the value expired.
    fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Removes the value under `key`.
    fn delete(&self, key: &str) -> Result<()>;

    /// Removes every value and returns how many were removed, when known.
    fn clear(&self) -> Result<usize>;
}

/// Rejects keys that cannot safely become a file name.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key.len() > MAX_KEY_LENGTH
        || key == "."
        || key == ".."
        || key.contains(|c: char| matches!(c, '/' | '\\' | '\0'));

    if invalid {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}
