//! Cache Facade
//!
//! [`CacheBox`] selects one driver by name, configures it through chained
//! calls and forwards cache operations to it.
//!
//! ```no_run
//! use cachebox::CacheBox;
//!
//! # fn main() -> cachebox::error::Result<()> {
//! let cache = CacheBox::new()
//!     .driver("file")?
//!     .path("/var/cache/app")?
//!     .format("json")?;
//!
//! cache.set("greeting", "hello".into(), Some("10m"))?;
//! let value = cache.get("greeting")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::codec::CacheValue;
use crate::driver::{CacheDriver, FileCache, MemcachedDriver, RedisDriver, RemoteStore};
use crate::error::{CacheError, Result};

// == Driver Kind ==
/// Drivers the facade can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    File,
    Memcached,
    Redis,
}

impl DriverKind {
    pub fn name(self) -> &'static str {
        match self {
            DriverKind::File => "file",
            DriverKind::Memcached => "memcached",
            DriverKind::Redis => "redis",
        }
    }
}

impl FromStr for DriverKind {
    type Err = CacheError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name {
            "file" => Ok(DriverKind::File),
            "memcached" => Ok(DriverKind::Memcached),
            "redis" => Ok(DriverKind::Redis),
            other => Err(CacheError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
enum ActiveDriver {
    File(FileCache),
    Memcached(MemcachedDriver),
    Redis(RedisDriver),
}

impl ActiveDriver {
    fn kind(&self) -> DriverKind {
        match self {
            ActiveDriver::File(_) => DriverKind::File,
            ActiveDriver::Memcached(_) => DriverKind::Memcached,
            ActiveDriver::Redis(_) => DriverKind::Redis,
        }
    }

    fn as_driver(&self) -> &dyn CacheDriver {
        match self {
            ActiveDriver::File(driver) => driver,
            ActiveDriver::Memcached(driver) => driver,
            ActiveDriver::Redis(driver) => driver,
        }
    }

    fn unsupported(&self, operation: &'static str) -> CacheError {
        CacheError::UnsupportedOperation {
            driver: self.kind().name(),
            operation,
        }
    }
}

// == Cache Box ==
/// Entry point selecting and configuring one cache driver.
#[derive(Default)]
pub struct CacheBox {
    driver: Option<ActiveDriver>,
    remote_store: Option<Arc<dyn RemoteStore>>,
}

impl CacheBox {
    /// Creates a facade with no driver selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the store used by the `memcached` and `redis` drivers.
    pub fn with_remote_store(mut self, store: Arc<dyn RemoteStore>) -> Self {
        self.remote_store = Some(store);
        self
    }

    /// Selects a driver by name, replacing any previously selected one.
    ///
    /// # Errors
    /// - [`CacheError::UnsupportedDriver`] for an unknown name
    /// - [`CacheError::ConnectionFailed`] for a remote driver when no store
    ///   is registered
    pub fn driver(mut self, name: &str) -> Result<Self> {
        let kind: DriverKind = name.parse()?;
        let driver = match kind {
            DriverKind::File => ActiveDriver::File(FileCache::default()),
            DriverKind::Memcached => {
                ActiveDriver::Memcached(MemcachedDriver::new(self.store_for(kind)?))
            }
            DriverKind::Redis => ActiveDriver::Redis(RedisDriver::new(self.store_for(kind)?)),
        };
        debug!(driver = %kind, "Selected cache driver");
        self.driver = Some(driver);
        Ok(self)
    }

    /// Kind of the selected driver, if any.
    pub fn driver_kind(&self) -> Option<DriverKind> {
        self.driver.as_ref().map(ActiveDriver::kind)
    }

    /// Sets the storage root (file driver).
    pub fn path(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        match self.active_mut()? {
            ActiveDriver::File(file) => file.configure_path(path),
            other => return Err(other.unsupported("path")),
        }
        Ok(self)
    }

    /// Sets the storage subdirectory (file driver).
    pub fn directory(mut self, name: impl Into<String>) -> Result<Self> {
        match self.active_mut()? {
            ActiveDriver::File(file) => file.configure_directory(name),
            other => return Err(other.unsupported("directory")),
        }
        Ok(self)
    }

    /// Selects the storage format (file and memcached drivers).
    pub fn format(mut self, name: &str) -> Result<Self> {
        match self.active_mut()? {
            ActiveDriver::File(file) => {
                file.configure_format(name)?;
            }
            ActiveDriver::Memcached(memcached) => {
                memcached.configure_format(name)?;
            }
            other => return Err(other.unsupported("format")),
        }
        Ok(self)
    }

    /// Connects the remote store (memcached and redis drivers).
    pub fn server(self, host: &str, port: u16) -> Result<Self> {
        match self.active()? {
            ActiveDriver::Memcached(memcached) => memcached.connect(host, port)?,
            ActiveDriver::Redis(redis) => redis.connect(host, port)?,
            other => return Err(other.unsupported("server")),
        }
        Ok(self)
    }

    /// Stores a value with an optional TTL such as `"10s"`, `"5m"` or `"1h"`.
    pub fn set(&self, key: &str, value: CacheValue, ttl: Option<&str>) -> Result<()> {
        self.active()?.as_driver().set(key, value, ttl)
    }

    /// Reads a value; see [`CacheDriver::get`] for miss semantics per driver.
    pub fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        self.active()?.as_driver().get(key)
    }

    /// Deletes a value.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.active()?.as_driver().delete(key)
    }

    /// Removes every value and returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        self.active()?.as_driver().clear()
    }

    fn store_for(&self, kind: DriverKind) -> Result<Arc<dyn RemoteStore>> {
        self.remote_store.clone().ok_or_else(|| {
            CacheError::ConnectionFailed(format!(
                "no remote store registered for the {kind} driver"
            ))
        })
    }

    fn active(&self) -> Result<&ActiveDriver> {
        self.driver.as_ref().ok_or(CacheError::DriverNotSelected)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveDriver> {
        self.driver.as_mut().ok_or(CacheError::DriverNotSelected)
    }
}

impl fmt::Debug for CacheBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBox")
            .field("driver", &self.driver)
            .field("remote_store", &self.remote_store.is_some())
            .finish()
    }
}
