//! Configuration Module
//!
//! Explicit configuration values for the file driver and the in-memory store,
//! loadable from environment variables.

use std::env;
use std::path::PathBuf;

use crate::codec::Format;
use crate::error::Result;

/// Subdirectory used under the storage root when none is configured.
pub const DEFAULT_DIRECTORY: &str = "cacheBox";

/// File driver configuration.
///
/// Path and directory are only checked when an operation first needs them;
/// format names are checked as soon as they are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCacheConfig {
    /// Storage root
    pub path: Option<PathBuf>,
    /// Subdirectory under the root holding the entry files
    pub directory: String,
    /// Serialization format for every entry
    pub format: Option<Format>,
}

impl FileCacheConfig {
    /// Creates a configuration with no root, the default directory and no format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage root. Stored verbatim.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the subdirectory name.
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Selects the format by name (`json`, `serialize` or `txt`).
    pub fn with_format(mut self, name: &str) -> Result<Self> {
        self.format = Some(name.parse()?);
        Ok(self)
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHEBOX_PATH` - Storage root (default: unset)
    /// - `CACHEBOX_DIRECTORY` - Subdirectory (default: `cacheBox`)
    /// - `CACHEBOX_FORMAT` - `json`, `serialize` or `txt` (default: unset)
    pub fn from_env() -> Self {
        Self {
            path: env::var_os("CACHEBOX_PATH").map(PathBuf::from),
            directory: env::var("CACHEBOX_DIRECTORY")
                .unwrap_or_else(|_| DEFAULT_DIRECTORY.to_string()),
            format: env::var("CACHEBOX_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            directory: DEFAULT_DIRECTORY.to_string(),
            format: None,
        }
    }
}

/// In-memory store parameters.
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Maximum number of entries the store can hold
    pub max_entries: usize,
    /// Background purge interval in seconds
    pub purge_interval: u64,
}

impl MemoryStoreConfig {
    /// Creates a MemoryStoreConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHEBOX_MAX_ENTRIES` - Maximum entries (default: 1000)
    /// - `CACHEBOX_PURGE_INTERVAL` - Purge frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env::var("CACHEBOX_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            purge_interval: env::var("CACHEBOX_PURGE_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.purge_interval),
        }
    }
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            purge_interval: 1,
        }
    }
}
