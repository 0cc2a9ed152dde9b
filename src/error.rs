//! Error types for the cache drivers
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every driver and the facade.
#[derive(Error, Debug)]
pub enum CacheError {
    /// TTL string is not `<digits><s|m|h|d>`
    #[error("Invalid TTL format: {0:?}")]
    InvalidTtlFormat(String),

    /// Format name is not one the driver supports
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An operation ran before any format was selected
    #[error("No format selected. Call format() first")]
    UninitializedFormat,

    /// Storage root was never configured
    #[error("Uninitialized path. Call path() first")]
    UninitializedPath,

    /// Storage subdirectory name is empty
    #[error("Uninitialized directory. Call directory() first")]
    UninitializedDirectory,

    /// The storage directory could not be created
    #[error("Unable to create cache directory {}: {source}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Key cannot be mapped to a file name
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Key absent from storage
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored payload is corrupt or not in the declared format
    #[error("Decode error: {0}")]
    Decode(String),

    /// Value could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    /// Remote store is unreachable
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Driver name not known to the facade
    #[error("Driver {0} not supported")]
    UnsupportedDriver(String),

    /// Facade call before driver()
    #[error("No driver selected. Call driver() first")]
    DriverNotSelected,

    /// Configuration call that does not apply to the selected driver
    #[error("Operation {operation} is not supported by the {driver} driver")]
    UnsupportedOperation {
        driver: &'static str,
        operation: &'static str,
    },

    /// Generic read/write fault
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache drivers.
pub type Result<T> = std::result::Result<T, CacheError>;
