//! Cache Entry Module
//!
//! Defines the envelope persisted for every key and the closed set of value
//! shapes a cache can hold.

use chrono::Utc;

// == Cache Value ==
/// Payload stored under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Structured document (JSON data model)
    Document(serde_json::Value),
    /// Opaque byte blob
    Bytes(Vec<u8>),
    /// Plain text
    Text(String),
}

impl CacheValue {
    /// Returns the text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CacheValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the document if this is a `Document` value.
    pub fn as_document(&self) -> Option<&serde_json::Value> {
        match self {
            CacheValue::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<&str> for CacheValue {
    fn from(text: &str) -> Self {
        CacheValue::Text(text.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(text: String) -> Self {
        CacheValue::Text(text)
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(bytes: Vec<u8>) -> Self {
        CacheValue::Bytes(bytes)
    }
}

impl From<serde_json::Value> for CacheValue {
    fn from(doc: serde_json::Value) -> Self {
        CacheValue::Document(doc)
    }
}

// == Cache Entry ==
/// Envelope written for each key: creation time, optional expiry and value.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
    /// Expiration timestamp (Unix seconds), None = no expiration
    pub expires_at: Option<i64>,
    /// The stored value
    pub value: CacheValue,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_seconds` - Optional TTL in seconds
    pub fn new(value: CacheValue, ttl_seconds: Option<u64>) -> Self {
        Self::stamped(value, ttl_seconds, current_timestamp())
    }

    /// Creates an entry as if written at `now`.
    pub fn stamped(value: CacheValue, ttl_seconds: Option<u64>, now: i64) -> Self {
        let expires_at = ttl_seconds.map(|ttl| {
            i64::try_from(ttl)
                .map(|ttl| now.saturating_add(ttl))
                .unwrap_or(i64::MAX)
        });

        Self {
            created_at: now,
            expires_at,
            value,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry expires strictly after `expires_at`: at the expiry second
    /// itself it is still readable.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    /// Checks expiry against an explicit clock reading.
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires) if now > expires)
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, or None if no expiration is set.
    pub fn ttl_remaining(&self) -> Option<u64> {
        let now = current_timestamp();
        self.expires_at
            .map(|expires| u64::try_from(expires.saturating_sub(now)).unwrap_or(0))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}
