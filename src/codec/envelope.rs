//! Envelope Codec
//!
//! Encodes a [`CacheEntry`] as bytes in one of the supported [`Format`]s and
//! decodes it back.
//!
//! - `Structured`: pretty-printed JSON object `{created_at, expires_at, value}`
//!   with non-ASCII text left unescaped. Text that is itself JSON is stored as
//!   the parsed document.
//! - `Serialized` / `PlainText`: bincode of the same envelope. Documents travel
//!   as their JSON text so any value round-trips exactly.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::entry::{CacheEntry, CacheValue};
use super::format::Format;
use crate::error::{CacheError, Result};

// == Binary Wire Types ==
/// Value as carried inside a bincode payload.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum StoredValue {
    Document(String),
    Bytes(Vec<u8>),
    Text(String),
}

impl StoredValue {
    pub(crate) fn from_value(value: &CacheValue) -> Result<Self> {
        Ok(match value {
            CacheValue::Document(doc) => StoredValue::Document(
                serde_json::to_string(doc).map_err(|e| CacheError::Encode(e.to_string()))?,
            ),
            CacheValue::Bytes(bytes) => StoredValue::Bytes(bytes.clone()),
            CacheValue::Text(text) => StoredValue::Text(text.clone()),
        })
    }

    pub(crate) fn into_value(self) -> Result<CacheValue> {
        Ok(match self {
            StoredValue::Document(text) => CacheValue::Document(
                serde_json::from_str(&text)
                    .map_err(|e| CacheError::Decode(format!("embedded document: {e}")))?,
            ),
            StoredValue::Bytes(bytes) => CacheValue::Bytes(bytes),
            StoredValue::Text(text) => CacheValue::Text(text),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEnvelope {
    created_at: i64,
    expires_at: Option<i64>,
    value: StoredValue,
}

// == Structured Normalization ==
/// Maps a value onto the JSON data model.
///
/// Text holding a JSON document becomes that document; other text becomes a
/// JSON string; bytes become an array of numbers.
pub(crate) fn to_document(value: &CacheValue) -> Value {
    match value {
        CacheValue::Document(doc) => doc.clone(),
        CacheValue::Text(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
        }
        CacheValue::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Inverse of [`to_document`]: strings read back as text, anything else as a document.
pub(crate) fn from_document(doc: Value) -> CacheValue {
    match doc {
        Value::String(text) => CacheValue::Text(text),
        other => CacheValue::Document(other),
    }
}

// == Encode ==
/// Encodes an entry in the given format.
pub fn encode(entry: &CacheEntry, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Structured => {
            let doc = json!({
                "created_at": entry.created_at,
                "expires_at": entry.expires_at,
                "value": to_document(&entry.value),
            });
            serde_json::to_vec_pretty(&doc).map_err(|e| CacheError::Encode(e.to_string()))
        }
        Format::Serialized | Format::PlainText => {
            let envelope = StoredEnvelope {
                created_at: entry.created_at,
                expires_at: entry.expires_at,
                value: StoredValue::from_value(&entry.value)?,
            };
            bincode::serialize(&envelope).map_err(|e| CacheError::Encode(e.to_string()))
        }
    }
}

// == Decode ==
/// Decodes an entry previously written in the given format.
///
/// # Errors
/// Returns [`CacheError::Decode`] when the bytes do not parse in `format` or
/// the envelope lacks `created_at` or `value`.
pub fn decode(bytes: &[u8], format: Format) -> Result<CacheEntry> {
    match format {
        Format::Structured => decode_structured(bytes),
        Format::Serialized | Format::PlainText => {
            let envelope: StoredEnvelope = bincode::deserialize(bytes)
                .map_err(|e| CacheError::Decode(format!("{format} envelope: {e}")))?;
            Ok(CacheEntry {
                created_at: envelope.created_at,
                expires_at: envelope.expires_at,
                value: envelope.value.into_value()?,
            })
        }
    }
}

fn decode_structured(bytes: &[u8]) -> Result<CacheEntry> {
    let doc: Value = serde_json::from_slice(bytes)
        .map_err(|e| CacheError::Decode(format!("json envelope: {e}")))?;
    let Value::Object(mut fields) = doc else {
        return Err(CacheError::Decode("json envelope is not an object".to_string()));
    };

    let created_at = fields
        .get("created_at")
        .and_then(Value::as_i64)
        .ok_or_else(|| missing_field("created_at"))?;
    let expires_at = timestamp_field(&fields, "expires_at")?;
    let value = fields.remove("value").ok_or_else(|| missing_field("value"))?;

    Ok(CacheEntry {
        created_at,
        expires_at,
        value: from_document(value),
    })
}

fn timestamp_field(fields: &Map<String, Value>, name: &str) -> Result<Option<i64>> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| CacheError::Decode(format!("{name} is not an integer timestamp"))),
    }
}

fn missing_field(name: &str) -> CacheError {
    CacheError::Decode(format!("json envelope is missing {name}"))
}
