//! Tagged Value Codec
//!
//! Remote stores keep opaque bytes, so remote drivers wrap each value in a
//! small `{type, value}` document before handing it over. The wrapper is
//! written either with bincode (`string`) or as pretty JSON (`json`).
//!
//! Reading tries the decoders in a fixed order and reports every failure once
//! all of them are exhausted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::entry::CacheValue;
use super::envelope::{from_document, to_document, StoredValue};
use crate::error::{CacheError, Result};

// == Tagged Format ==
/// Wrapper encoding used by remote drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedFormat {
    /// bincode wrapper, exact round-trip for every value shape
    String,
    /// pretty JSON wrapper, value normalized onto the JSON data model
    Json,
}

impl TaggedFormat {
    /// Configuration name, also written as the wrapper's `type` tag.
    pub fn name(self) -> &'static str {
        match self {
            TaggedFormat::String => "string",
            TaggedFormat::Json => "json",
        }
    }
}

impl FromStr for TaggedFormat {
    type Err = CacheError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name {
            "string" => Ok(TaggedFormat::String),
            "json" => Ok(TaggedFormat::Json),
            other => Err(CacheError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TaggedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BinaryTagged {
    kind: String,
    value: StoredValue,
}

// == Encode ==
/// Wraps and encodes a value for a remote store.
pub fn encode_tagged(value: &CacheValue, format: TaggedFormat) -> Result<Vec<u8>> {
    match format {
        TaggedFormat::String => {
            let tagged = BinaryTagged {
                kind: format.name().to_string(),
                value: StoredValue::from_value(value)?,
            };
            bincode::serialize(&tagged).map_err(|e| CacheError::Encode(e.to_string()))
        }
        TaggedFormat::Json => {
            let doc = json!({
                "type": format.name(),
                "value": to_document(value),
            });
            serde_json::to_vec_pretty(&doc).map_err(|e| CacheError::Encode(e.to_string()))
        }
    }
}

// == Decode ==
type Decoder = fn(&[u8]) -> std::result::Result<CacheValue, String>;

/// Decoders in the order they are attempted.
const DECODERS: [(TaggedFormat, Decoder); 2] = [
    (TaggedFormat::String, decode_binary),
    (TaggedFormat::Json, decode_json),
];

/// Decodes a wrapped value without knowing which format wrote it.
///
/// # Errors
/// Returns [`CacheError::Decode`] listing each attempt's failure when no
/// decoder accepts the bytes.
pub fn decode_tagged(bytes: &[u8]) -> Result<CacheValue> {
    let mut failures = Vec::with_capacity(DECODERS.len());
    for (format, decoder) in DECODERS {
        match decoder(bytes) {
            Ok(value) => return Ok(value),
            Err(reason) => failures.push(format!("{format}: {reason}")),
        }
    }
    Err(CacheError::Decode(failures.join("; ")))
}

fn decode_binary(bytes: &[u8]) -> std::result::Result<CacheValue, String> {
    let tagged: BinaryTagged = bincode::deserialize(bytes).map_err(|e| e.to_string())?;
    if tagged.kind != TaggedFormat::String.name() {
        return Err(format!("unexpected type tag {:?}", tagged.kind));
    }
    tagged.value.into_value().map_err(|e| e.to_string())
}

fn decode_json(bytes: &[u8]) -> std::result::Result<CacheValue, String> {
    let doc: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    let Value::Object(mut fields) = doc else {
        return Err("wrapper is not an object".to_string());
    };
    if fields.get("type").and_then(Value::as_str).is_none() {
        return Err("wrapper is missing type".to_string());
    }
    fields
        .remove("value")
        .map(from_document)
        .ok_or_else(|| "wrapper is missing value".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("string".parse::<TaggedFormat>().unwrap(), TaggedFormat::String);
        assert_eq!("json".parse::<TaggedFormat>().unwrap(), TaggedFormat::Json);
        assert!(matches!(
            "serialize".parse::<TaggedFormat>(),
            Err(CacheError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_binary_wrapper_is_exact() {
        let value = CacheValue::Bytes(vec![9, 8, 7]);
        let bytes = encode_tagged(&value, TaggedFormat::String).unwrap();
        assert_eq!(decode_tagged(&bytes).unwrap(), value);
    }

    #[test]
    fn test_json_wrapper_falls_through_binary_attempt() {
        let bytes = encode_tagged(&r#"{"k":[true]}"#.into(), TaggedFormat::Json).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("\"type\": \"json\""));

        assert_eq!(
            decode_tagged(&bytes).unwrap(),
            CacheValue::Document(json!({"k": [true]}))
        );
    }

    #[test]
    fn test_exhausted_attempts_report_each_failure() {
        let err = decode_tagged(b"plain bytes from someone else").unwrap_err();
        match err {
            CacheError::Decode(reason) => {
                assert!(reason.contains("string:"));
                assert!(reason.contains("json:"));
            }
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_untyped_json_is_rejected() {
        assert!(decode_tagged(br#"{"value": 1}"#).is_err());
    }
}
