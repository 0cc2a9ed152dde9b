//! Codec Module
//!
//! Entry envelope, value shapes and the byte encodings drivers persist them in.

mod entry;
mod envelope;
mod format;
mod tagged;

// Re-export public types
pub use entry::{current_timestamp, CacheEntry, CacheValue};
pub use envelope::{decode, encode};
pub use format::Format;
pub use tagged::{decode_tagged, encode_tagged, TaggedFormat};
