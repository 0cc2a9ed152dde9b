//! Storage Format Module
//!
//! Enumerates the serialization schemes a file driver can persist entries in.

use std::fmt;
use std::str::FromStr;

use crate::error::CacheError;

// == Format ==
/// Serialization scheme for the persisted envelope.
///
/// Fixed once per driver instance; every entry that instance writes uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Pretty-printed JSON document (`json`)
    Structured,
    /// Generic binary serialization (`serialize`)
    Serialized,
    /// Same encoding as `Serialized`, stored under a `.txt` extension (`txt`)
    PlainText,
}

impl Format {
    /// All supported formats.
    pub const ALL: [Format; 3] = [Format::Structured, Format::Serialized, Format::PlainText];

    /// Configuration name of the format.
    pub fn name(self) -> &'static str {
        match self {
            Format::Structured => "json",
            Format::Serialized => "serialize",
            Format::PlainText => "txt",
        }
    }

    /// File extension used for entries in this format.
    pub fn extension(self) -> &'static str {
        self.name()
    }
}

impl FromStr for Format {
    type Err = CacheError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|format| format.name() == name)
            .ok_or_else(|| CacheError::UnsupportedFormat(name.to_string()))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
