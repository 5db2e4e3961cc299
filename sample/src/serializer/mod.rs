//! Serializers for dislocation samples.
//!
//! Two formats are supported:
//! - **JSON** ([`json`]): the canonical interchange format, `*.json`
//! - **Binary** ([`binary`]): a tagged little-endian encoding of the same
//!   mapping, `*.pyc`
//!
//! Decoding a binary file yields exactly the sample its JSON twin decodes to.

pub mod binary;
pub mod json;

use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::Sample;

/// On-disk sample format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Tagged binary value tree.
    Pyc,
}

impl Format {
    /// File extension (without the dot).
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Pyc => "pyc",
        }
    }

    /// Parses a file extension.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "json" => Some(Format::Json),
            "pyc" => Some(Format::Pyc),
            _ => None,
        }
    }

    /// Encodes `sample` in this format.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample cannot be represented (non-finite
    /// floats have no JSON form).
    pub fn encode(self, sample: &Sample) -> io::Result<Vec<u8>> {
        match self {
            Format::Json => json::encode(sample),
            Format::Pyc => binary::encode(sample),
        }
    }

    /// Decodes a sample from `bytes` in this format.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidData`] for malformed input.
    pub fn decode(self, bytes: &[u8]) -> io::Result<Sample> {
        match self {
            Format::Json => json::decode(bytes),
            Format::Pyc => binary::decode(bytes),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::from_extension(s).ok_or_else(|| StoreError::UnknownFormat(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_round_trip() {
        for format in [Format::Json, Format::Pyc] {
            assert_eq!(Format::from_extension(format.extension()), Some(format));
            assert_eq!(format.to_string().parse::<Format>().unwrap(), format);
        }
        assert!("npy".parse::<Format>().is_err());
    }
}
