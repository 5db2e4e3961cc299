//! Error types of the distribution engine and the sample store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while selecting or configuring a distribution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    /// The requested name is not in the registry.
    #[error("unknown distribution `{0}` (expected dipoles, uniform or restricted)")]
    UnknownDistribution(String),
    /// A parameter lies outside its declared domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as exposed on the command line.
        name: &'static str,
        /// Domain that was violated.
        reason: String,
    },
}

impl SampleError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the sample store and the codecs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The target file is already present; the store never overwrites.
    #[error("sample file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// Writing or encoding the file failed.
    #[error("failed to write sample file {}: {source}", path.display())]
    Serialization {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O or encoding failure.
        #[source]
        source: std::io::Error,
    },
    /// Reading or decoding the file failed.
    #[error("failed to read sample file {}: {source}", path.display())]
    Decode {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O or decoding failure.
        #[source]
        source: std::io::Error,
    },
    /// Listing the container directory failed.
    #[error("failed to list sample container {}: {source}", path.display())]
    Listing {
        /// Container directory.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file extension does not name a known format.
    #[error("unknown sample format `{0}` (expected json or pyc)")]
    UnknownFormat(String),
}
