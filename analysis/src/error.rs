//! Error types of the field computations, the model evaluator, the fit
//! harness and the bootstrap aggregator.

use std::path::PathBuf;

use thiserror::Error;

use crate::lattice::Character;

/// Errors raised while reading a transform or building a model from it.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The transform file could not be read.
    #[error("failed to read transform {}: {source}", path.display())]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The transform file is not valid transform JSON.
    #[error("failed to parse transform {}: {source}", path.display())]
    Parse {
        /// Source path.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// The requested harmonic was not computed in the transform.
    #[error("harmonic {harmonic} not present in transform (available: {available:?})")]
    UnknownHarmonic {
        /// Requested harmonic.
        harmonic: u32,
        /// Harmonics present in the transform.
        available: Vec<u32>,
    },
    /// The transform is structurally inconsistent.
    #[error("malformed transform: {0}")]
    MalformedTransform(String),
}

/// Errors raised by the bootstrap aggregator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BootstrapError {
    /// Fewer than two λ values were supplied.
    #[error("bootstrap needs at least two λ values, got {count}")]
    EmptyDistribution {
        /// Number of values supplied.
        count: usize,
    },
    /// An argument lies outside its domain.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// Domain that was violated.
        reason: String,
    },
}

/// Errors raised while computing fields of a sample (diffraction and strain
/// energy).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    /// A setting lies outside its domain.
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Domain that was violated.
        reason: String,
    },
    /// The dislocation character is not handled by the computation.
    #[error("{0} dislocations are not supported by the strain-energy evaluator")]
    UnsupportedCharacter(Character),
    /// The sample arrays are inconsistent.
    #[error("malformed sample: {0}")]
    MalformedSample(String),
    /// Every random point fell within the core radius of a dislocation.
    #[error("all {points} random points lie within a dislocation core")]
    AllPointsHidden {
        /// Number of random points drawn.
        points: usize,
    },
}

impl FieldError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name,
            reason: reason.into(),
        }
    }
}
