//! Fourier-transform files written by [`diffract`](crate::diffraction::diffract).
//!
//! Fields outside the known layout are kept in the `extra` maps so a
//! transform survives a read/write cycle unchanged.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use numlpa_sample::{DistributionRecord, Region};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

/// Diffraction conditions the transform was computed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diffraction {
    /// Diffraction vector in reciprocal-lattice units.
    pub g_hkl: [f64; 3],
    /// Burgers vector in lattice units.
    pub b_uvw: [f64; 3],
    /// Lattice parameter (m).
    pub cell: f64,
    /// Dislocation contrast factor.
    pub contrast: f64,
    /// Remaining diffractometer settings.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Fourier coefficients of the batch, per harmonic and Fourier variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Harmonics the coefficients were computed for.
    pub harmonic: Vec<u32>,
    /// Fourier variable grid L (m).
    pub variable: Vec<f64>,
    /// Mean cosine amplitudes, one row per harmonic.
    #[serde(default)]
    pub cos_mean: Vec<Vec<f64>>,
    /// Mean sine amplitudes, one row per harmonic.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sin_mean: Vec<Vec<f64>>,
    /// Standard error of the cosine means.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cos_deviation: Vec<Vec<f64>>,
    /// Standard error of the sine means.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sin_deviation: Vec<Vec<f64>>,
    /// Mean square strain ⟨ε²(L)⟩ along the diffraction vector.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub square_strain: Vec<f64>,
    /// Fields this reader does not know about.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A transform file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Provenance of the sample batch.
    pub distribution: DistributionRecord,
    /// Region the batch was drawn on.
    pub region: Region,
    /// Diffraction conditions.
    pub diffraction: Diffraction,
    /// Computed coefficients.
    pub coefficients: Coefficients,
}

impl Transform {
    /// Reads a transform from a JSON file.
    ///
    /// # Errors
    ///
    /// [`ModelError::Read`] if the file cannot be read and
    /// [`ModelError::Parse`] if its content is not a transform.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Position of `harmonic` in the coefficient rows.
    #[must_use]
    pub fn harmonic_index(&self, harmonic: u32) -> Option<usize> {
        self.coefficients.harmonic.iter().position(|&h| h == harmonic)
    }

    /// Density the batch was drawn with (ρ₀).
    #[must_use]
    pub fn reference_density(&self) -> f64 {
        self.distribution.density
    }
}
