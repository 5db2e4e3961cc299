//! Distribution engine.
//!
//! The registry is closed: every distribution is a variant of
//! [`Distribution`], carrying its validated parameters. Command layers map a
//! user-supplied name to a variant with [`Distribution::from_name`].
//!
//! ```
//! use numlpa_sample::distributions::{Distribution, ParameterSets};
//!
//! let mut sets = ParameterSets::default();
//! sets.dipoles.nsub = 2;
//! sets.dipoles.pairs = 1;
//! sets.dipoles.side = 1e-6;
//! let distribution = Distribution::from_name("dipoles", &sets).unwrap();
//! let sample = distribution.draw(42);
//! assert_eq!(sample.dislocations.len(), 8);
//! ```

pub mod dipoles;
pub mod restricted;
pub mod uniform;

use std::collections::BTreeMap;

use rand::distributions::Open01;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SampleError;
use crate::model::{DistributionRecord, Dislocations, Metadata, Region, Sample};

pub use dipoles::{Dipoles, DipolesParameters};
pub use restricted::{Restricted, RestrictedParameters};
pub use uniform::{Uniform, UniformParameters};

/// Names of every registered distribution, in registry order.
pub const NAMES: &[&str] = &[dipoles::NAME, uniform::NAME, restricted::NAME];

/// Behavior shared by every registered distribution.
pub trait Draw {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Derived dislocation density (m⁻²).
    fn density(&self) -> f64;

    /// Region the dislocations are drawn in.
    fn region(&self) -> Region;

    /// Effective parameters, recorded in the sample provenance.
    fn parameters(&self) -> BTreeMap<String, Value>;

    /// Draws the dislocations using `rng`.
    fn populate(&self, rng: &mut ChaCha8Rng) -> Dislocations;
}

/// Per-distribution parameter sets with their defaults.
///
/// This is the shape of the `[distributions]` table of the configuration
/// file; missing tables or keys fall back to the `Default` impls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSets {
    /// Parameters of the `dipoles` distribution.
    pub dipoles: DipolesParameters,
    /// Parameters of the `uniform` distribution.
    pub uniform: UniformParameters,
    /// Parameters of the `restricted` distribution.
    pub restricted: RestrictedParameters,
}

/// A registered distribution with validated parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    /// Dislocation dipoles of fixed separation.
    Dipoles(Dipoles),
    /// Uniformly random dislocations.
    Uniform(Uniform),
    /// Restrictedly random dislocations, balanced per sub-area.
    Restricted(Restricted),
}

impl Distribution {
    /// Selects the distribution called `name`, validating its parameters
    /// from `sets`.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::UnknownDistribution`] for a name outside the
    /// registry and [`SampleError::InvalidParameter`] for a parameter outside
    /// its domain.
    pub fn from_name(name: &str, sets: &ParameterSets) -> Result<Self, SampleError> {
        match name {
            dipoles::NAME => Ok(Self::Dipoles(Dipoles::new(sets.dipoles)?)),
            uniform::NAME => Ok(Self::Uniform(Uniform::new(sets.uniform)?)),
            restricted::NAME => Ok(Self::Restricted(Restricted::new(sets.restricted)?)),
            other => Err(SampleError::UnknownDistribution(other.to_owned())),
        }
    }

    fn inner(&self) -> &dyn Draw {
        match self {
            Self::Dipoles(d) => d,
            Self::Uniform(d) => d,
            Self::Restricted(d) => d,
        }
    }

    /// Registry name of the distribution.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner().name()
    }

    /// Derived dislocation density (m⁻²).
    #[must_use]
    pub fn density(&self) -> f64 {
        self.inner().density()
    }

    /// Region of interest.
    #[must_use]
    pub fn region(&self) -> Region {
        self.inner().region()
    }

    /// Draws one sample stamped with the current time.
    #[must_use]
    pub fn draw(&self, seed: u64) -> Sample {
        self.draw_with(seed, Metadata::now())
    }

    /// Draws one sample with an explicit provenance header.
    ///
    /// For a fixed `seed` the distribution record, region and dislocations
    /// are bit-identical across calls.
    #[must_use]
    pub fn draw_with(&self, seed: u64, metadata: Metadata) -> Sample {
        let inner = self.inner();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let dislocations = inner.populate(&mut rng);
        Sample {
            metadata,
            distribution: DistributionRecord {
                module: inner.name().to_owned(),
                seed,
                density: inner.density(),
                parameters: inner.parameters(),
            },
            region: inner.region(),
            dislocations,
        }
    }
}

/// Uniform draw on the open interval `(0, 1)`.
pub(crate) fn open_unit(rng: &mut ChaCha8Rng) -> f64 {
    rng.sample(Open01)
}

/// Draws a point strictly inside the sub-area at (`row`, `col`) of a
/// square of side `side` split `nsub` times per side.
pub(crate) fn point_in_cell(
    rng: &mut ChaCha8Rng,
    row: u32,
    col: u32,
    nsub: u32,
    side: f64,
) -> (f64, f64) {
    let cell = side / f64::from(nsub);
    let x = coordinate(rng, col, cell, side);
    let y = coordinate(rng, row, cell, side);
    (x, y)
}

fn coordinate(rng: &mut ChaCha8Rng, index: u32, cell: f64, side: f64) -> f64 {
    loop {
        if let Some(v) = cell_coordinate(index, open_unit(rng), cell, side) {
            return v;
        }
    }
}

/// `cell · (index + u)`, or `None` when rounding pushed it onto or past the
/// edge of `(0, side)`.
fn cell_coordinate(index: u32, u: f64, cell: f64, side: f64) -> Option<f64> {
    let v = cell * (f64::from(index) + u);
    (v > 0.0 && v < side).then_some(v)
}

pub(crate) fn require_side(side: f64) -> Result<(), SampleError> {
    if side.is_finite() && side > 0.0 {
        Ok(())
    } else {
        Err(SampleError::invalid(
            "side",
            format!("must be a finite value > 0, got {side}"),
        ))
    }
}

pub(crate) fn require_at_least_one(name: &'static str, value: u32) -> Result<(), SampleError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(SampleError::invalid(name, format!("must be >= 1, got {value}")))
    }
}

/// Number of dislocations for `2 · pairs · nsub²`, rejecting overflow.
pub(crate) fn balanced_count(nsub: u32, pairs: u32) -> Result<usize, SampleError> {
    u64::from(nsub)
        .checked_mul(u64::from(nsub))
        .and_then(|n| n.checked_mul(u64::from(pairs)))
        .and_then(|n| n.checked_mul(2))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| SampleError::invalid("pairs", "dislocation count overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_rejected() {
        let err = Distribution::from_name("grid", &ParameterSets::default()).unwrap_err();
        assert_eq!(err, SampleError::UnknownDistribution("grid".to_owned()));
    }

    #[test]
    fn every_registered_name_resolves() {
        for name in NAMES {
            let distribution = Distribution::from_name(name, &ParameterSets::default()).unwrap();
            assert_eq!(distribution.name(), *name);
        }
    }

    #[test]
    fn draw_records_provenance() {
        let distribution = Distribution::from_name("uniform", &ParameterSets::default()).unwrap();
        let sample = distribution.draw(3);
        assert_eq!(sample.distribution.module, "uniform");
        assert_eq!(sample.distribution.seed, 3);
        assert_eq!(sample.distribution.density, distribution.density());
        assert_eq!(sample.region, distribution.region());
    }

    #[test]
    fn coordinates_never_round_onto_the_far_edge() {
        let largest = 1.0 - f64::EPSILON;
        assert_eq!(cell_coordinate(2, largest, 1.0 / 3.0, 1.0), None);
        let v = cell_coordinate(2, 0.5, 1.0 / 3.0, 1.0).unwrap();
        assert!((v - 2.5 / 3.0).abs() < 1e-15);
        assert!(cell_coordinate(0, 1e-300, 1e-6, 1e-6).is_some());
    }

    #[test]
    fn balanced_count_detects_overflow() {
        assert_eq!(balanced_count(2, 3).unwrap(), 24);
        assert!(balanced_count(u32::MAX, u32::MAX).is_err());
    }
}
