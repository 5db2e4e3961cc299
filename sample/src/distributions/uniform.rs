//! Uniformly random dislocation distribution.
//!
//! Every dislocation gets an independent position, uniform over the open
//! square, and an independent sign, `+1` or `-1` with equal probability.

use std::collections::BTreeMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{point_in_cell, require_at_least_one, require_side, Draw};
use crate::error::SampleError;
use crate::model::{Dislocations, Region, Sense};

/// Registry name.
pub const NAME: &str = "uniform";

/// User-facing parameters of the `uniform` distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformParameters {
    /// Number of dislocations.
    pub number: u32,
    /// Side of the square region (m).
    pub side: f64,
}

impl Default for UniformParameters {
    fn default() -> Self {
        Self {
            number: 100,
            side: 1e-6,
        }
    }
}

/// Validated `uniform` distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    number: u32,
    side: f64,
}

impl Uniform {
    /// Validates `params`.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidParameter`] when `number < 1` or the
    /// side is not a finite positive value.
    pub fn new(params: UniformParameters) -> Result<Self, SampleError> {
        require_side(params.side)?;
        require_at_least_one("number", params.number)?;
        Ok(Self {
            number: params.number,
            side: params.side,
        })
    }
}

impl Draw for Uniform {
    fn name(&self) -> &'static str {
        NAME
    }

    fn density(&self) -> f64 {
        f64::from(self.number) / (self.side * self.side)
    }

    fn region(&self) -> Region {
        Region::Square { side: self.side }
    }

    fn parameters(&self) -> BTreeMap<String, Value> {
        let mut parameters = BTreeMap::new();
        parameters.insert("number".to_owned(), json!(self.number));
        parameters.insert("side".to_owned(), json!(self.side));
        parameters
    }

    fn populate(&self, rng: &mut ChaCha8Rng) -> Dislocations {
        let mut dislocations = Dislocations::with_capacity(self.number as usize);
        for _ in 0..self.number {
            let (x, y) = point_in_cell(rng, 0, 0, 1, self.side);
            let sense = if rng.gen::<bool>() {
                Sense::Positive
            } else {
                Sense::Negative
            };
            dislocations.push(sense, x, y);
        }
        dislocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::Distribution;

    #[test]
    fn draws_the_requested_number_inside_the_region() {
        let uniform = Uniform::new(UniformParameters {
            number: 64,
            side: 3e-6,
        })
        .unwrap();
        let sample = Distribution::Uniform(uniform).draw(9);
        assert_eq!(sample.dislocations.len(), 64);
        assert!(sample.density_is_consistent(1e-12));
        for dislocation in sample.dislocations.iter() {
            assert!(sample.region.contains(dislocation.x, dislocation.y));
        }
    }

    #[test]
    fn rejects_empty_draws() {
        assert!(Uniform::new(UniformParameters {
            number: 0,
            side: 1e-6,
        })
        .is_err());
    }
}
