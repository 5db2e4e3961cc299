//! Restrictedly random dislocation distribution.
//!
//! The region is split into `nsub × nsub` sub-areas visited in row-major
//! order; each receives `pairs` positive then `pairs` negative dislocations
//! at independent uniform positions. The net Burgers vector of every
//! sub-area is therefore zero.

use std::collections::BTreeMap;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{balanced_count, point_in_cell, require_at_least_one, require_side, Draw};
use crate::error::SampleError;
use crate::model::{Dislocations, Region, Sense};

/// Registry name.
pub const NAME: &str = "restricted";

/// User-facing parameters of the `restricted` distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictedParameters {
    /// Sub-area subdivisions per side.
    pub nsub: u32,
    /// Dislocations of each sign per sub-area.
    pub pairs: u32,
    /// Side of the square region (m).
    pub side: f64,
}

impl Default for RestrictedParameters {
    fn default() -> Self {
        Self {
            nsub: 1,
            pairs: 1,
            side: 1e-6,
        }
    }
}

/// Validated `restricted` distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Restricted {
    nsub: u32,
    pairs: u32,
    side: f64,
    count: usize,
}

impl Restricted {
    /// Validates `params`.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidParameter`] when `nsub < 1`,
    /// `pairs < 1` or the side is not a finite positive value.
    pub fn new(params: RestrictedParameters) -> Result<Self, SampleError> {
        require_side(params.side)?;
        require_at_least_one("nsub", params.nsub)?;
        require_at_least_one("pairs", params.pairs)?;
        let count = balanced_count(params.nsub, params.pairs)?;
        Ok(Self {
            nsub: params.nsub,
            pairs: params.pairs,
            side: params.side,
            count,
        })
    }
}

impl Draw for Restricted {
    fn name(&self) -> &'static str {
        NAME
    }

    fn density(&self) -> f64 {
        self.count as f64 / (self.side * self.side)
    }

    fn region(&self) -> Region {
        Region::Square { side: self.side }
    }

    fn parameters(&self) -> BTreeMap<String, Value> {
        let mut parameters = BTreeMap::new();
        parameters.insert("nsub".to_owned(), json!(self.nsub));
        parameters.insert("pairs".to_owned(), json!(self.pairs));
        parameters.insert("side".to_owned(), json!(self.side));
        parameters
    }

    fn populate(&self, rng: &mut ChaCha8Rng) -> Dislocations {
        let mut dislocations = Dislocations::with_capacity(self.count);
        for row in 0..self.nsub {
            for col in 0..self.nsub {
                for sense in [Sense::Positive, Sense::Negative] {
                    for _ in 0..self.pairs {
                        let (x, y) = point_in_cell(rng, row, col, self.nsub, self.side);
                        dislocations.push(sense, x, y);
                    }
                }
            }
        }
        dislocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::Distribution;

    #[test]
    fn every_sub_area_is_balanced() {
        let restricted = Restricted::new(RestrictedParameters {
            nsub: 4,
            pairs: 3,
            side: 2e-6,
        })
        .unwrap();
        let sample = Distribution::Restricted(restricted).draw(1);
        let d = &sample.dislocations;
        assert_eq!(d.len(), 2 * 3 * 16);
        let cell = 2e-6 / 4.0;
        for chunk in 0..16 {
            let senses = &d.senses[chunk * 6..(chunk + 1) * 6];
            assert_eq!(senses.iter().map(|&s| i32::from(s)).sum::<i32>(), 0);
            let (row, col) = (chunk / 4, chunk % 4);
            for i in chunk * 6..(chunk + 1) * 6 {
                let (x, y) = (d.positions[0][i], d.positions[1][i]);
                assert!(x > col as f64 * cell && x <= (col + 1) as f64 * cell);
                assert!(y > row as f64 * cell && y <= (row + 1) as f64 * cell);
            }
        }
        assert!(sample.density_is_consistent(1e-12));
    }
}
