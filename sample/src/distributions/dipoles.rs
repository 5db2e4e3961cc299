//! Dislocation dipoles of fixed separation.
//!
//! The region is split into `nsub × nsub` sub-areas visited in row-major
//! order. Each sub-area receives `pairs` dipoles: a center drawn uniformly in
//! the sub-area, an orientation drawn uniformly on `[0, 2π)`, and two
//! dislocations `+1` then `-1` at `center ± (length/2)·(cos θ, sin θ)`.
//!
//! Endpoints are not rejected when they leave the region, unless `confine`
//! is set, in which case center and orientation are redrawn until both
//! endpoints lie strictly inside the region.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{balanced_count, point_in_cell, require_at_least_one, require_side, Draw};
use crate::error::SampleError;
use crate::model::{Dislocations, Region, Sense};

/// Registry name.
pub const NAME: &str = "dipoles";

/// User-facing parameters of the `dipoles` distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DipolesParameters {
    /// Dipole separation (m); `0` derives it as `1/√ρ`.
    pub length: f64,
    /// Sub-area subdivisions per side.
    pub nsub: u32,
    /// Dipoles per sub-area.
    pub pairs: u32,
    /// Side of the square region (m).
    pub side: f64,
    /// Redraw dipoles whose endpoints leave the region.
    pub confine: bool,
}

impl Default for DipolesParameters {
    fn default() -> Self {
        Self {
            length: 0.0,
            nsub: 1,
            pairs: 1,
            side: 1e-6,
            confine: false,
        }
    }
}

/// Validated `dipoles` distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Dipoles {
    nsub: u32,
    pairs: u32,
    side: f64,
    confine: bool,
    length: f64,
    density: f64,
    count: usize,
}

impl Dipoles {
    /// Validates `params` and derives the density and the effective length.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::InvalidParameter`] when `length < 0`,
    /// `nsub < 1`, `pairs < 1`, `side <= 0`, a value is not finite, or
    /// `confine` is requested with a separation larger than a sub-area side.
    pub fn new(params: DipolesParameters) -> Result<Self, SampleError> {
        require_side(params.side)?;
        require_at_least_one("nsub", params.nsub)?;
        require_at_least_one("pairs", params.pairs)?;
        if !(params.length.is_finite() && params.length >= 0.0) {
            return Err(SampleError::invalid(
                "length",
                format!("must be a finite value >= 0, got {}", params.length),
            ));
        }
        let count = balanced_count(params.nsub, params.pairs)?;
        let density = count as f64 / (params.side * params.side);
        let length = if params.length == 0.0 {
            1.0 / density.sqrt()
        } else {
            params.length
        };
        let cell = params.side / f64::from(params.nsub);
        if params.confine && length > cell {
            return Err(SampleError::invalid(
                "length",
                format!("confined dipoles need a separation <= {cell} (sub-area side), got {length}"),
            ));
        }
        Ok(Self {
            nsub: params.nsub,
            pairs: params.pairs,
            side: params.side,
            confine: params.confine,
            length,
            density,
            count,
        })
    }

    /// Effective dipole separation (m).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Draws one dipole in the sub-area (`row`, `col`) and returns the
    /// positive and negative endpoints.
    fn dipole(&self, rng: &mut ChaCha8Rng, row: u32, col: u32) -> ((f64, f64), (f64, f64)) {
        let region = self.region();
        let half = self.length / 2.0;
        loop {
            let (cx, cy) = point_in_cell(rng, row, col, self.nsub, self.side);
            let theta = TAU * rng.gen::<f64>();
            let (dx, dy) = (half * theta.cos(), half * theta.sin());
            let plus = (cx + dx, cy + dy);
            let minus = (cx - dx, cy - dy);
            if !self.confine
                || (region.contains(plus.0, plus.1) && region.contains(minus.0, minus.1))
            {
                return (plus, minus);
            }
        }
    }
}

impl Draw for Dipoles {
    fn name(&self) -> &'static str {
        NAME
    }

    fn density(&self) -> f64 {
        self.density
    }

    fn region(&self) -> Region {
        Region::Square { side: self.side }
    }

    fn parameters(&self) -> BTreeMap<String, Value> {
        let mut parameters = BTreeMap::new();
        parameters.insert("length".to_owned(), json!(self.length));
        parameters.insert("nsub".to_owned(), json!(self.nsub));
        parameters.insert("pairs".to_owned(), json!(self.pairs));
        parameters.insert("side".to_owned(), json!(self.side));
        parameters.insert("confine".to_owned(), json!(self.confine));
        parameters
    }

    fn populate(&self, rng: &mut ChaCha8Rng) -> Dislocations {
        let mut dislocations = Dislocations::with_capacity(self.count);
        for row in 0..self.nsub {
            for col in 0..self.nsub {
                for _ in 0..self.pairs {
                    let (plus, minus) = self.dipole(rng, row, col);
                    dislocations.push(Sense::Positive, plus.0, plus.1);
                    dislocations.push(Sense::Negative, minus.0, minus.1);
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
    use crate::model::Metadata;

    fn params(nsub: u32, pairs: u32, side: f64) -> DipolesParameters {
        DipolesParameters {
            nsub,
            pairs,
            side,
            ..DipolesParameters::default()
        }
    }

    #[test]
    fn density_follows_pairs_and_subdivisions() {
        let dipoles = Dipoles::new(params(1, 1, 2e-6)).unwrap();
        assert!((dipoles.density() - 5.0e11).abs() < 1.0);
        let dipoles = Dipoles::new(params(2, 1, 1e-6)).unwrap();
        assert!((dipoles.density() - 8.0e12).abs() < 1.0);
    }

    #[test]
    fn zero_length_derives_from_density() {
        let dipoles = Dipoles::new(params(1, 1, 2e-6)).unwrap();
        assert!((dipoles.length() - 1.0 / 5.0e11_f64.sqrt()).abs() < 1e-18);
        let explicit = Dipoles::new(DipolesParameters {
            length: 1e-8,
            ..params(1, 1, 2e-6)
        })
        .unwrap();
        assert_eq!(explicit.length(), 1e-8);
    }

    #[test]
    fn rejects_out_of_domain_parameters() {
        assert!(Dipoles::new(params(0, 1, 1e-6)).is_err());
        assert!(Dipoles::new(params(1, 0, 1e-6)).is_err());
        assert!(Dipoles::new(params(1, 1, 0.0)).is_err());
        assert!(Dipoles::new(params(1, 1, f64::NAN)).is_err());
        let negative = DipolesParameters {
            length: -1e-9,
            ..params(1, 1, 1e-6)
        };
        match Dipoles::new(negative) {
            Err(SampleError::InvalidParameter { name, .. }) => assert_eq!(name, "length"),
            other => panic!("expected invalid length, got {other:?}"),
        }
    }

    #[test]
    fn confine_requires_a_separation_within_a_sub_area() {
        let too_long = DipolesParameters {
            length: 0.6e-6,
            confine: true,
            ..params(2, 1, 1e-6)
        };
        assert!(Dipoles::new(too_long).is_err());
        let fits = DipolesParameters {
            length: 0.4e-6,
            confine: true,
            ..params(2, 1, 1e-6)
        };
        assert!(Dipoles::new(fits).is_ok());
    }

    #[test]
    fn pairs_are_adjacent_opposite_and_symmetric() {
        let dipoles = Dipoles::new(params(3, 2, 1e-6)).unwrap();
        let sample = Distribution::Dipoles(dipoles.clone()).draw_with(11, Metadata::now());
        let d = &sample.dislocations;
        assert_eq!(d.len(), 2 * 2 * 9);
        let cell = 1e-6 / 3.0;
        for i in (0..d.len()).step_by(2) {
            assert_eq!(d.senses[i], 1);
            assert_eq!(d.senses[i + 1], -1);
            let (x0, y0) = (d.positions[0][i], d.positions[1][i]);
            let (x1, y1) = (d.positions[0][i + 1], d.positions[1][i + 1]);
            let separation = ((x0 - x1).powi(2) + (y0 - y1).powi(2)).sqrt();
            assert!((separation - dipoles.length()).abs() < 1e-15);
            let (mx, my) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
            let pair = i / 2;
            let cell_index = pair / 2;
            let (row, col) = (cell_index / 3, cell_index % 3);
            assert!(mx > col as f64 * cell - 1e-18 && mx < (col + 1) as f64 * cell + 1e-18);
            assert!(my > row as f64 * cell - 1e-18 && my < (row + 1) as f64 * cell + 1e-18);
        }
    }

    #[test]
    fn confined_endpoints_stay_inside() {
        let dipoles = Dipoles::new(DipolesParameters {
            length: 0.3e-6,
            confine: true,
            ..params(2, 4, 1e-6)
        })
        .unwrap();
        let sample = Distribution::Dipoles(dipoles).draw(5);
        for dislocation in sample.dislocations.iter() {
            assert!(sample.region.contains(dislocation.x, dislocation.y));
        }
    }

    #[test]
    fn records_effective_parameters() {
        let dipoles = Dipoles::new(params(1, 1, 2e-6)).unwrap();
        let record = dipoles.parameters();
        assert_eq!(record["nsub"], json!(1));
        assert_eq!(record["pairs"], json!(1));
        assert_eq!(record["confine"], json!(false));
        assert_eq!(record["length"], json!(dipoles.length()));
    }
}
