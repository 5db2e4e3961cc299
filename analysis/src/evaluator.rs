//! Wilkens Fourier-amplitude model over a transform's L-grid.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::transform::Transform;
use crate::wilkens;

/// Search interval of one fit parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound as published by the guide.
    pub min: f64,
    /// Upper bound as published by the guide.
    pub max: f64,
    /// Known true value, if any.
    pub real: Option<f64>,
}

impl Bounds {
    /// `(low, high)` regardless of the order `min` and `max` were given in.
    #[must_use]
    pub fn ordered(&self) -> (f64, f64) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }
}

/// Initial guesses and bounds for the fit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterGuide {
    /// Dislocation density ρ (m⁻²).
    pub density: Bounds,
    /// Outer cut-off radius Rₑ (m).
    pub cutoff: Bounds,
}

/// The Wilkens model bound to one transform and harmonic.
#[derive(Debug, Clone)]
pub struct WilkensModel {
    variables: Vec<f64>,
    scaled: Vec<f64>,
    observed: Vec<f64>,
    reference_density: f64,
    factor: f64,
}

impl WilkensModel {
    /// Builds the model for `harmonic`, keeping the first `limit` grid
    /// points when a limit is given.
    ///
    /// # Errors
    ///
    /// [`ModelError::UnknownHarmonic`] when the transform has no
    /// coefficients for `harmonic`, and [`ModelError::MalformedTransform`]
    /// when the grid and the coefficient rows disagree in length or the
    /// diffraction context is not finite.
    pub fn new(
        transform: &Transform,
        harmonic: u32,
        limit: Option<usize>,
    ) -> Result<Self, ModelError> {
        let coefficients = &transform.coefficients;
        let row = transform
            .harmonic_index(harmonic)
            .ok_or_else(|| ModelError::UnknownHarmonic {
                harmonic,
                available: coefficients.harmonic.clone(),
            })?;
        let points = limit.map_or(coefficients.variable.len(), |n| {
            n.min(coefficients.variable.len())
        });
        let variables = coefficients.variable[..points].to_vec();

        let observed = match coefficients.cos_mean.get(row) {
            Some(amplitudes) if amplitudes.len() == coefficients.variable.len() => {
                amplitudes[..points].to_vec()
            }
            Some(amplitudes) => {
                return Err(ModelError::MalformedTransform(format!(
                    "cos_mean row for harmonic {harmonic} has {} values for {} variables",
                    amplitudes.len(),
                    coefficients.variable.len()
                )))
            }
            None if coefficients.cos_mean.is_empty() => Vec::new(),
            None => {
                return Err(ModelError::MalformedTransform(format!(
                    "{} cos_mean rows for {} harmonics",
                    coefficients.cos_mean.len(),
                    coefficients.harmonic.len()
                )))
            }
        };

        let diffraction = &transform.diffraction;
        let cell = diffraction.cell;
        let g = norm(diffraction.g_hkl.map(|c| f64::from(harmonic) * c / cell));
        let b = norm(diffraction.b_uvw.map(|c| c * cell / 2.0));
        let factor = FRAC_PI_2 * g * g * b * b * diffraction.contrast;
        if !factor.is_finite() {
            return Err(ModelError::MalformedTransform(format!(
                "contrast factor is not finite (cell {cell}, contrast {})",
                diffraction.contrast
            )));
        }
        let scaled = variables.iter().map(|l| factor * l * l).collect();
        Ok(Self {
            variables,
            scaled,
            observed,
            reference_density: transform.reference_density(),
            factor,
        })
    }

    /// Fourier variables of the model grid.
    #[must_use]
    pub fn variables(&self) -> &[f64] {
        &self.variables
    }

    /// Λ = (π/2)|g|²|b|²C.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Density the transform's batch was drawn with.
    #[must_use]
    pub fn reference_density(&self) -> f64 {
        self.reference_density
    }

    /// Measured amplitudes of the model's harmonic over the model grid.
    ///
    /// Empty when the transform carries no cosine means.
    #[must_use]
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// Model amplitudes A(L) for density `density` and cut-off `cutoff`.
    ///
    /// A negative parameter yields +∞ at every point.
    #[must_use]
    pub fn evaluate(&self, density: f64, cutoff: f64) -> Vec<f64> {
        if density < 0.0 || cutoff < 0.0 {
            return vec![f64::INFINITY; self.scaled.len()];
        }
        self.variables
            .iter()
            .zip(&self.scaled)
            .map(|(&l, &scaled)| {
                if scaled == 0.0 {
                    1.0
                } else {
                    (-scaled * density * wilkens::f(l / cutoff)).exp()
                }
            })
            .collect()
    }

    /// The model as a function of `(ρ, Rₑ)` alone.
    pub fn closure(&self) -> impl Fn(f64, f64) -> Vec<f64> + '_ {
        move |density, cutoff| self.evaluate(density, cutoff)
    }

    /// Parameter guide derived from the reference density ρ₀.
    #[must_use]
    pub fn guide(&self) -> ParameterGuide {
        let rho = self.reference_density;
        let spacing = 1.0 / rho.sqrt();
        ParameterGuide {
            density: Bounds {
                min: rho / 100.0,
                max: rho * 100.0,
                real: Some(rho),
            },
            cutoff: Bounds {
                min: 1e3 * spacing,
                max: spacing / 10.0,
                real: None,
            },
        }
    }
}

fn norm(v: [f64; 3]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}
