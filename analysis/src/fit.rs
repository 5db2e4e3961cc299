//! Least-squares fit of the Wilkens model to measured amplitudes.
//!
//! The search runs a bounded Nelder–Mead simplex over the base-10
//! logarithms of the dimensionless parameters `ρ/ρ₀` and `Rₑ·√ρ₀`, inside
//! the box published by [`WilkensModel::guide`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ModelError;
use crate::evaluator::WilkensModel;
use crate::transform::Transform;

/// Default convergence tolerance on the simplex spread.
pub const NELDER_MEAD_TOLERANCE: f64 = 1e-10;

/// Default iteration budget.
pub const NELDER_MEAD_MAX_ITERATIONS: usize = 2000;

/// Edge of the initial simplex, in decades.
const INITIAL_STEP: f64 = 0.25;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Stopping rules of the simplex search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Convergence threshold on the simplex diameter (decades) and on the
    /// relative spread of the residuals.
    pub tolerance: f64,
    /// Iteration budget.
    pub max_iterations: usize,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            tolerance: NELDER_MEAD_TOLERANCE,
            max_iterations: NELDER_MEAD_MAX_ITERATIONS,
        }
    }
}

/// Best-fit parameters of one transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Fitted density ρ (m⁻²).
    pub density: f64,
    /// Fitted cut-off radius Rₑ (m).
    pub cutoff: f64,
    /// Growth factor ρ/ρ₀.
    pub lambda: f64,
    /// Sum of squared residuals at the optimum.
    pub residual: f64,
    /// Simplex iterations performed.
    pub iterations: usize,
    /// Whether the tolerance was met within the budget.
    pub converged: bool,
}

/// Fit of one transform file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFit {
    /// Transform the fit was computed from.
    pub source: PathBuf,
    /// Fit outcome.
    #[serde(flatten)]
    pub result: FitResult,
}

/// λ values handed over to the bootstrap command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LambdaFile {
    /// One growth factor per fitted transform.
    pub lambdas: Vec<f64>,
    /// Optional `(p_low, p_high)` pair from an external test.
    #[serde(rename = "p-values", default, skip_serializing_if = "Option::is_none")]
    pub p_values: Option<[f64; 2]>,
    /// Per-transform detail.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fits: Vec<SampleFit>,
}

impl LambdaFile {
    /// Collects the λ of every fit.
    #[must_use]
    pub fn from_fits(fits: Vec<SampleFit>) -> Self {
        Self {
            lambdas: fits.iter().map(|f| f.result.lambda).collect(),
            p_values: None,
            fits,
        }
    }
}

/// Fits `model` to its observed amplitudes.
///
/// # Errors
///
/// [`ModelError::MalformedTransform`] when the model has no observations
/// or its reference density is not a positive number.
pub fn fit(model: &WilkensModel, settings: FitSettings) -> Result<FitResult, ModelError> {
    let observed = model.observed();
    if observed.is_empty() {
        return Err(ModelError::MalformedTransform(
            "no cos_mean amplitudes to fit".to_owned(),
        ));
    }
    let rho = model.reference_density();
    if !(rho.is_finite() && rho > 0.0) {
        return Err(ModelError::MalformedTransform(format!(
            "reference density must be positive, got {rho}"
        )));
    }
    let spacing = 1.0 / rho.sqrt();
    let guide = model.guide();
    let (dlo, dhi) = guide.density.ordered();
    let (clo, chi) = guide.cutoff.ordered();
    let lower = [(dlo / rho).log10(), (clo / spacing).log10()];
    let upper = [(dhi / rho).log10(), (chi / spacing).log10()];

    let to_physical = |p: [f64; 2]| (rho * 10f64.powf(p[0]), spacing * 10f64.powf(p[1]));
    let objective = |p: [f64; 2]| {
        if (0..2).any(|i| p[i] < lower[i] || p[i] > upper[i]) {
            return f64::INFINITY;
        }
        let (density, cutoff) = to_physical(p);
        let residual: f64 = model
            .evaluate(density, cutoff)
            .iter()
            .zip(observed)
            .map(|(m, o)| (m - o) * (m - o))
            .sum();
        if residual.is_nan() {
            f64::INFINITY
        } else {
            residual
        }
    };

    let start = [0.0f64.clamp(lower[0], upper[0]), 0.0f64.clamp(lower[1], upper[1])];
    let outcome = nelder_mead(objective, start, settings);
    let (density, cutoff) = to_physical(outcome.point);
    let result = FitResult {
        density,
        cutoff,
        lambda: density / rho,
        residual: outcome.value,
        iterations: outcome.iterations,
        converged: outcome.converged,
    };
    debug!(?result, "fit finished");
    Ok(result)
}

/// Fits every transform in `paths` for `harmonic`.
///
/// # Errors
///
/// Stops at the first transform that cannot be read or modelled.
pub fn fit_all(
    paths: &[PathBuf],
    harmonic: u32,
    limit: Option<usize>,
    settings: FitSettings,
) -> Result<Vec<SampleFit>, ModelError> {
    let mut fits = Vec::with_capacity(paths.len());
    for path in paths {
        let result = fit_file(path, harmonic, limit, settings)?;
        if !result.converged {
            warn!(iterations = result.iterations, "fit of {} did not converge", path.display());
        }
        fits.push(SampleFit {
            source: path.clone(),
            result,
        });
    }
    info!(count = fits.len(), harmonic, "fitted transforms");
    Ok(fits)
}

fn fit_file(
    path: &Path,
    harmonic: u32,
    limit: Option<usize>,
    settings: FitSettings,
) -> Result<FitResult, ModelError> {
    let transform = Transform::load(path)?;
    let model = WilkensModel::new(&transform, harmonic, limit)?;
    fit(&model, settings)
}

struct Outcome {
    point: [f64; 2],
    value: f64,
    iterations: usize,
    converged: bool,
}

fn nelder_mead(objective: impl Fn([f64; 2]) -> f64, start: [f64; 2], settings: FitSettings) -> Outcome {
    let mut simplex = [
        start,
        [start[0] + INITIAL_STEP, start[1]],
        [start[0], start[1] + INITIAL_STEP],
    ];
    let mut values = simplex.map(&objective);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iterations {
        order(&mut simplex, &mut values);
        if settled(&simplex, &values, settings.tolerance) {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid = [
            (simplex[0][0] + simplex[1][0]) / 2.0,
            (simplex[0][1] + simplex[1][1]) / 2.0,
        ];
        let along = |t: f64| {
            [
                centroid[0] + t * (simplex[2][0] - centroid[0]),
                centroid[1] + t * (simplex[2][1] - centroid[1]),
            ]
        };

        let reflected = along(-REFLECTION);
        let fr = objective(reflected);
        if fr < values[0] {
            let expanded = along(-REFLECTION * EXPANSION);
            let fe = objective(expanded);
            (simplex[2], values[2]) = if fe < fr { (expanded, fe) } else { (reflected, fr) };
            continue;
        }
        if fr < values[1] {
            (simplex[2], values[2]) = (reflected, fr);
            continue;
        }
        let (contracted, fc) = if fr < values[2] {
            let p = along(-REFLECTION * CONTRACTION);
            (p, objective(p))
        } else {
            let p = along(CONTRACTION);
            (p, objective(p))
        };
        if fc < values[2].min(fr) {
            (simplex[2], values[2]) = (contracted, fc);
            continue;
        }
        for i in 1..3 {
            for axis in 0..2 {
                simplex[i][axis] = simplex[0][axis] + SHRINK * (simplex[i][axis] - simplex[0][axis]);
            }
            values[i] = objective(simplex[i]);
        }
    }
    order(&mut simplex, &mut values);
    Outcome {
        point: simplex[0],
        value: values[0],
        iterations,
        converged,
    }
}

fn order(simplex: &mut [[f64; 2]; 3], values: &mut [f64; 3]) {
    let mut idx = [0, 1, 2];
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *simplex = idx.map(|i| simplex[i]);
    *values = idx.map(|i| values[i]);
}

/// True once the simplex has collapsed or its residuals agree to
/// `tolerance`.
fn settled(simplex: &[[f64; 2]; 3], values: &[f64; 3], tolerance: f64) -> bool {
    let diameter = simplex[1..]
        .iter()
        .map(|p| (p[0] - simplex[0][0]).abs().max((p[1] - simplex[0][1]).abs()))
        .fold(0.0, f64::max);
    let range = values[2] - values[0];
    diameter <= tolerance || (range.is_finite() && range <= tolerance * values[0].abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::transform;

    fn synthetic(lambda: f64, cutoff_scale: f64) -> WilkensModel {
        let variable: Vec<f64> = (1..=50).map(|i| f64::from(i) * 2e-9).collect();
        let reference = WilkensModel::new(&transform(variable.clone(), vec![]), 1, None).unwrap();
        let rho = reference.reference_density();
        let amplitudes = reference.evaluate(lambda * rho, cutoff_scale / rho.sqrt());
        WilkensModel::new(&transform(variable, vec![amplitudes]), 1, None).unwrap()
    }

    #[test]
    fn recovers_synthetic_parameters() {
        let model = synthetic(1.5, 3.0);
        let result = fit(&model, FitSettings::default()).unwrap();
        assert!((result.lambda - 1.5).abs() < 1e-3, "{result:?}");
        assert!((result.cutoff - 3.0e-7).abs() / 3.0e-7 < 1e-2, "{result:?}");
        assert!(result.residual < 1e-10);
    }

    #[test]
    fn objective_never_leaves_the_box() {
        let model = synthetic(0.5, 50.0);
        let result = fit(&model, FitSettings { tolerance: 1e-6, max_iterations: 400 }).unwrap();
        assert!(result.lambda >= 0.01 && result.lambda <= 100.0);
        assert!(result.iterations <= 400);
    }

    #[test]
    fn refuses_models_without_observations() {
        let model = WilkensModel::new(&transform(vec![1e-9], vec![]), 1, None).unwrap();
        assert!(matches!(
            fit(&model, FitSettings::default()),
            Err(ModelError::MalformedTransform(_))
        ));
    }

    #[test]
    fn lambda_file_round_trips_with_hyphenated_key() {
        let file: LambdaFile =
            serde_json::from_str(r#"{"lambdas": [1.0, 1.2], "p-values": [0.1, 0.2]}"#).unwrap();
        assert_eq!(file.p_values, Some([0.1, 0.2]));
        let text = serde_json::to_string(&LambdaFile::from_fits(vec![])).unwrap();
        assert_eq!(text, r#"{"lambdas":[]}"#);
    }
}
