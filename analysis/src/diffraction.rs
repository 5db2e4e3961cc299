//! Monte Carlo diffractometer.
//!
//! Computes the Fourier coefficients of the line profile diffracted by a
//! sample of straight parallel dislocations. For a random point `p` and a
//! Fourier variable `L`, the phase is `2π g·[u(p + L·ĝ) − u(p)]`, where `u`
//! is the isotropic displacement field summed over the dislocations and
//! their periodic images. The coefficients of harmonic `h` are the averages
//! of `cos(h·phase)` and `sin(h·phase)` over the points.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use numlpa_sample::Sample;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::FieldError;
use crate::lattice::{Directions, Geometry};
use crate::scene::{random_points, Scene};
use crate::transform::{Coefficients, Diffraction, Transform};

/// Name recorded in the `diffraction.module` field of the transforms.
pub const MODULE: &str = "numlpa_analysis::diffraction";

/// Diffractometer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffractionSettings {
    /// Line direction (uvw).
    pub z_uvw: [f64; 3],
    /// Burgers vector direction (uvw).
    pub b_uvw: [f64; 3],
    /// Diffraction vector (hkl).
    pub g_hkl: [f64; 3],
    /// Lattice parameter (m).
    pub cell: f64,
    /// Step of the Fourier variable (m).
    pub step: f64,
    /// Largest Fourier variable, in units of `1/√ρ` unless `absolute`.
    pub range: f64,
    /// Read `range` in metres.
    pub absolute: bool,
    /// Poisson number.
    pub poisson: f64,
    /// Harmonics to compute.
    pub harmonics: Vec<u32>,
    /// Rings of periodic images around the region.
    pub replicate: u32,
    /// Number of random points.
    pub points: usize,
}

impl Default for DiffractionSettings {
    fn default() -> Self {
        Self {
            z_uvw: [1.0, -1.0, 2.0],
            b_uvw: [1.0, 1.0, 0.0],
            g_hkl: [2.0, 0.0, 0.0],
            cell: 3.6e-10,
            step: 5e-9,
            range: 2.0,
            absolute: false,
            poisson: 0.34,
            harmonics: vec![1, 2],
            replicate: 1,
            points: 1000,
        }
    }
}

impl DiffractionSettings {
    /// Lattice directions of the settings.
    #[must_use]
    pub fn directions(&self) -> Directions {
        Directions {
            z_uvw: self.z_uvw,
            b_uvw: self.b_uvw,
            g_hkl: self.g_hkl,
            cell: self.cell,
        }
    }

    fn validate(&self) -> Result<(), FieldError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(FieldError::invalid("step", format!("must be > 0, got {}", self.step)));
        }
        if !(self.range.is_finite() && self.range > 0.0) {
            return Err(FieldError::invalid("range", format!("must be > 0, got {}", self.range)));
        }
        check_poisson(self.poisson)?;
        if self.harmonics.is_empty() || self.harmonics.contains(&0) {
            return Err(FieldError::invalid(
                "harmonics",
                format!("must be a non-empty list of positive integers, got {:?}", self.harmonics),
            ));
        }
        if self.points == 0 {
            return Err(FieldError::invalid("points", "must be >= 1"));
        }
        Ok(())
    }
}

pub(crate) fn check_poisson(poisson: f64) -> Result<(), FieldError> {
    if poisson > -1.0 && poisson < 0.5 {
        Ok(())
    } else {
        Err(FieldError::invalid(
            "poisson",
            format!("must lie in (-1, 0.5), got {poisson}"),
        ))
    }
}

/// Computes the Fourier transform of `sample`.
///
/// # Errors
///
/// [`FieldError::InvalidSetting`] for out of domain settings, degenerate
/// lattice directions, or a range shorter than one step, and
/// [`FieldError::MalformedSample`] for inconsistent sample arrays.
pub fn diffract(sample: &Sample, settings: &DiffractionSettings) -> Result<Transform, FieldError> {
    settings.validate()?;
    let geometry = Geometry::new(&settings.directions())?;
    let density = sample.distribution.density;
    let maximum = if settings.absolute {
        settings.range
    } else {
        if !(density.is_finite() && density > 0.0) {
            return Err(FieldError::MalformedSample(format!(
                "a relative range needs a positive density, got {density}"
            )));
        }
        settings.range / density.sqrt()
    };
    let steps = (maximum / settings.step).floor() as usize;
    if steps == 0 {
        return Err(FieldError::invalid(
            "range",
            format!("reaches {maximum} m, shorter than one step of {} m", settings.step),
        ));
    }

    let scene = Scene::new(sample, settings.replicate)?;
    let points = random_points(sample, settings.points);
    let g = geometry.diffraction_vector();
    let (edge, screw) = geometry.burgers_components();
    let field = Field {
        scene: &scene,
        poisson: settings.poisson,
        weights: [
            g[0] * edge,
            -g[1] * edge / (4.0 * (1.0 - settings.poisson)),
            g[2] * screw,
        ],
    };
    let direction = geometry.diffraction_direction();
    let stride = (settings.step * direction[0], settings.step * direction[1]);
    info!(
        dislocations = scene.len(),
        points = points.len(),
        steps,
        character = %geometry.character(),
        "diffracting sample"
    );

    let raw: Vec<Vec<f64>> = points
        .par_iter()
        .map(|&point| field.phases(point, stride, steps))
        .collect();

    let variable: Vec<f64> = (1..=steps).map(|i| i as f64 * settings.step).collect();
    let statistics = Statistics::collect(&raw, &settings.harmonics, steps);
    let strain_scale = TAU * geometry.diffraction_length();
    let square_strain = (0..steps)
        .map(|l| {
            mean(raw.iter().map(|row| {
                let strain = row[l] / variable[l] / strain_scale;
                strain * strain
            }))
        })
        .collect();
    debug!(steps, "averaged phases");

    let contrast = geometry.contrast(settings.poisson);
    let mut extra = BTreeMap::new();
    extra.insert("module".to_owned(), json!(MODULE));
    extra.insert("z_uvw".to_owned(), json!(settings.z_uvw));
    extra.insert("type".to_owned(), json!(geometry.character()));
    extra.insert("step".to_owned(), json!(settings.step));
    extra.insert("poisson".to_owned(), json!(settings.poisson));
    extra.insert("samples".to_owned(), json!(1));
    extra.insert("replicate".to_owned(), json!(settings.replicate));
    extra.insert("points".to_owned(), json!(settings.points));

    Ok(Transform {
        distribution: sample.distribution.clone(),
        region: sample.region,
        diffraction: Diffraction {
            g_hkl: settings.g_hkl,
            b_uvw: settings.b_uvw,
            cell: settings.cell,
            contrast,
            extra,
        },
        coefficients: Coefficients {
            harmonic: settings.harmonics.clone(),
            variable,
            cos_mean: statistics.cos_mean,
            sin_mean: statistics.sin_mean,
            cos_deviation: statistics.cos_deviation,
            sin_deviation: statistics.sin_deviation,
            square_strain,
            extra: BTreeMap::new(),
        },
    })
}

/// Displacement field of a scene, reduced to the phase it induces.
struct Field<'a> {
    scene: &'a Scene,
    poisson: f64,
    /// Couplings of the three field components to the phase.
    weights: [f64; 3],
}

impl Field<'_> {
    /// The three displacement components at `(x, y)`, up to the factors in
    /// `weights`: the angular and shear parts along `x`, the dilatation
    /// part along `y`, and the angle for the screw part along `z`.
    fn components(&self, x: f64, y: f64) -> [f64; 3] {
        let shear = 1.0 / (2.0 * (1.0 - self.poisson));
        let dilatation = 1.0 - 2.0 * self.poisson;
        let mut sum = [0.0; 3];
        for (sense, dx, dy) in self.scene.iter() {
            let (rx, ry) = (x - dx, y - dy);
            let r2 = rx * rx + ry * ry;
            let theta = ry.atan2(rx);
            sum[0] += sense * (theta + shear * rx * ry / r2);
            sum[1] += sense * (dilatation * r2.ln() + (rx * rx - ry * ry) / r2);
            sum[2] += sense * theta;
        }
        sum
    }

    /// First-harmonic phase at every step from `point` along `stride`.
    fn phases(&self, point: (f64, f64), stride: (f64, f64), steps: usize) -> Vec<f64> {
        let origin = self.components(point.0, point.1);
        (1..=steps)
            .map(|i| {
                let t = i as f64;
                let here = self.components(point.0 + t * stride.0, point.1 + t * stride.1);
                (0..3).map(|k| (here[k] - origin[k]) * self.weights[k]).sum()
            })
            .collect()
    }
}

struct Statistics {
    cos_mean: Vec<Vec<f64>>,
    sin_mean: Vec<Vec<f64>>,
    cos_deviation: Vec<Vec<f64>>,
    sin_deviation: Vec<Vec<f64>>,
}

impl Statistics {
    /// Means and standard errors of `cos(h·phase)` and `sin(h·phase)` over
    /// the rows of `raw`, per harmonic and step.
    fn collect(raw: &[Vec<f64>], harmonics: &[u32], steps: usize) -> Self {
        let error_scale = 1.0 / (raw.len() as f64).sqrt();
        let mut statistics = Self {
            cos_mean: Vec::with_capacity(harmonics.len()),
            sin_mean: Vec::with_capacity(harmonics.len()),
            cos_deviation: Vec::with_capacity(harmonics.len()),
            sin_deviation: Vec::with_capacity(harmonics.len()),
        };
        for &h in harmonics {
            let h = f64::from(h);
            let (mut cm, mut sm, mut cd, mut sd) = (
                Vec::with_capacity(steps),
                Vec::with_capacity(steps),
                Vec::with_capacity(steps),
                Vec::with_capacity(steps),
            );
            for l in 0..steps {
                let (c_mean, c_dev) = moments(raw.iter().map(|row| (h * row[l]).cos()));
                let (s_mean, s_dev) = moments(raw.iter().map(|row| (h * row[l]).sin()));
                cm.push(c_mean);
                sm.push(s_mean);
                cd.push(c_dev * error_scale);
                sd.push(s_dev * error_scale);
            }
            statistics.cos_mean.push(cm);
            statistics.sin_mean.push(sm);
            statistics.cos_deviation.push(cd);
            statistics.sin_deviation.push(sd);
        }
        statistics
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    sum / count as f64
}

/// Mean and population standard deviation.
pub(crate) fn moments(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let m = mean(values.clone());
    let variance = mean(values.map(|v| (v - m) * (v - m)));
    (m, variance.sqrt())
}
