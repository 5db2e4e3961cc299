//! Monte Carlo strain-energy evaluator.
//!
//! Averages the elastic energy density of a sample over random points,
//! discarding points that fall inside a dislocation core, and converts the
//! mean into the outer cut-off radius `Rₑ = r₀·exp(4π(1−ν)⟨w⟩/(μb²ρ))`
//! (without the `1−ν` factor for screw dislocations).

use std::f64::consts::{PI, TAU};

use numlpa_sample::{DistributionRecord, Region, Sample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diffraction::{check_poisson, moments};
use crate::error::FieldError;
use crate::lattice::{Character, Directions, Geometry};
use crate::scene::{random_points, Scene};

/// Name recorded in the `evaluation.module` field.
pub const MODULE: &str = "numlpa_analysis::energy";

/// Evaluator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySettings {
    /// Line direction (uvw).
    pub z_uvw: [f64; 3],
    /// Burgers vector direction (uvw).
    pub b_uvw: [f64; 3],
    /// Diffraction vector (hkl), the direction of the projected strain.
    pub g_hkl: [f64; 3],
    /// Lattice parameter (m).
    pub cell: f64,
    /// Poisson number.
    pub poisson: f64,
    /// Shear modulus (Pa).
    pub shear: f64,
    /// Core radius, in Burgers vector lengths unless `absolute`.
    pub core: f64,
    /// Read `core` in metres.
    pub absolute: bool,
    /// Rings of periodic images around the region.
    pub replicate: u32,
    /// Number of random points.
    pub points: usize,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            z_uvw: [1.0, -1.0, 2.0],
            b_uvw: [1.0, 1.0, 0.0],
            g_hkl: [2.0, 0.0, 0.0],
            cell: 3.6e-10,
            poisson: 0.34,
            shear: 4.8e10,
            core: 1.0,
            absolute: false,
            replicate: 1,
            points: 1000,
        }
    }
}

/// Result of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Producer of the evaluation.
    pub module: String,
    /// Line direction (uvw).
    pub z_uvw: [f64; 3],
    /// Burgers vector direction (uvw).
    pub b_uvw: [f64; 3],
    /// Diffraction vector (hkl).
    pub g_hkl: [f64; 3],
    /// Dislocation character.
    #[serde(rename = "type")]
    pub character: Character,
    /// Lattice parameter (m).
    pub cell: f64,
    /// Burgers vector length (m).
    pub b_len: f64,
    /// Poisson number.
    pub poisson: f64,
    /// Shear modulus (Pa).
    pub shear: f64,
    /// Core radius (m).
    pub core: f64,
    /// Mean energy density (J·m⁻³).
    pub energy_mean: f64,
    /// Standard deviation of the energy density (J·m⁻³).
    pub energy_deviation: f64,
    /// Mean square strain along the diffraction vector.
    pub square_strain: f64,
    /// `4π(1−ν)/(μb²ρ)` for edge dislocations, `4π/(μb²ρ)` for screw ones.
    pub factor: f64,
    /// Outer cut-off radius implied by the mean energy (m).
    pub cutoff: f64,
    /// Number of samples averaged.
    pub samples: u32,
    /// Rings of periodic images.
    pub replicate: u32,
    /// Random points drawn.
    pub points: usize,
    /// Random points discarded for lying inside a core.
    pub hidden: usize,
}

/// Evaluation file: provenance of the sample and the evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    /// Provenance of the sample.
    pub distribution: DistributionRecord,
    /// Region the sample was drawn on.
    pub region: Region,
    /// Evaluation outcome.
    pub evaluation: Evaluation,
}

/// Symmetric tensor components `[xx, yy, zz, xy, yz, zx]`.
type Tensor = [f64; 6];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fields {
    stress: Tensor,
    strain: Tensor,
}

impl Fields {
    fn energy(&self) -> f64 {
        let (s, e) = (self.stress, self.strain);
        (s[0] * e[0] + s[1] * e[1] + s[2] * e[2] + 2.0 * (s[3] * e[3] + s[4] * e[4] + s[5] * e[5]))
            / 2.0
    }

    /// Strain projected on the unit vector `g`.
    fn projected_strain(&self, g: [f64; 3]) -> f64 {
        let e = self.strain;
        g[0] * g[0] * e[0]
            + g[1] * g[1] * e[1]
            + g[2] * g[2] * e[2]
            + 2.0 * (g[0] * g[1] * e[3] + g[1] * g[2] * e[4] + g[2] * g[0] * e[5])
    }
}

/// Field kernel of one character.
struct Kernel<'a> {
    scene: &'a Scene,
    character: Character,
    poisson: f64,
    core_squared: f64,
    stress_scale: f64,
    strain_scale: f64,
}

impl Kernel<'_> {
    /// Stress and strain at `(mx, my)`, or `None` inside a core.
    fn fields(&self, mx: f64, my: f64) -> Option<Fields> {
        match self.character {
            Character::Edge => self.edge(mx, my),
            _ => self.screw(mx, my),
        }
    }

    fn edge(&self, mx: f64, my: f64) -> Option<Fields> {
        let c1 = 2.0 * (1.0 - self.poisson);
        let (mut exx, mut eyy, mut sxx, mut syy, mut xy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (s, dx, dy) in self.scene.iter() {
            let (rx, ry) = (dx - mx, dy - my);
            let (x2, y2) = (rx * rx, ry * ry);
            let r2 = x2 + y2;
            if r2 < self.core_squared {
                return None;
            }
            let r4 = r2 * r2;
            let c2 = x2 - y2;
            let c3 = 3.0 * x2 + y2;
            let c4 = ry / r2;
            exx -= s * c4 * (c2 / r2 + c1);
            eyy += s * c4 * (c3 / r2 - c1);
            sxx -= s * ry * c3 / r4;
            syy += s * ry * c2 / r4;
            xy += s * rx * c2 / r4;
        }
        let (sxx, syy) = (self.stress_scale * sxx, self.stress_scale * syy);
        Some(Fields {
            stress: [sxx, syy, self.poisson * (sxx + syy), self.stress_scale * xy, 0.0, 0.0],
            strain: [
                self.strain_scale * exx,
                self.strain_scale * eyy,
                0.0,
                self.strain_scale * xy,
                0.0,
                0.0,
            ],
        })
    }

    fn screw(&self, mx: f64, my: f64) -> Option<Fields> {
        let (mut yz, mut zx) = (0.0, 0.0);
        for (s, dx, dy) in self.scene.iter() {
            let (rx, ry) = (dx - mx, dy - my);
            let r2 = rx * rx + ry * ry;
            if r2 < self.core_squared {
                return None;
            }
            yz += s * rx / r2;
            zx -= s * ry / r2;
        }
        Some(Fields {
            stress: [0.0, 0.0, 0.0, 0.0, self.stress_scale * yz, self.stress_scale * zx],
            strain: [0.0, 0.0, 0.0, 0.0, self.strain_scale * yz, self.strain_scale * zx],
        })
    }
}

impl EnergySettings {
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
        check_poisson(self.poisson)?;
        if !(self.shear.is_finite() && self.shear > 0.0) {
            return Err(FieldError::invalid("shear", format!("must be > 0, got {}", self.shear)));
        }
        if !(self.core.is_finite() && self.core > 0.0) {
            return Err(FieldError::invalid("core", format!("must be > 0, got {}", self.core)));
        }
        if self.points == 0 {
            return Err(FieldError::invalid("points", "must be >= 1"));
        }
        Ok(())
    }
}

/// Evaluates the strain energy of `sample`.
///
/// # Errors
///
/// [`FieldError::InvalidSetting`] for out of domain settings,
/// [`FieldError::UnsupportedCharacter`] for mixed dislocations,
/// [`FieldError::MalformedSample`] for inconsistent arrays or a non-positive
/// density, and [`FieldError::AllPointsHidden`] when no point is usable.
pub fn evaluate(sample: &Sample, settings: &EnergySettings) -> Result<EnergyReport, FieldError> {
    settings.validate()?;
    let geometry = Geometry::new(&settings.directions())?;
    let character = geometry.character();
    if character == Character::Mixed {
        return Err(FieldError::UnsupportedCharacter(character));
    }
    let density = sample.distribution.density;
    if !(density.is_finite() && density > 0.0) {
        return Err(FieldError::MalformedSample(format!(
            "density must be positive, got {density}"
        )));
    }

    let b = geometry.burgers_length();
    let core = if settings.absolute { settings.core } else { settings.core * b };
    let edge_scale = if character == Character::Edge { 1.0 - settings.poisson } else { 1.0 };
    let factor = 2.0 * TAU / settings.shear / (b * b) / density * edge_scale;
    let scene = Scene::new(sample, settings.replicate)?;
    let kernel = Kernel {
        scene: &scene,
        character,
        poisson: settings.poisson,
        core_squared: core * core,
        stress_scale: settings.shear * b / TAU / edge_scale,
        strain_scale: b / (4.0 * PI) / edge_scale,
    };
    let points = random_points(sample, settings.points);
    info!(
        dislocations = scene.len(),
        points = points.len(),
        %character,
        "evaluating strain energy"
    );

    let kept: Vec<Fields> = points
        .par_iter()
        .filter_map(|&(x, y)| kernel.fields(x, y))
        .collect();
    if kept.is_empty() {
        return Err(FieldError::AllPointsHidden {
            points: points.len(),
        });
    }
    let hidden = points.len() - kept.len();
    if hidden > 0 {
        warn!(hidden, "random points inside a dislocation core were discarded");
    }

    let (energy_mean, energy_deviation) = moments(kept.iter().map(Fields::energy));
    let g = geometry.diffraction_direction();
    let square_strain = kept
        .iter()
        .map(|f| f.projected_strain(g).powi(2))
        .sum::<f64>()
        / kept.len() as f64;

    Ok(EnergyReport {
        distribution: sample.distribution.clone(),
        region: sample.region,
        evaluation: Evaluation {
            module: MODULE.to_owned(),
            z_uvw: settings.z_uvw,
            b_uvw: settings.b_uvw,
            g_hkl: settings.g_hkl,
            character,
            cell: settings.cell,
            b_len: b,
            poisson: settings.poisson,
            shear: settings.shear,
            core,
            energy_mean,
            energy_deviation,
            square_strain,
            factor,
            cutoff: core * (factor * energy_mean).exp(),
            samples: 1,
            replicate: settings.replicate,
            points: settings.points,
            hidden,
        },
    })
}
