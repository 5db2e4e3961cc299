//! Dislocation geometry in a cubic lattice.
//!
//! Both the diffractometer and the strain-energy evaluator work in the
//! dislocation frame: `x` along the edge component of the Burgers vector,
//! `z` along the line, `y = z × x`. [`Geometry`] holds the change of frame
//! and the quantities derived from it, including the contrast factor.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Angular tolerance (rad) of the edge and screw classification.
const CHARACTER_TOLERANCE: f64 = 1e-4;

/// Character of a straight dislocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Character {
    /// Burgers vector perpendicular to the line.
    Edge,
    /// Burgers vector along the line.
    Screw,
    /// Anything in between.
    Mixed,
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Edge => "edge",
            Self::Screw => "screw",
            Self::Mixed => "mixed",
        })
    }
}

/// Lattice directions of the dislocations and of the diffraction vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Directions {
    /// Line direction (uvw).
    pub z_uvw: [f64; 3],
    /// Burgers vector direction (uvw).
    pub b_uvw: [f64; 3],
    /// Diffraction vector (hkl).
    pub g_hkl: [f64; 3],
    /// Lattice parameter (m).
    pub cell: f64,
}

/// Dislocation frame and derived constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    character: Character,
    line: [f64; 3],
    burgers: [f64; 3],
    diffraction: [f64; 3],
    transition: [[f64; 3]; 3],
    burgers_length: f64,
    angle_line_burgers: f64,
    angle_line_diffraction: f64,
    diffraction_length: f64,
}

impl Geometry {
    /// Classifies the dislocation and builds its frame.
    ///
    /// # Errors
    ///
    /// [`FieldError::InvalidSetting`] when a direction is the null vector,
    /// the lattice parameter is not positive, or the diffraction vector is
    /// parallel to the line (the frame and the contrast are then undefined).
    pub fn new(directions: &Directions) -> Result<Self, FieldError> {
        let cell = directions.cell;
        if !(cell.is_finite() && cell > 0.0) {
            return Err(FieldError::invalid("cell", format!("must be > 0, got {cell}")));
        }
        let line = unit("z_uvw", directions.z_uvw)?;
        let burgers = unit("b_uvw", directions.b_uvw)?;
        let diffraction = unit("g_hkl", directions.g_hkl)?;
        if norm(cross(line, diffraction)) < 1e-12 {
            return Err(FieldError::invalid(
                "g_hkl",
                "must not be parallel to the line direction",
            ));
        }

        let angle_line_burgers = dot(line, burgers).clamp(-1.0, 1.0).acos();
        let angle_line_diffraction = dot(line, diffraction).clamp(-1.0, 1.0).acos();
        let (character, x) = if (angle_line_burgers.abs() - FRAC_PI_2).abs() < CHARACTER_TOLERANCE {
            (Character::Edge, burgers)
        } else if angle_line_burgers.abs() < CHARACTER_TOLERANCE {
            (Character::Screw, normalize(cross(line, diffraction)))
        } else {
            let edge_part = sub(burgers, scale(line, dot(burgers, line)));
            (Character::Mixed, normalize(edge_part))
        };
        let y = cross(line, x);

        Ok(Self {
            character,
            line,
            burgers,
            diffraction,
            transition: [x, y, line],
            burgers_length: norm(directions.b_uvw) * cell / 2.0,
            angle_line_burgers,
            angle_line_diffraction,
            diffraction_length: norm(directions.g_hkl) / cell,
        })
    }

    /// Edge, screw or mixed.
    #[must_use]
    pub fn character(&self) -> Character {
        self.character
    }

    /// |b| = |b_uvw|·a/2 (m).
    #[must_use]
    pub fn burgers_length(&self) -> f64 {
        self.burgers_length
    }

    /// |g| = |g_hkl|/a (m⁻¹).
    #[must_use]
    pub fn diffraction_length(&self) -> f64 {
        self.diffraction_length
    }

    /// Edge and screw components of the Burgers vector (m).
    #[must_use]
    pub fn burgers_components(&self) -> (f64, f64) {
        let b = self.burgers_length;
        match self.character {
            Character::Edge => (b, 0.0),
            Character::Screw => (0.0, b),
            Character::Mixed => (
                b * self.angle_line_burgers.sin(),
                b * self.angle_line_burgers.cos(),
            ),
        }
    }

    /// Expresses a crystal-frame vector in the dislocation frame.
    #[must_use]
    pub fn to_dislocation_frame(&self, v: [f64; 3]) -> [f64; 3] {
        self.transition.map(|row| dot(row, v))
    }

    /// Unit diffraction vector in the dislocation frame.
    #[must_use]
    pub fn diffraction_direction(&self) -> [f64; 3] {
        self.to_dislocation_frame(self.diffraction)
    }

    /// Diffraction vector g (m⁻¹) in the dislocation frame.
    #[must_use]
    pub fn diffraction_vector(&self) -> [f64; 3] {
        scale(self.diffraction_direction(), self.diffraction_length)
    }

    /// Contrast factor of a pure edge dislocation.
    #[must_use]
    pub fn edge_contrast(&self, poisson: f64) -> f64 {
        let project = |v: [f64; 3]| normalize(sub(v, scale(self.line, dot(v, self.line))));
        let cos_projections = dot(project(self.diffraction), project(self.burgers));
        let sin_zg = self.angle_line_diffraction.sin();
        sin_zg.powi(4) / (8.0 * (1.0 - poisson).powi(2))
            * (1.0 - 4.0 * poisson
                + 8.0 * poisson * poisson
                + 4.0 * (1.0 - 2.0 * poisson) * cos_projections * cos_projections)
    }

    /// Contrast factor of a pure screw dislocation.
    #[must_use]
    pub fn screw_contrast(&self) -> f64 {
        let (sin, cos) = self.angle_line_diffraction.sin_cos();
        sin * sin * cos * cos
    }

    /// Contrast factor of the dislocation, mixing the edge and screw parts
    /// by the angle between line and Burgers vector.
    #[must_use]
    pub fn contrast(&self, poisson: f64) -> f64 {
        let [c1, _, c3] = self.diffraction_direction();
        let (sin, cos) = self.angle_line_burgers.sin_cos();
        let cross_term =
            c1 * c3 / 4.0 / (1.0 - poisson) * (3.0 - 4.0 * poisson) * (1.0 - c3 * c3);
        cross_term * 2.0 * sin * cos
            + self.edge_contrast(poisson) * sin * sin
            + self.screw_contrast() * cos * cos
    }
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

fn scale(v: [f64; 3], k: f64) -> [f64; 3] {
    v.map(|c| c * k)
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    scale(v, 1.0 / norm(v))
}

fn unit(name: &'static str, v: [f64; 3]) -> Result<[f64; 3], FieldError> {
    let length = norm(v);
    if length.is_finite() && length > 0.0 {
        Ok(scale(v, 1.0 / length))
    } else {
        Err(FieldError::invalid(name, format!("must be a non-null vector, got {v:?}")))
    }
}
