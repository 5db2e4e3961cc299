//! NumLPA analysis.
//!
//! Computes the Fourier transform of the diffraction profile of a sample
//! and its strain energy by Monte Carlo averaging, evaluates the Wilkens
//! model of the Fourier amplitudes, fits it, and aggregates the resulting
//! growth factors λ = ρ/ρ₀ with a bootstrap interval.
//!
//! # Entry Point
//!
//! ```no_run
//! use numlpa_analysis::evaluator::WilkensModel;
//! use numlpa_analysis::fit::{fit, FitSettings};
//! use numlpa_analysis::transform::Transform;
//!
//! # fn main() -> Result<(), numlpa_analysis::ModelError> {
//! let transform = Transform::load("transform.json".as_ref())?;
//! let model = WilkensModel::new(&transform, 1, None)?;
//! let amplitudes = model.closure()(transform.reference_density(), 1e-7);
//! let result = fit(&model, FitSettings::default())?;
//! println!("{} points, λ = {}", amplitudes.len(), result.lambda);
//! # Ok(())
//! # }
//! ```
//!
//! # Layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`lattice`] | Dislocation frame, character and contrast factor |
//! | [`scene`] | Periodic images and random points |
//! | [`diffraction`] | Monte Carlo diffractometer producing transforms |
//! | [`energy`] | Monte Carlo strain-energy evaluator |
//! | [`transform`] | Transform file reader |
//! | [`wilkens`] | Wilkens intermediate function f(η) |
//! | [`evaluator`] | Model closure and parameter guide |
//! | [`fit`] | Bounded Nelder–Mead fit and λ files |
//! | [`bootstrap`] | Interval, LaTeX rendering and verdicts |

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod bootstrap;
pub mod diffraction;
pub mod energy;
pub mod error;
pub mod evaluator;
pub mod fit;
pub mod lattice;
pub mod scene;
pub mod transform;
pub mod wilkens;

pub use error::{BootstrapError, FieldError, ModelError};
