//! `numlpa model`: evaluate the Wilkens model over a transform's grid.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use numlpa_analysis::evaluator::{ParameterGuide, WilkensModel};
use numlpa_analysis::transform::Transform;
use serde::Serialize;

use crate::commands::emit;

/// Evaluate the Wilkens model for given parameters.
#[derive(Debug, Args)]
pub struct ModelArgs {
    /// Transform file.
    pub transform: PathBuf,

    /// Harmonic of the diffraction vector.
    pub harmonic: u32,

    /// Dislocation density in m⁻² (negative values give +∞ amplitudes).
    #[arg(long, allow_negative_numbers = true)]
    pub density: f64,

    /// Outer cut-off radius in m (negative values give +∞ amplitudes).
    #[arg(long, allow_negative_numbers = true)]
    pub cutoff: f64,

    /// Number of leading Fourier variables to keep.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Write the amplitudes to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Amplitudes<'a> {
    harmonic: u32,
    density: f64,
    cutoff: f64,
    variable: &'a [f64],
    amplitude: Vec<f64>,
    observed: &'a [f64],
    guide: ParameterGuide,
}

/// Prints the model amplitudes next to the observed ones.
///
/// # Errors
///
/// Returns an error if the transform cannot be read or lacks the harmonic.
pub fn run(args: &ModelArgs) -> Result<bool> {
    let transform = Transform::load(&args.transform)?;
    let model = WilkensModel::new(&transform, args.harmonic, args.limit)?;
    let amplitude = model.closure()(args.density, args.cutoff);
    emit(
        &Amplitudes {
            harmonic: args.harmonic,
            density: args.density,
            cutoff: args.cutoff,
            variable: model.variables(),
            amplitude,
            observed: model.observed(),
            guide: model.guide(),
        },
        args.output.as_deref(),
    )?;
    Ok(true)
}
