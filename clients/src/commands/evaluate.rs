//! `numlpa evaluate`: strain energy and outer cut-off radius of samples.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use numlpa_analysis::energy::{evaluate, EnergySettings};
use tracing::info;

use crate::commands::for_each_sample;
use crate::config::Settings;

/// Evaluate the strain energy of samples.
#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Sample files, or sample containers.
    #[arg(required = true)]
    pub samples: Vec<PathBuf>,

    /// Directory receiving one `<stem>.json` evaluation per sample.
    #[arg(long)]
    pub output: PathBuf,

    /// Random points averaged over per sample.
    #[arg(long)]
    pub points: Option<usize>,

    /// Rings of periodic images around the region.
    #[arg(long)]
    pub replicate: Option<u32>,

    /// Core radius, in Burgers vector lengths.
    #[arg(long, allow_negative_numbers = true)]
    pub core: Option<f64>,
}

impl EvaluateArgs {
    /// Configured settings with the flags given on the command line.
    pub fn settings(&self, settings: &Settings) -> EnergySettings {
        EnergySettings {
            points: self.points.unwrap_or(settings.evaluate.points),
            replicate: self.replicate.unwrap_or(settings.evaluate.replicate),
            core: self.core.unwrap_or(settings.evaluate.core),
            ..settings.evaluate.clone()
        }
    }
}

/// Writes the evaluation of every sample.
///
/// # Errors
///
/// Returns an error if a sample cannot be read or evaluated, or an
/// evaluation written.
pub fn run(args: &EvaluateArgs, settings: &Settings) -> Result<bool> {
    let resolved = args.settings(settings);
    info!(points = resolved.points, core = resolved.core, "evaluating samples");
    let count = for_each_sample(&args.samples, &args.output, |sample| {
        Ok(evaluate(sample, &resolved)?)
    })?;
    println!("{count} evaluations in {}", args.output.display());
    Ok(true)
}
