//! `numlpa diffract`: Monte Carlo Fourier transforms of samples.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use numlpa_analysis::diffraction::{diffract, DiffractionSettings};
use tracing::info;

use crate::commands::for_each_sample;
use crate::config::Settings;

/// Compute the Fourier transform of the diffraction profile of samples.
#[derive(Debug, Args)]
pub struct DiffractArgs {
    /// Sample files, or sample containers.
    #[arg(required = true)]
    pub samples: Vec<PathBuf>,

    /// Directory receiving one `<stem>.json` transform per sample.
    #[arg(long)]
    pub output: PathBuf,

    /// Random points averaged over per sample.
    #[arg(long)]
    pub points: Option<usize>,

    /// Rings of periodic images around the region.
    #[arg(long)]
    pub replicate: Option<u32>,

    /// Fourier variable step (m).
    #[arg(long, allow_negative_numbers = true)]
    pub step: Option<f64>,

    /// Fourier variable range, in mean dislocation spacings.
    #[arg(long, allow_negative_numbers = true)]
    pub range: Option<f64>,

    /// Harmonics of the diffraction vector, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub harmonics: Option<Vec<u32>>,
}

impl DiffractArgs {
    /// Configured settings with the flags given on the command line.
    pub fn settings(&self, settings: &Settings) -> DiffractionSettings {
        let mut resolved = settings.diffract.clone();
        if let Some(points) = self.points {
            resolved.points = points;
        }
        if let Some(replicate) = self.replicate {
            resolved.replicate = replicate;
        }
        if let Some(step) = self.step {
            resolved.step = step;
        }
        if let Some(range) = self.range {
            resolved.range = range;
        }
        if let Some(harmonics) = &self.harmonics {
            resolved.harmonics.clone_from(harmonics);
        }
        resolved
    }
}

/// Writes the transform of every sample.
///
/// # Errors
///
/// Returns an error if a sample cannot be read or transformed, or a
/// transform written.
pub fn run(args: &DiffractArgs, settings: &Settings) -> Result<bool> {
    let resolved = args.settings(settings);
    info!(points = resolved.points, replicate = resolved.replicate, "diffracting samples");
    let count = for_each_sample(&args.samples, &args.output, |sample| {
        Ok(diffract(sample, &resolved)?)
    })?;
    println!("{count} transforms in {}", args.output.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_configured_settings() {
        let args = DiffractArgs {
            samples: vec![PathBuf::from("in")],
            output: PathBuf::from("out"),
            points: Some(10),
            replicate: None,
            step: None,
            range: Some(3.0),
            harmonics: Some(vec![1, 3]),
        };
        let settings = Settings::default();
        let resolved = args.settings(&settings);
        assert_eq!(resolved.points, 10);
        assert_eq!(resolved.replicate, settings.diffract.replicate);
        assert_eq!(resolved.harmonics, vec![1, 3]);
        assert!((resolved.range - 3.0).abs() < f64::EPSILON);
    }
}
