//! `numlpa draw`: fill a sample container.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use numlpa_sample::batch::draw_batch;
use numlpa_sample::distributions::{
    DipolesParameters, Distribution, ParameterSets, RestrictedParameters, UniformParameters,
};
use numlpa_sample::partition::Partition;
use numlpa_sample::serializer::Format;
use numlpa_sample::store::SampleStore;
use numlpa_sample::SampleError;
use tracing::debug;

use crate::config::Settings;

/// Draw a batch of samples into a container.
#[derive(Debug, Args)]
pub struct DrawArgs {
    /// Output container directory (created when missing).
    pub output: PathBuf,

    /// Number of samples in the batch.
    #[arg(long)]
    pub size: Option<usize>,

    /// Base seed; sample i is drawn with seed + i.
    #[arg(long)]
    pub seed: Option<u64>,

    /// File format: json or pyc.
    #[arg(long)]
    pub format: Option<Format>,

    /// Rank of this process among the cooperating ones.
    #[arg(long, env = "PMI_RANK", default_value_t = 0)]
    pub rank: usize,

    /// Number of cooperating processes.
    #[arg(long, env = "PMI_SIZE", default_value_t = 1)]
    pub ranks: usize,

    /// Distribution to draw from.
    #[command(subcommand)]
    pub distribution: DistributionArgs,
}

/// Distribution and its parameter overrides.
///
/// Numeric flags accept any sign and count flags any integer so that out of
/// domain values reach the distribution's own validation.
#[derive(Debug, Subcommand)]
pub enum DistributionArgs {
    /// Randomly placed and oriented dipoles, a fixed number per sub-area.
    Dipoles {
        /// Dipole separation in m (0 derives it from the density).
        #[arg(long, allow_negative_numbers = true)]
        length: Option<f64>,
        /// Sub-areas per side.
        #[arg(long, allow_negative_numbers = true)]
        nsub: Option<i64>,
        /// Dipoles per sub-area.
        #[arg(long, allow_negative_numbers = true)]
        pairs: Option<i64>,
        /// Region side in m.
        #[arg(long, allow_negative_numbers = true)]
        side: Option<f64>,
        /// Redraw dipoles whose endpoints leave the region (`--confine=false`
        /// turns a configured `confine = true` off).
        #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        confine: Option<bool>,
    },
    /// Independent uniformly placed dislocations with random senses.
    Uniform {
        /// Number of dislocations.
        #[arg(long, allow_negative_numbers = true)]
        number: Option<i64>,
        /// Region side in m.
        #[arg(long, allow_negative_numbers = true)]
        side: Option<f64>,
    },
    /// Uniform placement with equal signs in every sub-area.
    Restricted {
        /// Sub-areas per side.
        #[arg(long, allow_negative_numbers = true)]
        nsub: Option<i64>,
        /// Dislocations of each sign per sub-area.
        #[arg(long, allow_negative_numbers = true)]
        pairs: Option<i64>,
        /// Region side in m.
        #[arg(long, allow_negative_numbers = true)]
        side: Option<f64>,
    },
    /// Any other name; rejected as an unknown distribution.
    #[command(external_subcommand)]
    Other(Vec<String>),
}

/// Narrows a count flag, reporting it like any other invalid parameter.
fn count(name: &'static str, value: Option<i64>, default: u32) -> Result<u32, SampleError> {
    match value {
        None => Ok(default),
        Some(v) => u32::try_from(v).map_err(|_| SampleError::InvalidParameter {
            name,
            reason: format!("must be an integer in [1, {}], got {v}", u32::MAX),
        }),
    }
}

impl DistributionArgs {
    /// Overlays the flags on the configured parameter sets and builds the
    /// distribution.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown distribution name or if the
    /// resulting parameters are invalid.
    pub fn resolve(&self, defaults: &ParameterSets) -> Result<Distribution> {
        let mut sets = defaults.clone();
        let name = match self {
            Self::Dipoles { length, nsub, pairs, side, confine } => {
                let base = defaults.dipoles;
                sets.dipoles = DipolesParameters {
                    length: length.unwrap_or(base.length),
                    nsub: count("nsub", *nsub, base.nsub)?,
                    pairs: count("pairs", *pairs, base.pairs)?,
                    side: side.unwrap_or(base.side),
                    confine: confine.unwrap_or(base.confine),
                };
                "dipoles"
            }
            Self::Uniform { number, side } => {
                let base = defaults.uniform;
                sets.uniform = UniformParameters {
                    number: count("number", *number, base.number)?,
                    side: side.unwrap_or(base.side),
                };
                "uniform"
            }
            Self::Restricted { nsub, pairs, side } => {
                let base = defaults.restricted;
                sets.restricted = RestrictedParameters {
                    nsub: count("nsub", *nsub, base.nsub)?,
                    pairs: count("pairs", *pairs, base.pairs)?,
                    side: side.unwrap_or(base.side),
                };
                "restricted"
            }
            Self::Other(args) => args.first().map_or("", String::as_str),
        };
        Ok(Distribution::from_name(name, &sets)?)
    }
}

/// Draws the batch share of this rank.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or the container cannot
/// be created or listed.
pub fn run(args: &DrawArgs, settings: &Settings) -> Result<bool> {
    let distribution = args.distribution.resolve(&settings.distributions)?;
    let partition = Partition::new(args.rank, args.ranks)?;
    let size = args.size.unwrap_or(settings.draw.size);
    let seed = args.seed.unwrap_or(settings.draw.seed);
    let format = args.format.unwrap_or(settings.draw.format);

    debug!(?distribution, size, seed, %format, "resolved draw settings");
    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create container {}", args.output.display()))?;
    let store = SampleStore::new(&args.output, size, format);
    let report = draw_batch(&distribution, &store, seed, partition)?;

    println!(
        "{} batch of {size} in {}: {} written, {} skipped, {} failed",
        distribution.name(),
        args.output.display(),
        report.written.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for (index, reason) in &report.failed {
        eprintln!("  {}: {reason}", store.file_name(*index));
    }
    Ok(report.is_complete())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_only_what_they_name() {
        let mut defaults = ParameterSets::default();
        defaults.dipoles.side = 2e-6;
        defaults.dipoles.pairs = 3;
        let args = DistributionArgs::Dipoles {
            length: None,
            nsub: Some(2),
            pairs: None,
            side: None,
            confine: None,
        };
        let distribution = args.resolve(&defaults).unwrap();
        let expected = Distribution::from_name(
            "dipoles",
            &ParameterSets {
                dipoles: DipolesParameters {
                    nsub: 2,
                    ..defaults.dipoles
                },
                ..defaults.clone()
            },
        )
        .unwrap();
        assert_eq!(distribution, expected);
    }

    #[test]
    fn invalid_flags_surface_as_errors() {
        let args = DistributionArgs::Uniform {
            number: Some(0),
            side: None,
        };
        assert!(args.resolve(&ParameterSets::default()).is_err());
    }

    fn sample_error(args: &DistributionArgs) -> SampleError {
        args.resolve(&ParameterSets::default())
            .unwrap_err()
            .downcast::<SampleError>()
            .unwrap()
    }

    #[test]
    fn unknown_names_and_negative_values_reach_validation() {
        let other = DistributionArgs::Other(vec!["grid".to_owned(), "--side".to_owned()]);
        assert_eq!(
            sample_error(&other),
            SampleError::UnknownDistribution("grid".to_owned())
        );
        let negative = DistributionArgs::Restricted {
            nsub: Some(-2),
            pairs: None,
            side: None,
        };
        assert!(matches!(
            sample_error(&negative),
            SampleError::InvalidParameter { name: "nsub", .. }
        ));
        let side = DistributionArgs::Uniform {
            number: None,
            side: Some(-2e-6),
        };
        assert!(matches!(
            sample_error(&side),
            SampleError::InvalidParameter { name: "side", .. }
        ));
    }

    #[test]
    fn confine_flag_can_turn_the_configured_value_off() {
        let mut defaults = ParameterSets::default();
        defaults.dipoles.confine = true;
        let off = DistributionArgs::Dipoles {
            length: None,
            nsub: None,
            pairs: None,
            side: None,
            confine: Some(false),
        };
        let inherit = DistributionArgs::Dipoles {
            length: None,
            nsub: None,
            pairs: None,
            side: None,
            confine: None,
        };
        let record = |args: &DistributionArgs| {
            args.resolve(&defaults).unwrap().draw(0).distribution.parameters["confine"].clone()
        };
        assert_eq!(record(&off), serde_json::json!(false));
        assert_eq!(record(&inherit), serde_json::json!(true));
    }
}
