//! `numlpa bootstrap`: reduce a λ file to an interval and a verdict.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use numlpa_analysis::bootstrap::summarize;
use numlpa_analysis::fit::LambdaFile;
use tracing::info;

use crate::commands::emit;
use crate::config::Settings;

/// Bootstrap interval and hypothesis test of a λ distribution.
#[derive(Debug, Args)]
pub struct BootstrapArgs {
    /// λ file written by `fit`.
    pub lambdas: PathBuf,

    /// Significance level.
    #[arg(long)]
    pub alpha: Option<f64>,

    /// p-values for the null hypotheses λ < 1 and λ > 1.
    #[arg(long, num_args = 2, value_names = ["P_LOW", "P_HIGH"])]
    pub p_values: Option<Vec<f64>>,

    /// Write the summary here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Summarizes the λ file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the inputs are invalid.
pub fn run(args: &BootstrapArgs, settings: &Settings) -> Result<bool> {
    let text = fs::read_to_string(&args.lambdas)
        .with_context(|| format!("Failed to read {}", args.lambdas.display()))?;
    let file: LambdaFile = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", args.lambdas.display()))?;
    let p_values = match args.p_values.as_deref() {
        Some(&[low, high]) => Some((low, high)),
        _ => file.p_values.map(|[low, high]| (low, high)),
    };
    let alpha = args.alpha.unwrap_or(settings.bootstrap.alpha);
    info!(count = file.lambdas.len(), alpha, ?p_values, "bootstrapping λ distribution");
    let summary = summarize(&file.lambdas, alpha, p_values)?;
    emit(&summary, args.output.as_deref())?;
    Ok(true)
}
