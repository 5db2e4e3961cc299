//! `numlpa fit`: fit the Wilkens model to a set of transforms.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use numlpa_analysis::fit::{fit_all, LambdaFile};
use tracing::info;
use walkdir::WalkDir;

use crate::commands::emit;
use crate::config::Settings;

/// Fit density and cut-off radius of every transform.
#[derive(Debug, Args)]
pub struct FitArgs {
    /// Transform files, or directories of `*.json` transforms.
    #[arg(required = true)]
    pub transforms: Vec<PathBuf>,

    /// Harmonic of the diffraction vector.
    #[arg(long)]
    pub harmonic: Option<u32>,

    /// Number of leading Fourier variables to keep.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Write the λ file here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Expands directories into their JSON files, sorted by name.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed or nothing is found.
pub fn collect(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to list {}", input.display()))?;
            if entry.file_type().is_file() && is_json(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    if files.is_empty() {
        bail!("no transform files found");
    }
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

/// Fits every transform and writes the λ file.
///
/// # Errors
///
/// Returns an error if a transform cannot be read or fitted.
pub fn run(args: &FitArgs, settings: &Settings) -> Result<bool> {
    let files = collect(&args.transforms)?;
    let harmonic = args.harmonic.unwrap_or(settings.fit.harmonic);
    let limit = args.limit.or(settings.fit.limit);
    info!(files = files.len(), harmonic, ?limit, "fitting transforms");
    let fits = fit_all(&files, harmonic, limit, settings.fit.settings())?;
    emit(&LambdaFile::from_fits(fits), args.output.as_deref())?;
    Ok(true)
}
