//! Subcommand implementations.
//!
//! Every `run` returns `Ok(true)` when the command did all it was asked,
//! `Ok(false)` when it finished but something must be reported through the
//! exit status, and `Err` on a fatal error.

pub mod bootstrap;
pub mod check;
pub mod diffract;
pub mod draw;
pub mod evaluate;
pub mod fit;
pub mod model;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use numlpa_sample::serializer::Format;
use numlpa_sample::store::load_file;
use numlpa_sample::Sample;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

/// Writes `value` as pretty JSON to `output`, or to stdout.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or the file written.
pub fn emit(value: &impl Serialize, output: Option<&Path>) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    text.push('\n');
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("  Written: {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Expands sample containers into their sample files, sorted by name.
/// Files given explicitly are kept whatever their extension.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed or nothing is found.
pub fn sample_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to list {}", input.display()))?;
            let known = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.parse::<Format>().is_ok());
            if entry.file_type().is_file() && known {
                files.push(entry.into_path());
            }
        }
    }
    if files.is_empty() {
        bail!("no sample files found");
    }
    Ok(files)
}

/// Runs `compute` on every sample in `inputs` and writes each result to
/// `<output>/<stem>.json`.
///
/// # Errors
///
/// Stops at the first sample that cannot be read, processed or written.
pub fn for_each_sample<T: Serialize>(
    inputs: &[PathBuf],
    output: &Path,
    mut compute: impl FnMut(&Sample) -> Result<T>,
) -> Result<usize> {
    let files = sample_files(inputs)?;
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    for file in &files {
        debug!(file = %file.display(), "processing sample");
        let sample = load_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let result = compute(&sample).with_context(|| format!("Sample {}", file.display()))?;
        let stem = file.file_stem().map_or_else(|| "sample".into(), |s| s.to_string_lossy());
        emit(&result, Some(&output.join(format!("{stem}.json"))))?;
    }
    Ok(files.len())
}
