//! Listing and decoding of the files of a sample container.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use numlpa_sample::store::load_file;
use numlpa_sample::Sample;
use walkdir::WalkDir;

/// One visible file of a container.
#[derive(Debug)]
pub struct Entry {
    /// File name.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// Decoded sample, or the decoding diagnostic.
    pub sample: std::result::Result<Sample, String>,
}

impl Entry {
    /// The decoded sample, if decoding succeeded.
    pub fn decoded(&self) -> Option<&Sample> {
        self.sample.as_ref().ok()
    }
}

/// Reads every visible regular file directly under `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory cannot be traversed.
pub fn scan(dir: &Path) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for item in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let item = item.with_context(|| format!("Failed to list {}", dir.display()))?;
        let name = item.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !item.file_type().is_file() {
            continue;
        }
        let sample = load_file(item.path()).map_err(|e| e.to_string());
        entries.push(Entry {
            name,
            path: item.into_path(),
            sample,
        });
    }
    Ok(entries)
}
