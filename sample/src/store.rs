//! Append-only sample container.
//!
//! A container is a directory holding one sample per file, named after the
//! sample index zero-padded to the width of the largest index of the batch
//! (`0.json … 9.json` for ten samples, `000.pyc … 149.pyc` for 150).
//!
//! Files are written to a hidden temporary file in the same directory and
//! then persisted without clobbering, so a file is either complete or absent,
//! and two writers racing for the same index cannot both succeed.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::error::StoreError;
use crate::model::Sample;
use crate::serializer::Format;

const TEMP_PREFIX: &str = ".";
const TEMP_SUFFIX: &str = ".partial";

/// Number of decimal digits of `n` (`digits(0) == 1`).
#[must_use]
pub fn digits(n: usize) -> usize {
    let mut n = n;
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

/// Handle on a sample container for one batch.
#[derive(Debug, Clone)]
pub struct SampleStore {
    root: PathBuf,
    batch_size: usize,
    width: usize,
    format: Format,
}

impl SampleStore {
    /// Opens the container at `root` for a batch of `batch_size` samples.
    /// Nothing is created on disk until the first [`save`](Self::save).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, batch_size: usize, format: Format) -> Self {
        Self {
            root: root.into(),
            batch_size,
            width: digits(batch_size.saturating_sub(1)),
            format,
        }
    }

    /// Container directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of samples in the batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Format new files are written in.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Width of the zero-padded file stem.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// File name of the sample at `index`.
    #[must_use]
    pub fn file_name(&self, index: usize) -> String {
        format!(
            "{index:0width$}.{ext}",
            width = self.width,
            ext = self.format.extension()
        )
    }

    /// Full path of the sample at `index`.
    #[must_use]
    pub fn path(&self, index: usize) -> PathBuf {
        self.root.join(self.file_name(index))
    }

    /// Names of the sample files already present in the container.
    ///
    /// Hidden files (including in-flight temporary files) are ignored. A
    /// container that does not exist yet is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Listing`] if the directory cannot be read.
    pub fn list_existing(&self) -> Result<BTreeSet<String>, StoreError> {
        let listing_error = |source: io::Error| StoreError::Listing {
            path: self.root.clone(),
            source,
        };
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(listing_error(e)),
        };
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(listing_error)?;
            if !entry.file_type().map_err(listing_error)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.insert(name.to_owned());
                }
            }
        }
        Ok(names)
    }

    /// Writes `sample` as the entry for `index` and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the sample file is present
    /// (or appears while writing), and [`StoreError::Serialization`] on any
    /// encoding or I/O failure, including a non-file entry squatting on the
    /// name. No partial file is left behind.
    pub fn save(&self, index: usize, sample: &Sample) -> Result<PathBuf, StoreError> {
        let path = self.path(index);
        let failed = |source: io::Error| StoreError::Serialization {
            path: path.clone(),
            source,
        };
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_file() => return Err(StoreError::AlreadyExists(path.clone())),
            Ok(_) => {
                return Err(failed(io::Error::other(
                    "entry exists but is not a regular file",
                )))
            }
            Err(_) => {}
        }
        let bytes = self.format.encode(sample).map_err(failed)?;
        fs::create_dir_all(&self.root).map_err(failed)?;
        let mut temp = Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.root)
            .map_err(failed)?;
        temp.write_all(&bytes).map_err(failed)?;
        temp.as_file().sync_all().map_err(failed)?;
        match temp.persist_noclobber(&path) {
            Ok(_) => Ok(path),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(path))
            }
            Err(e) => Err(failed(e.error)),
        }
    }

    /// Reads the entry called `name`, picking the codec from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownFormat`] for an unknown extension and
    /// [`StoreError::Decode`] if the file cannot be read or decoded.
    pub fn load(&self, name: &str) -> Result<Sample, StoreError> {
        load_file(&self.root.join(name))
    }
}

/// Reads a sample file anywhere on disk, picking the codec from its
/// extension.
///
/// # Errors
///
/// Returns [`StoreError::UnknownFormat`] for an unknown extension and
/// [`StoreError::Decode`] if the file cannot be read or decoded.
pub fn load_file(path: &Path) -> Result<Sample, StoreError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let format = extension.parse::<Format>()?;
    let decode_error = |source: io::Error| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(decode_error)?;
    format.decode(&bytes).map_err(decode_error)
}
