//! Streaming batch driver: draw, persist, drop.

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::distributions::Distribution;
use crate::error::StoreError;
use crate::partition::Partition;
use crate::store::SampleStore;

/// Outcome of one batch run in one process.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written by this run.
    pub written: Vec<PathBuf>,
    /// Indices skipped because their file already existed.
    pub skipped: Vec<usize>,
    /// Indices whose file could not be written, with the diagnostic.
    pub failed: Vec<(usize, String)>,
}

impl BatchReport {
    /// Returns true if every owned index is now present on disk.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Seed of the sample at `index` in a batch seeded with `seed`.
#[must_use]
pub fn sample_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add(index as u64)
}

/// Draws and stores every index of the batch owned by `partition`.
///
/// Indices already present in the container are skipped, so re-running the
/// same batch is idempotent. A serialization failure is recorded and the
/// batch moves on to the next index.
///
/// # Errors
///
/// Returns [`StoreError::Listing`] if the container cannot be listed
/// initially; per-file failures are reported in [`BatchReport::failed`].
pub fn draw_batch(
    distribution: &Distribution,
    store: &SampleStore,
    seed: u64,
    partition: Partition,
) -> Result<BatchReport, StoreError> {
    let existing = store.list_existing()?;
    let mut report = BatchReport::default();
    info!(
        distribution = distribution.name(),
        size = store.batch_size(),
        rank = partition.rank(),
        ranks = partition.size(),
        existing = existing.len(),
        "drawing batch into {}",
        store.root().display()
    );
    for index in partition.indices(store.batch_size()) {
        let name = store.file_name(index);
        if existing.contains(&name) {
            debug!(index, "skipping existing {name}");
            report.skipped.push(index);
            continue;
        }
        let sample = distribution.draw(sample_seed(seed, index));
        match store.save(index, &sample) {
            Ok(path) => {
                debug!(index, count = sample.dislocations.len(), "wrote {}", path.display());
                report.written.push(path);
            }
            Err(StoreError::AlreadyExists(path)) => {
                warn!(index, "skipping {} written concurrently", path.display());
                report.skipped.push(index);
            }
            Err(e) => {
                error!(index, "{e}");
                report.failed.push((index, e.to_string()));
            }
        }
    }
    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}
