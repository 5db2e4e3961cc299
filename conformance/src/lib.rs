//! NumLPA conformance suite.
//!
//! Audits a sample container the way a downstream analysis would rely on
//! it: files must be named by index, decode, carry the sample header, and
//! respect the physical invariants of the distribution they were drawn from.
//!
//! # Conformance Scope
//!
//! | Check | Requirement |
//! |-------|-------------|
//! | Naming | `<index>.<ext>`, uniform zero-padded width, known extension |
//! | Header | decodes, type tag `dislocation-sample`, three-part version |
//! | Density | recorded density = count / area |
//! | Containment | dislocations inside the region (dipole endpoints may escape) |
//! | Senses | sign balance for `dipoles` and `restricted`, adjacent pairs for `dipoles` |
//!
//! # Entry Point
//!
//! ```no_run
//! use numlpa_conformance::{run_all, ContainerPaths};
//! use std::path::PathBuf;
//!
//! let paths = ContainerPaths {
//!     container: PathBuf::from("out"),
//!     batch_size: Some(10),
//! };
//! let report = run_all(&paths).expect("container can be listed");
//! assert!(report.all_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod container;
pub mod report;
pub mod validators;

use std::path::PathBuf;

use anyhow::{bail, Result};

pub use report::{ConformanceReport, Severity, TestResult};

/// Container to audit.
#[derive(Debug, Clone)]
pub struct ContainerPaths {
    /// Directory holding the sample files.
    pub container: PathBuf,
    /// Batch size the container was drawn with, when known.
    pub batch_size: Option<usize>,
}

/// Runs all validators over the container and returns the aggregated report.
///
/// Validators are run in this order:
/// 1. File naming
/// 2. Decoding and header tag
/// 3. Density consistency
/// 4. Region containment
/// 5. Sign balance and dipole pairing
///
/// # Errors
///
/// Returns an error if the container is not a directory or cannot be listed.
pub fn run_all(paths: &ContainerPaths) -> Result<ConformanceReport> {
    if !paths.container.is_dir() {
        bail!("{} is not a directory", paths.container.display());
    }
    let entries = container::scan(&paths.container)?;
    let mut report = ConformanceReport::new();
    report.extend(validators::naming::validate(&entries, paths.batch_size));
    report.extend(validators::header::validate(&entries));
    report.extend(validators::density::validate(&entries));
    report.extend(validators::containment::validate(&entries));
    report.extend(validators::senses::validate(&entries));
    Ok(report)
}
