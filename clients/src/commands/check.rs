//! `numlpa check`: conformance audit of a sample container.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use numlpa_conformance::{run_all, ContainerPaths, Severity};

/// Audit a sample container.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Container directory.
    pub container: PathBuf,

    /// Batch size the container was drawn with.
    #[arg(long)]
    pub size: Option<usize>,
}

/// Prints the conformance report; `Ok(false)` when a check failed.
///
/// # Errors
///
/// Returns an error if the container cannot be listed.
pub fn run(args: &CheckArgs) -> Result<bool> {
    let report = run_all(&ContainerPaths {
        container: args.container.clone(),
        batch_size: args.size,
    })?;

    println!("NumLPA Container Conformance Report");
    println!("===================================");
    println!();
    for result in &report.results {
        println!("[{}] {}: {}", result.severity, result.validator, result.message);
        for detail in &result.details {
            println!("       {detail}");
        }
    }
    println!();
    println!(
        "Summary: {} passed, {} warnings, {} failed",
        report.count(Severity::Pass),
        report.count(Severity::Warning),
        report.failure_count()
    );

    if !report.all_passed() {
        eprintln!(
            "Conformance FAILED: {} check(s) did not pass.",
            report.failure_count()
        );
        return Ok(false);
    }
    println!("Conformance PASSED.");
    Ok(true)
}
