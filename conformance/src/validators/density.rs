//! Density consistency validator.

use crate::container::Entry;
use crate::report::{ConformanceReport, Severity, TestResult};

const VALIDATOR: &str = "sample/density";

/// Relative tolerance between recorded and measured density.
const TOLERANCE: f64 = 1e-9;

/// Validates that the recorded density equals count over area and that the
/// dislocation arrays are parallel.
pub fn validate(entries: &[Entry]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let mut ragged = Vec::new();
    let mut inconsistent = Vec::new();
    for (entry, sample) in entries.iter().filter_map(|e| e.decoded().map(|s| (e, s))) {
        if !sample.dislocations.is_well_formed() {
            ragged.push(entry.name.clone());
        } else if !sample.density_is_consistent(TOLERANCE) {
            inconsistent.push(format!(
                "{}: recorded {:e}, measured {:e}",
                entry.name,
                sample.distribution.density,
                sample.measured_density()
            ));
        }
    }
    report.push(TestResult::from_offenders(
        VALIDATOR,
        "Sense and position arrays have equal lengths",
        "Samples with ragged dislocation arrays",
        Severity::Failure,
        ragged,
    ));
    report.push(TestResult::from_offenders(
        VALIDATOR,
        "Recorded densities match count over area",
        "Samples whose recorded density disagrees with their content",
        Severity::Failure,
        inconsistent,
    ));
    report
}
