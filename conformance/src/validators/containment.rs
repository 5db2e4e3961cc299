//! Region containment validator.
//!
//! Uniform and restricted draws place every dislocation inside the region.
//! Dipole centers are inside too, but an endpoint may fall outside unless
//! the draw was confined, so escaped dipole endpoints are only warnings.

use numlpa_sample::Sample;
use serde_json::Value;

use crate::container::Entry;
use crate::report::{ConformanceReport, Severity, TestResult};

const VALIDATOR: &str = "sample/containment";

fn escaped(sample: &Sample) -> usize {
    sample
        .dislocations
        .iter()
        .filter(|d| !sample.region.contains(d.x, d.y))
        .count()
}

fn tolerates_escape(sample: &Sample) -> bool {
    sample.distribution.module == "dipoles"
        && !sample
            .distribution
            .parameters
            .get("confine")
            .and_then(Value::as_bool)
            .unwrap_or(false)
}

/// Validates that dislocations lie inside the sample region.
pub fn validate(entries: &[Entry]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for (entry, sample) in entries.iter().filter_map(|e| e.decoded().map(|s| (e, s))) {
        let count = escaped(sample);
        if count == 0 {
            continue;
        }
        let line = format!("{}: {count} of {} outside", entry.name, sample.dislocations.len());
        if tolerates_escape(sample) {
            warnings.push(line);
        } else {
            failures.push(line);
        }
    }
    report.push(TestResult::from_offenders(
        VALIDATOR,
        "Every bound dislocation lies inside its region",
        "Samples with dislocations outside their region",
        Severity::Failure,
        failures,
    ));
    if !warnings.is_empty() {
        report.push(
            TestResult::warn(VALIDATOR, "Dipole endpoints outside their region")
                .with_details(warnings),
        );
    }
    report
}
