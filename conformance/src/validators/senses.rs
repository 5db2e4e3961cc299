//! Sign balance and dipole pairing validator.

use numlpa_sample::{Sample, Sense};

use crate::container::Entry;
use crate::report::{ConformanceReport, Severity, TestResult};

const VALIDATOR: &str = "sample/senses";

/// Relative tolerance on the dipole separation.
const SEPARATION_TOLERANCE: f64 = 1e-9;

fn is_balanced_module(sample: &Sample) -> bool {
    matches!(sample.distribution.module.as_str(), "dipoles" | "restricted")
}

/// Expected count of each sign, from `pairs · nsub²` when recorded.
fn expected_per_sign(sample: &Sample) -> Option<usize> {
    let nsub = sample.distribution.number("nsub")?;
    let pairs = sample.distribution.number("pairs")?;
    Some((pairs * nsub * nsub) as usize)
}

fn balance_issue(sample: &Sample) -> Option<String> {
    let positive = sample.dislocations.count(Sense::Positive);
    let negative = sample.dislocations.count(Sense::Negative);
    if positive != negative {
        return Some(format!("{positive} positive against {negative} negative"));
    }
    match expected_per_sign(sample) {
        Some(expected) if expected != positive => {
            Some(format!("{positive} of each sign, expected {expected}"))
        }
        _ => None,
    }
}

fn pairing_issue(sample: &Sample) -> Option<String> {
    let dislocations: Vec<_> = sample.dislocations.iter().collect();
    let length = sample.distribution.number("length");
    for (i, pair) in dislocations.chunks(2).enumerate() {
        let [first, second] = pair else {
            return Some("odd number of dislocations".to_owned());
        };
        if first.sense != Sense::Positive || second.sense != first.sense.opposite() {
            return Some(format!("pair {i} is not (+1, -1)"));
        }
        if let Some(length) = length.filter(|l| *l > 0.0) {
            let separation = (first.x - second.x).hypot(first.y - second.y);
            if (separation - length).abs() > SEPARATION_TOLERANCE * length {
                return Some(format!("pair {i} separated by {separation:e}, expected {length:e}"));
            }
        }
    }
    None
}

/// Validates sign balance and, for dipoles, the pairing of adjacent entries.
pub fn validate(entries: &[Entry]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let mut unbalanced = Vec::new();
    let mut unpaired = Vec::new();
    for (entry, sample) in entries.iter().filter_map(|e| e.decoded().map(|s| (e, s))) {
        if is_balanced_module(sample) {
            if let Some(issue) = balance_issue(sample) {
                unbalanced.push(format!("{}: {issue}", entry.name));
            }
        }
        if sample.distribution.module == "dipoles" {
            if let Some(issue) = pairing_issue(sample) {
                unpaired.push(format!("{}: {issue}", entry.name));
            }
        }
        if sample.dislocations.senses.iter().any(|s| Sense::from_i8(*s).is_none()) {
            unbalanced.push(format!("{}: sense outside {{-1, +1}}", entry.name));
        }
    }
    report.push(TestResult::from_offenders(
        VALIDATOR,
        "Balanced distributions carry as many positive as negative dislocations",
        "Samples with unbalanced or invalid senses",
        Severity::Failure,
        unbalanced,
    ));
    report.push(TestResult::from_offenders(
        VALIDATOR,
        "Dipole samples list each dipole as an adjacent (+1, -1) pair",
        "Dipole samples with broken pairs",
        Severity::Failure,
        unpaired,
    ));
    report
}
