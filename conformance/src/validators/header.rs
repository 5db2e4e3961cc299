//! Decoding and header validator.

use numlpa_sample::SAMPLE_TYPE;

use crate::container::Entry;
use crate::report::{ConformanceReport, Severity, TestResult};

const VALIDATOR: &str = "sample/header";

/// Validates that every file decodes and carries the sample header.
pub fn validate(entries: &[Entry]) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let undecodable: Vec<String> = entries
        .iter()
        .filter_map(|e| e.sample.as_ref().err().map(|err| format!("{}: {err}", e.name)))
        .collect();
    report.push(TestResult::from_offenders(
        VALIDATOR,
        format!("All {} files decode", entries.len()),
        "Files that do not decode as samples",
        Severity::Failure,
        undecodable,
    ));

    let mistagged: Vec<String> = entries
        .iter()
        .filter_map(|e| e.decoded().map(|s| (e, s)))
        .filter(|(_, s)| s.metadata.type_ != SAMPLE_TYPE || s.metadata.version.len() != 3)
        .map(|(e, s)| {
            format!(
                "{}: type `{}`, version {:?}",
                e.name, s.metadata.type_, s.metadata.version
            )
        })
        .collect();
    report.push(TestResult::from_offenders(
        VALIDATOR,
        format!("Headers are tagged `{SAMPLE_TYPE}` with a three-part version"),
        "Files with a foreign header",
        Severity::Failure,
        mistagged,
    ));
    report
}
