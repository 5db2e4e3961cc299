//! File naming validator.
//!
//! Every sample file is named `<index>.<ext>` where the index is zero-padded
//! to the width of the largest index of its batch.

use std::collections::BTreeSet;

use numlpa_sample::serializer::Format;
use numlpa_sample::store::digits;

use crate::container::Entry;
use crate::report::{ConformanceReport, Severity, TestResult};

const VALIDATOR: &str = "container/naming";

/// Validates the names of the container files.
pub fn validate(entries: &[Entry], batch_size: Option<usize>) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    if entries.is_empty() {
        report.push(TestResult::warn(VALIDATOR, "Container holds no sample files"));
        return report;
    }

    let mut unknown = Vec::new();
    let mut malformed = Vec::new();
    let mut formats = BTreeSet::new();
    let mut widths = BTreeSet::new();
    let mut indices = Vec::new();
    for entry in entries {
        let Some((stem, extension)) = entry.name.rsplit_once('.') else {
            unknown.push(entry.name.clone());
            continue;
        };
        match Format::from_extension(extension) {
            Some(format) => {
                formats.insert(format.extension());
            }
            None => unknown.push(entry.name.clone()),
        }
        match stem.parse::<usize>() {
            Ok(index) if stem.bytes().all(|b| b.is_ascii_digit()) => {
                widths.insert(stem.len());
                indices.push((index, entry.name.clone()));
            }
            _ => malformed.push(entry.name.clone()),
        }
    }

    report.push(TestResult::from_offenders(
        VALIDATOR,
        format!("All {} files carry a known extension", entries.len()),
        "Files with an unknown extension",
        Severity::Failure,
        unknown,
    ));
    report.push(TestResult::from_offenders(
        VALIDATOR,
        "All file stems are sample indices",
        "File stems that are not sample indices",
        Severity::Failure,
        malformed,
    ));
    if formats.len() > 1 {
        report.push(TestResult::warn(
            VALIDATOR,
            format!("Container mixes formats: {formats:?}"),
        ));
    }

    match widths.len() {
        0 => {}
        1 => report.push(TestResult::pass(VALIDATOR, "Indices share one width")),
        _ => report.push(TestResult::fail(
            VALIDATOR,
            format!("Indices use several widths: {widths:?}"),
        )),
    }

    if let Some(size) = batch_size {
        let width = digits(size.saturating_sub(1));
        let outside: Vec<String> = indices
            .iter()
            .filter(|(index, _)| *index >= size)
            .map(|(_, name)| name.clone())
            .collect();
        report.push(TestResult::from_offenders(
            VALIDATOR,
            format!("All indices lie below the batch size {size}"),
            format!("Indices at or beyond the batch size {size}"),
            Severity::Failure,
            outside,
        ));
        let misfit: Vec<String> = widths
            .iter()
            .filter(|w| **w != width)
            .map(|w| format!("width {w}"))
            .collect();
        report.push(TestResult::from_offenders(
            VALIDATOR,
            format!("Index width {width} matches the batch size"),
            format!("Index width differs from the {width} digits of the batch size"),
            Severity::Failure,
            misfit,
        ));
    }
    report
}
