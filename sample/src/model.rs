//! Core sample model types.
//!
//! These types mirror the canonical JSON layout of a persisted sample:
//!
//! ```text
//! { metadata, distribution, region, dislocations: { senses, positions } }
//! ```
//!
//! Field order of every struct is the serialization order, so two equal
//! samples always produce byte-identical JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type tag written in the `metadata.type` field of every sample.
pub const SAMPLE_TYPE: &str = "dislocation-sample";

/// Provenance header attached to a sample at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Always [`SAMPLE_TYPE`] for samples produced by this crate.
    #[serde(rename = "type")]
    pub type_: String,
    /// ISO-8601 UTC creation timestamp.
    pub date: String,
    /// Version of the producing crate (major, minor, patch).
    pub version: Vec<u32>,
}

impl Metadata {
    /// Returns a header stamped with the current UTC time.
    #[must_use]
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Returns a header stamped with the given instant.
    #[must_use]
    pub fn at(date: DateTime<Utc>) -> Self {
        Self {
            type_: SAMPLE_TYPE.to_owned(),
            date: date.to_rfc3339_opts(SecondsFormat::Micros, true),
            version: crate_version(),
        }
    }
}

fn crate_version() -> Vec<u32> {
    [
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    ]
    .iter()
    .map(|part| part.parse().unwrap_or_default())
    .collect()
}

/// Record of the distribution a sample was drawn from.
///
/// `parameters` holds every effective input parameter by name. It is a
/// sorted map so that the flattened JSON keys come out in a stable order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    /// Registry name of the distribution (e.g. `"dipoles"`).
    pub module: String,
    /// Seed the random generator was initialized with.
    pub seed: u64,
    /// Derived dislocation density (m⁻²).
    pub density: f64,
    /// Remaining distribution parameters.
    #[serde(flatten)]
    pub parameters: BTreeMap<String, Value>,
}

impl DistributionRecord {
    /// Returns a numeric parameter by name, if present.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).and_then(Value::as_f64)
    }
}

/// Planar region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Region {
    /// Square `[0, side]²`.
    Square {
        /// Side length (m).
        side: f64,
    },
}

impl Region {
    /// Area of the region (m²).
    #[must_use]
    pub fn area(&self) -> f64 {
        match self {
            Region::Square { side } => side * side,
        }
    }

    /// Returns true if `(x, y)` lies strictly inside the region.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Region::Square { side } => x > 0.0 && x < *side && y > 0.0 && y < *side,
        }
    }
}

/// Sign of a dislocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// `+1`
    Positive,
    /// `-1`
    Negative,
}

impl Sense {
    /// Numeric value stored in the `senses` array.
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Sense::Positive => 1,
            Sense::Negative => -1,
        }
    }

    /// Parses a stored sense; anything other than `±1` is rejected.
    #[must_use]
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(Sense::Positive),
            -1 => Some(Sense::Negative),
            _ => None,
        }
    }

    /// The opposite sign.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Sense::Positive => Sense::Negative,
            Sense::Negative => Sense::Positive,
        }
    }
}

/// A single signed point defect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dislocation {
    /// Sign of the Burgers vector.
    pub sense: Sense,
    /// Abscissa (m).
    pub x: f64,
    /// Ordinate (m).
    pub y: f64,
}

/// Column-oriented storage of the dislocations of a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dislocations {
    /// `±1` per dislocation.
    pub senses: Vec<i8>,
    /// `[xs, ys]`.
    pub positions: [Vec<f64>; 2],
}

impl Dislocations {
    /// Creates an empty set with room for `capacity` dislocations.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            senses: Vec::with_capacity(capacity),
            positions: [Vec::with_capacity(capacity), Vec::with_capacity(capacity)],
        }
    }

    /// Appends one dislocation.
    pub fn push(&mut self, sense: Sense, x: f64, y: f64) {
        self.senses.push(sense.as_i8());
        self.positions[0].push(x);
        self.positions[1].push(y);
    }

    /// Number of dislocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senses.len()
    }

    /// Returns true when there are no dislocations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    /// Returns true if the three columns have the same length and every
    /// sense is `±1`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let n = self.senses.len();
        self.positions[0].len() == n
            && self.positions[1].len() == n
            && self.senses.iter().all(|&s| Sense::from_i8(s).is_some())
    }

    /// Iterates over the dislocations in storage order. Entries with an
    /// invalid sense are skipped.
    pub fn iter(&self) -> impl Iterator<Item = Dislocation> + '_ {
        self.senses
            .iter()
            .zip(self.positions[0].iter().zip(self.positions[1].iter()))
            .filter_map(|(&s, (&x, &y))| Sense::from_i8(s).map(|sense| Dislocation { sense, x, y }))
    }

    /// Counts the dislocations carrying `sense`.
    #[must_use]
    pub fn count(&self, sense: Sense) -> usize {
        let value = sense.as_i8();
        self.senses.iter().filter(|&&s| s == value).count()
    }
}

/// One complete draw from a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Provenance header.
    pub metadata: Metadata,
    /// Distribution provenance record.
    pub distribution: DistributionRecord,
    /// Region of interest.
    pub region: Region,
    /// Drawn dislocations.
    pub dislocations: Dislocations,
}

impl Sample {
    /// Number of dislocations divided by the region area.
    #[must_use]
    pub fn measured_density(&self) -> f64 {
        self.dislocations.len() as f64 / self.region.area()
    }

    /// Returns true when the recorded density agrees with the measured one
    /// up to `rel_tol` relative error.
    #[must_use]
    pub fn density_is_consistent(&self, rel_tol: f64) -> bool {
        let measured = self.measured_density();
        let recorded = self.distribution.density;
        (measured - recorded).abs() <= rel_tol * measured.abs().max(recorded.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_containment_is_strict() {
        let region = Region::Square { side: 1.0 };
        assert!(region.contains(0.5, 0.5));
        assert!(!region.contains(0.0, 0.5));
        assert!(!region.contains(0.5, 1.0));
        assert!(!region.contains(-0.1, 0.5));
        assert_eq!(region.area(), 1.0);
    }

    #[test]
    fn region_serializes_with_type_tag() {
        let value = serde_json::to_value(Region::Square { side: 2.0 }).unwrap();
        assert_eq!(value, serde_json::json!({"type": "square", "side": 2.0}));
    }

    #[test]
    fn distribution_parameters_are_flattened_in_order() {
        let mut parameters = BTreeMap::new();
        parameters.insert("side".to_owned(), serde_json::json!(1.0));
        parameters.insert("nsub".to_owned(), serde_json::json!(2));
        let record = DistributionRecord {
            module: "dipoles".to_owned(),
            seed: 7,
            density: 4.0,
            parameters,
        };
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(
            text,
            r#"{"module":"dipoles","seed":7,"density":4.0,"nsub":2,"side":1.0}"#
        );
        let back: DistributionRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.number("nsub"), Some(2.0));
    }

    #[test]
    fn metadata_carries_type_and_version() {
        let metadata = Metadata::now();
        assert_eq!(metadata.type_, SAMPLE_TYPE);
        assert_eq!(metadata.version.len(), 3);
        assert!(metadata.date.ends_with('Z'));
    }

    #[test]
    fn dislocations_count_by_sense() {
        let mut d = Dislocations::default();
        d.push(Sense::Positive, 0.1, 0.2);
        d.push(Sense::Negative, 0.3, 0.4);
        d.push(Sense::Positive, 0.5, 0.6);
        assert_eq!(d.len(), 3);
        assert_eq!(d.count(Sense::Positive), 2);
        assert_eq!(d.count(Sense::Negative), 1);
        assert!(d.is_well_formed());
        let second = d.iter().nth(1).unwrap();
        assert_eq!(second.sense, Sense::Negative);
        assert_eq!((second.x, second.y), (0.3, 0.4));
    }

    #[test]
    fn sense_round_trips_through_i8() {
        for sense in [Sense::Positive, Sense::Negative] {
            assert_eq!(Sense::from_i8(sense.as_i8()), Some(sense));
            assert_eq!(sense.opposite().opposite(), sense);
        }
        assert_eq!(Sense::from_i8(0), None);
    }
}
