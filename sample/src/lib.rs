//! NumLPA dislocation samples.
//!
//! The `numlpa-sample` crate draws random dislocation samples from a closed
//! registry of distributions and persists them into sample containers.
//!
//! # Entry Point
//!
//! ```no_run
//! use numlpa_sample::batch::draw_batch;
//! use numlpa_sample::distributions::{Distribution, ParameterSets};
//! use numlpa_sample::partition::Partition;
//! use numlpa_sample::serializer::Format;
//! use numlpa_sample::store::SampleStore;
//!
//! let distribution = Distribution::from_name("dipoles", &ParameterSets::default())
//!     .expect("valid defaults");
//! let store = SampleStore::new("out", 10, Format::Json);
//! let report = draw_batch(&distribution, &store, 42, Partition::whole())
//!     .expect("container can be listed");
//! assert!(report.is_complete());
//! ```
//!
//! # Layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Sample, region, dislocations, provenance |
//! | [`distributions`] | Distribution engine |
//! | [`serializer`] | JSON and binary codecs |
//! | [`store`] | Append-only container with atomic writes |
//! | [`partition`] | Index ownership among processes |
//! | [`batch`] | Streaming draw-and-store loop |

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod batch;
pub mod distributions;
pub mod error;
pub mod model;
pub mod partition;
pub mod serializer;
pub mod store;

pub use error::{SampleError, StoreError};
pub use model::{
    Dislocation, Dislocations, DistributionRecord, Metadata, Region, Sample, Sense, SAMPLE_TYPE,
};
