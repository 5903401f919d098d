//! # agc-hist
//!
//! Post-processing pipeline for AGC analysis histograms: merge partial
//! per-shard outputs into one container, normalize each histogram to its
//! expected physical yield (`xsec * lumi`), and synthesize pseudodata for
//! downstream fitting.
//!
//! ## Example
//!
//! ```no_run
//! use agc_hist::{merge, AnalysisConfig, ScaleOptions};
//! use std::collections::BTreeMap;
//!
//! let config = AnalysisConfig::default();
//! let merged = merge::merge(&["shard0.json", "shard1.json"]).unwrap();
//! merged.write("merged.json", BTreeMap::new(), &config).unwrap();
//!
//! let summary = agc_hist::scale::scale_file(
//!     "merged.json", None, ScaleOptions::default(), &config,
//! ).unwrap();
//! println!("scaled {}, skipped {}", summary.scaled, summary.skipped);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod manifest;
pub mod merge;
pub mod metadata;
pub mod name;
pub mod pseudodata;
pub mod record;
pub mod scale;
pub mod store;

pub use config::{AnalysisConfig, REGIONS};
pub use error::{Error, Result};
pub use ingest::JobResult;
pub use manifest::Manifest;
pub use merge::MergedFile;
pub use metadata::{ProcessMeta, ScalingMetadata};
pub use record::{Bin, HistogramRecord};
pub use scale::{Resolution, ScaleDecision, ScaleOptions, ScaleSummary, ScaleWarning, SkipReason};
pub use store::{ContainerEntry, ContainerReader, ContainerWriter, METADATA_KEY};
