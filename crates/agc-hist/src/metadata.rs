//! The `AGC_metadata` JSON blob attached to merged containers.
//!
//! Metadata is an optimization/cross-check channel: the resolver prefers its
//! per-process event counts over integral ratios, but merging and scaling
//! stay correct without it. Decode failures are therefore recoverable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-process bookkeeping embedded at merge time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMeta {
    /// Variation the event count was taken from (normally `nominal`).
    pub variation: String,
    /// Total generated events for the process; `0` disables the
    /// metadata-driven scaling path for it.
    #[serde(default)]
    pub nevents: f64,
    /// Cross-section in picobarns, copied from the analysis config.
    pub xsec: f64,
}

/// Metadata record describing one merged container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingMetadata {
    /// Histogram names in write order (pseudodata excluded; it is
    /// synthesized after this list is frozen).
    pub histogram_names: Vec<String>,
    /// Integral per histogram name; `null` when it could not be computed.
    pub integrals: BTreeMap<String, Option<f64>>,
    /// Integrated luminosity the targets were computed against.
    pub lumi: f64,
    /// Per-process event counts and cross-sections.
    #[serde(default)]
    pub by_process: BTreeMap<String, ProcessMeta>,
}

impl ScalingMetadata {
    /// Event count for `process`, if present and positive.
    pub fn nevents(&self, process: &str) -> Option<f64> {
        self.by_process
            .get(process)
            .map(|m| m.nevents)
            .filter(|&n| n > 0.0)
    }
}

/// Serialize metadata to the JSON string stored in the container.
pub fn encode(meta: &ScalingMetadata) -> Result<String> {
    serde_json::to_string(meta).map_err(Error::MetadataDecode)
}

/// Deserialize the container metadata string.
///
/// Malformed input yields [`Error::MetadataDecode`]; callers are free to
/// treat that as absent metadata.
pub fn decode(s: &str) -> Result<ScalingMetadata> {
    serde_json::from_str(s).map_err(Error::MetadataDecode)
}
