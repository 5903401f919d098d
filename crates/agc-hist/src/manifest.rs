//! Input manifest (`nanoaod_inputs.json`): per-process, per-variation file
//! lists with event counts.
//!
//! The manifest is the fallback source of event counts when a container
//! carries no `AGC_metadata`, and the source of the `by_process` map
//! embedded at merge time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::metadata::ProcessMeta;
use crate::name::NOMINAL;

#[derive(Debug, Clone, Deserialize)]
struct ManifestFile {
    #[allow(dead_code)]
    path: String,
    #[serde(default)]
    nevts: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct VariationFiles {
    files: Vec<ManifestFile>,
}

/// Parsed input manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    processes: BTreeMap<String, BTreeMap<String, VariationFiles>>,
}

/// Lowercase-alphanumeric normalization used to match process names between
/// the manifest and histogram names.
fn normalize(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).flat_map(|c| c.to_lowercase()).collect()
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        let processes = serde_json::from_str(&data).map_err(|e| {
            Error::Manifest(format!("{}: {e}", path.display()))
        })?;
        Ok(Manifest { processes })
    }

    /// Total event count for `process`, summed over all variations.
    ///
    /// Matches process names after normalization; when nothing matches
    /// exactly, falls back to loose containment (e.g. `ttbar` matching a
    /// `ttbar_ext` sample).
    pub fn total_events(&self, process: &str) -> u64 {
        let target = normalize(process);
        let exact: u64 = self
            .processes
            .iter()
            .filter(|(name, _)| normalize(name) == target)
            .map(|(_, variations)| sum_events(variations))
            .sum();
        if exact > 0 {
            return exact;
        }
        self.processes
            .iter()
            .filter(|(name, _)| normalize(name).contains(&target))
            .map(|(_, variations)| sum_events(variations))
            .sum()
    }

    /// Nominal-variation event count for `process`, if listed.
    pub fn nominal_events(&self, process: &str) -> Option<u64> {
        let variations = self.processes.get(process)?;
        let nominal = variations.get(NOMINAL)?;
        Some(nominal.files.iter().map(|f| f.nevts).sum())
    }

    /// Build the per-process metadata map embedded at merge time.
    ///
    /// Covers every process that appears both in the manifest and in the
    /// cross-section table; `data` and other table-less processes are
    /// omitted (the resolver classifies them before ever consulting
    /// metadata).
    pub fn by_process(&self, config: &AnalysisConfig) -> BTreeMap<String, ProcessMeta> {
        let mut out = BTreeMap::new();
        for process in self.processes.keys() {
            let Some(xsec) = config.xsec(process) else { continue };
            let Some(nevents) = self.nominal_events(process) else { continue };
            out.insert(
                process.clone(),
                ProcessMeta {
                    variation: NOMINAL.to_string(),
                    nevents: nevents as f64,
                    xsec,
                },
            );
        }
        out
    }
}

fn sum_events(variations: &BTreeMap<String, VariationFiles>) -> u64 {
    variations
        .values()
        .flat_map(|v| v.files.iter())
        .map(|f| f.nevts)
        .sum()
}
