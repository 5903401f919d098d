//! Container file access: an ordered collection of named histogram entries
//! plus at most one string-valued `AGC_metadata` entry.
//!
//! The on-disk format is a JSON document:
//!
//! ```json
//! {
//!   "entries": [
//!     {"name": "4j1b_ttbar", "class": "TH1D",
//!      "bin_content": [1.0, 2.0], "bin_errors": [1.0, 1.4]},
//!     {"name": "AGC_metadata", "class": "TObjString", "value": "{...}"}
//!   ]
//! }
//! ```
//!
//! Entries are classified exactly once at ingestion into [`ContainerEntry`];
//! anything that is neither a histogram (`class` starting with `TH1`) nor
//! the metadata string is opaque and preserved verbatim on write.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::record::{Bin, HistogramRecord};

/// Name of the container entry holding the metadata blob.
pub const METADATA_KEY: &str = "AGC_metadata";

/// A histogram entry as stored in a container, identity not yet parsed.
#[derive(Debug, Clone)]
pub struct HistEntry {
    /// Entry name (the flat histogram name).
    pub name: String,
    /// Bin contents and errors.
    pub bins: Vec<Bin>,
    raw: Value,
}

impl HistEntry {
    /// Sum of bin contents.
    pub fn integral(&self) -> f64 {
        self.bins.iter().map(|b| b.value).sum()
    }

    /// The stored JSON value, unmodified.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// A copy of the stored value with bin contents and errors multiplied
    /// by `factor`. Other fields (class, title, ...) are preserved.
    pub fn scaled_raw(&self, factor: f64) -> Value {
        let mut out = self.raw.clone();
        // raw is always an object: classification only accepts objects
        if let Some(obj) = out.as_object_mut() {
            let content: Vec<Value> =
                self.bins.iter().map(|b| json!(b.value * factor)).collect();
            let errors: Vec<Value> =
                self.bins.iter().map(|b| json!(b.error * factor)).collect();
            obj.insert("bin_content".to_string(), Value::Array(content));
            obj.insert("bin_errors".to_string(), Value::Array(errors));
        }
        out
    }
}

/// A container entry, classified once at read time.
#[derive(Debug, Clone)]
pub enum ContainerEntry {
    /// A histogram (`class` starts with `TH1`).
    Histogram(HistEntry),
    /// The `AGC_metadata` string entry, undecoded.
    Metadata(String),
    /// Anything else, passed through verbatim.
    Other(Value),
}

fn f64_array(obj: &serde_json::Map<String, Value>, field: &str, name: &str) -> Result<Vec<f64>> {
    let arr = obj
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Validation(format!("histogram '{name}': missing {field} array")))?;
    arr.iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                Error::Validation(format!("histogram '{name}': non-numeric {field} element"))
            })
        })
        .collect()
}

fn classify(value: Value) -> Result<ContainerEntry> {
    let Some(obj) = value.as_object() else {
        return Ok(ContainerEntry::Other(value));
    };
    let name = obj.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    let class = obj.get("class").and_then(Value::as_str).unwrap_or_default();

    if name == METADATA_KEY {
        if let Some(s) = obj.get("value").and_then(Value::as_str) {
            return Ok(ContainerEntry::Metadata(s.to_string()));
        }
        return Ok(ContainerEntry::Other(value));
    }

    if class.starts_with("TH1") {
        let content = f64_array(obj, "bin_content", &name)?;
        let errors = f64_array(obj, "bin_errors", &name)?;
        if content.len() != errors.len() {
            return Err(Error::Validation(format!(
                "histogram '{name}': bin_content has {} bins but bin_errors has {}",
                content.len(),
                errors.len()
            )));
        }
        let bins = content
            .into_iter()
            .zip(errors)
            .map(|(value, error)| Bin { value, error })
            .collect();
        return Ok(ContainerEntry::Histogram(HistEntry { name, bins, raw: value }));
    }

    Ok(ContainerEntry::Other(value))
}

/// Read handle over a container file.
#[derive(Debug)]
pub struct ContainerReader {
    path: PathBuf,
    entries: Vec<ContainerEntry>,
}

impl ContainerReader {
    /// Open and fully parse a container. Missing or unreadable files yield
    /// [`Error::Io`]; files that are not a container yield [`Error::Corrupt`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = fs::read_to_string(&path)?;
        let doc: Value = serde_json::from_str(&data).map_err(|source| Error::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        let raw_entries = doc
            .get("entries")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Validation(format!(
                "{}: container has no 'entries' array",
                path.display()
            )))?;
        let entries = raw_entries
            .iter()
            .cloned()
            .map(classify)
            .collect::<Result<Vec<_>>>()?;
        Ok(ContainerReader { path, entries })
    }

    /// Path this reader was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in container order.
    pub fn entries(&self) -> &[ContainerEntry] {
        &self.entries
    }

    /// Histogram records in container order.
    ///
    /// Histograms whose name does not parse under the merge-time rule are
    /// dropped here (they cannot carry an identity); pass-through of such
    /// entries is the scaler's job, which iterates [`Self::entries`].
    pub fn histograms(&self) -> Vec<HistogramRecord> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                ContainerEntry::Histogram(h) => {
                    let rec = HistogramRecord::from_bins(&h.name, h.bins.clone());
                    if rec.is_none() {
                        tracing::debug!(name = %h.name, "skipping histogram with unparseable name");
                    }
                    rec
                }
                _ => None,
            })
            .collect()
    }

    /// The raw metadata string, if the container has one.
    pub fn metadata_json(&self) -> Option<&str> {
        self.entries.iter().find_map(|e| match e {
            ContainerEntry::Metadata(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

/// Write handle accumulating entries for one container.
///
/// Nothing touches the destination until [`commit`](Self::commit): the
/// document is first written to a `.tmp` sibling and atomically renamed
/// over the destination, so a failed write never leaves a partial file
/// visible under the final name.
#[derive(Debug)]
pub struct ContainerWriter {
    dest: PathBuf,
    entries: Vec<Value>,
}

impl ContainerWriter {
    /// Start a new container targeting `dest`.
    pub fn create(dest: impl AsRef<Path>) -> Self {
        ContainerWriter { dest: dest.as_ref().to_path_buf(), entries: Vec::new() }
    }

    /// Append a histogram record as a `TH1D` entry.
    pub fn write_record(&mut self, record: &HistogramRecord) {
        let content: Vec<Value> = record.bins.iter().map(|b| json!(b.value)).collect();
        let errors: Vec<Value> = record.bins.iter().map(|b| json!(b.error)).collect();
        self.entries.push(json!({
            "name": record.name,
            "class": "TH1D",
            "bin_content": content,
            "bin_errors": errors,
        }));
    }

    /// Append an arbitrary entry verbatim.
    pub fn write_raw(&mut self, value: Value) {
        self.entries.push(value);
    }

    /// Append the metadata blob as the `AGC_metadata` string entry.
    pub fn write_metadata_json(&mut self, metadata_json: &str) {
        self.entries.push(json!({
            "name": METADATA_KEY,
            "class": "TObjString",
            "value": metadata_json,
        }));
    }

    /// Serialize to a temp sibling and atomically rename onto the
    /// destination. The temp file is removed on any failure.
    pub fn commit(self) -> Result<()> {
        let tmp = tmp_sibling(&self.dest);
        let doc = json!({ "entries": self.entries });
        let body = serde_json::to_string_pretty(&doc)
            .map_err(|e| Error::Validation(format!("serializing container: {e}")))?;
        if let Err(e) = fs::write(&tmp, body) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.dest) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn tmp_sibling(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}
