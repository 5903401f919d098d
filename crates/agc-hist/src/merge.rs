//! Merging partial shard outputs into one consolidated container.
//!
//! Shards are disjoint by construction, so merging is concatenation in
//! first-seen order: records sharing a name are NOT summed (that would be
//! statistics accumulation, a different operation). A cross-shard name
//! collision is a caller error and both records are kept.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::metadata::{self, ProcessMeta, ScalingMetadata};
use crate::name::simplify;
use crate::pseudodata;
use crate::record::HistogramRecord;
use crate::store::{ContainerReader, ContainerWriter};

/// All histogram records destined for one merged container.
#[derive(Debug, Clone, Default)]
pub struct MergedFile {
    /// Records in first-seen order, names already simplified.
    pub records: Vec<HistogramRecord>,
}

/// Read every source fully and concatenate their histograms.
///
/// Any unreadable source is fatal; there is no partial merge. Names are
/// simplified (the `_nominal` / `_Jet*` / `_Weights*` rule) here, once.
pub fn merge<P: AsRef<Path>>(sources: &[P]) -> Result<MergedFile> {
    let mut records = Vec::new();
    for source in sources {
        let reader = ContainerReader::open(source)?;
        let mut batch = reader.histograms();
        tracing::info!(
            path = %reader.path().display(),
            histograms = batch.len(),
            "merging source"
        );
        for record in &mut batch {
            let short = simplify(&record.name);
            if short != record.name {
                record.rename(short);
            }
        }
        records.extend(batch);
    }
    Ok(MergedFile { records })
}

impl MergedFile {
    /// Write the merged container: all records, synthesized pseudodata,
    /// and the metadata blob, committed atomically.
    ///
    /// `by_process` carries per-process event counts (typically from the
    /// input manifest) to embed for the later scaling pass; pass an empty
    /// map when unavailable.
    pub fn write(
        &self,
        dest: impl AsRef<Path>,
        by_process: BTreeMap<String, ProcessMeta>,
        config: &AnalysisConfig,
    ) -> Result<()> {
        let mut writer = ContainerWriter::create(&dest);

        let mut names = Vec::with_capacity(self.records.len());
        let mut integrals = BTreeMap::new();
        for record in &self.records {
            writer.write_record(record);
            names.push(record.name.clone());
            integrals.insert(record.name.clone(), Some(record.integral));
        }

        // Pseudodata is synthesized after the name list is frozen, so it is
        // intentionally absent from the metadata bookkeeping.
        for pseudo in pseudodata::synthesize(&self.records) {
            tracing::info!(name = %pseudo.name, "synthesized pseudodata");
            writer.write_record(&pseudo);
        }

        let meta = ScalingMetadata {
            histogram_names: names,
            integrals,
            lumi: config.lumi,
            by_process,
        };
        match metadata::encode(&meta) {
            Ok(blob) => writer.write_metadata_json(&blob),
            // Metadata is a cross-check channel; a failed encode must not
            // sink the merge itself.
            Err(e) => tracing::warn!(error = %e, "could not encode AGC_metadata"),
        }

        writer.commit()?;
        tracing::info!(path = %dest.as_ref().display(), histograms = self.records.len(), "wrote merged container");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Bin;
    use crate::store::ContainerEntry;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_path(filename: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let mut p = std::env::temp_dir();
        p.push(format!("agc_hist_merge_{}_{}_{}", std::process::id(), nanos, filename));
        p
    }

    fn record(name: &str, values: &[f64]) -> HistogramRecord {
        let bins = values.iter().map(|&v| Bin { value: v, error: v.sqrt() }).collect();
        HistogramRecord::from_bins(name, bins).unwrap()
    }

    fn shard(path: &PathBuf, records: &[HistogramRecord]) {
        let mut w = ContainerWriter::create(path);
        for r in records {
            w.write_record(r);
        }
        w.commit().unwrap();
    }

    #[test]
    fn disjoint_shards_concatenate_in_order() {
        let a = tmp_path("shard_a.json");
        let b = tmp_path("shard_b.json");
        shard(&a, &[record("4j1b_ttbar", &[1.0, 2.0])]);
        shard(&b, &[record("4j2b_wjets", &[3.0]), record("4j2b_ttbar", &[4.0])]);

        let merged = merge(&[&a, &b]).unwrap();
        let names: Vec<&str> = merged.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["4j1b_ttbar", "4j2b_wjets", "4j2b_ttbar"]);
        assert_eq!(merged.records[0].bins, vec![
            Bin { value: 1.0, error: 1.0 },
            Bin { value: 2.0, error: 2.0_f64.sqrt() },
        ]);

        std::fs::remove_file(&a).unwrap();
        std::fs::remove_file(&b).unwrap();
    }

    // Shard merge, not statistics accumulation: a shared name keeps both
    // records, it never sums them.
    #[test]
    fn name_collision_keeps_both_records() {
        let a = tmp_path("coll_a.json");
        let b = tmp_path("coll_b.json");
        shard(&a, &[record("4j1b_ttbar", &[1.0]), record("4j1b_wjets", &[2.0])]);
        shard(&b, &[record("4j1b_ttbar", &[10.0])]);

        let merged = merge(&[&a, &b]).unwrap();
        assert_eq!(merged.records.len(), 3);
        let ttbar: Vec<f64> = merged
            .records
            .iter()
            .filter(|r| r.name == "4j1b_ttbar")
            .map(|r| r.bins[0].value)
            .collect();
        assert_eq!(ttbar, vec![1.0, 10.0]);

        std::fs::remove_file(&a).unwrap();
        std::fs::remove_file(&b).unwrap();
    }

    #[test]
    fn unreadable_source_fails_whole_merge() {
        let a = tmp_path("ok.json");
        shard(&a, &[record("4j1b_ttbar", &[1.0])]);
        let missing = tmp_path("missing.json");
        assert!(merge(&[&a, &missing]).is_err());
        std::fs::remove_file(&a).unwrap();
    }

    #[test]
    fn merge_simplifies_names_once() {
        let a = tmp_path("simplify.json");
        shard(&a, &[record("4j1b_ttbar_nominal", &[1.0]), record("4j1b_ttbar_JetPt_up", &[2.0])]);
        let merged = merge(&[&a]).unwrap();
        let names: Vec<&str> = merged.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["4j1b_ttbar", "4j1b_ttbar"]);
        std::fs::remove_file(&a).unwrap();
    }

    #[test]
    fn write_appends_pseudodata_and_metadata() {
        let out = tmp_path("merged.json");
        let merged = MergedFile {
            records: vec![
                record("4j1b_wjets", &[10.0, 20.0]),
                record("4j1b_ttbar_ME_var", &[2.0, 4.0]),
                record("4j1b_ttbar_PS_var", &[4.0, 6.0]),
            ],
        };
        merged.write(&out, BTreeMap::new(), &AnalysisConfig::default()).unwrap();

        let reader = ContainerReader::open(&out).unwrap();
        let hists = reader.histograms();
        assert_eq!(hists.len(), 4);
        assert_eq!(hists[3].name, "4j1b_pseudodata");
        assert_eq!(hists[3].bins[0].value, 13.0);
        assert_eq!(hists[3].bins[1].value, 25.0);

        let meta = crate::metadata::decode(reader.metadata_json().unwrap()).unwrap();
        assert_eq!(meta.lumi, 3378.0);
        // pseudodata is excluded from the frozen name list
        assert_eq!(meta.histogram_names.len(), 3);
        assert!(!meta.histogram_names.iter().any(|n| n.contains("pseudodata")));
        assert_eq!(meta.integrals["4j1b_wjets"], Some(30.0));

        let metadata_last = matches!(reader.entries().last().unwrap(), ContainerEntry::Metadata(_));
        assert!(metadata_last);

        std::fs::remove_file(&out).unwrap();
    }
}
