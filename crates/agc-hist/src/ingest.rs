//! Post-processing of raw analysis-job results into named records.
//!
//! A job produces either a single histogram or a map of systematic
//! variations booked under one nominal histogram. The shape is decided
//! once at ingestion by constructing the right [`JobResult`] variant;
//! nothing downstream re-detects it.

use crate::record::{Bin, HistogramRecord};

/// One raw result from the analysis job.
#[derive(Debug, Clone)]
pub enum JobResult {
    /// A single, already-named histogram.
    Single(HistogramRecord),
    /// Varied histograms produced under one nominal booking.
    VariationMap {
        /// Name of the nominal booking; contains the substring `nominal`.
        nominal_name: String,
        /// Variation key (e.g. `weights:pt_scale_up`) paired with bins,
        /// in booking order.
        variations: Vec<(String, Vec<Bin>)>,
    },
}

/// Variation label: the text after the last `:` of the map key (the varied
/// column prefix before it is always `weights`).
fn variation_label(key: &str) -> &str {
    key.rsplit(':').next().unwrap_or(key)
}

/// Flatten job results into histogram records.
///
/// Each entry of a variation map becomes its own record, named by
/// substituting the variation label for `nominal` in the booking name.
pub fn postprocess(results: Vec<JobResult>) -> Vec<HistogramRecord> {
    let mut out = Vec::new();
    for result in results {
        match result {
            JobResult::Single(record) => out.push(record),
            JobResult::VariationMap { nominal_name, variations } => {
                for (key, bins) in variations {
                    let label = variation_label(&key);
                    let name = nominal_name.replace("nominal", label);
                    match HistogramRecord::from_bins(&name, bins) {
                        Some(record) => out.push(record),
                        None => {
                            tracing::debug!(name = %name, "dropping variation with unparseable name");
                        }
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins(values: &[f64]) -> Vec<Bin> {
        values.iter().map(|&v| Bin { value: v, error: v.sqrt() }).collect()
    }

    #[test]
    fn single_results_pass_through() {
        let record = HistogramRecord::from_bins("4j1b_ttbar", bins(&[1.0])).unwrap();
        let out = postprocess(vec![JobResult::Single(record.clone())]);
        assert_eq!(out, vec![record]);
    }

    #[test]
    fn variation_map_expands_and_renames() {
        let out = postprocess(vec![JobResult::VariationMap {
            nominal_name: "4j1b_ttbar_nominal".to_string(),
            variations: vec![
                ("weights:nominal".to_string(), bins(&[1.0])),
                ("weights:pt_scale_up".to_string(), bins(&[2.0])),
                ("weights:pt_scale_down".to_string(), bins(&[3.0])),
            ],
        }]);
        let names: Vec<&str> = out.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["4j1b_ttbar_nominal", "4j1b_ttbar_pt_scale_up", "4j1b_ttbar_pt_scale_down"]
        );
        assert_eq!(out[1].variation, "pt_scale_up");
    }

    #[test]
    fn label_is_text_after_last_colon() {
        assert_eq!(variation_label("weights:btag_var_0_up"), "btag_var_0_up");
        assert_eq!(variation_label("plain"), "plain");
    }
}
