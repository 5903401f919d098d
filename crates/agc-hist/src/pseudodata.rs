//! Pseudodata synthesis: fixed linear combinations of merged histograms.
//!
//! `<region>_pseudodata = wjets + 0.5 * ttbar_ME_var + 0.5 * ttbar_PS_var`,
//! computed bin-wise with errors propagated as the matching combination of
//! variances. A region missing any of its three inputs is skipped without a
//! warning; that silence is longstanding pipeline behavior that downstream
//! consumers rely on, so it is preserved (and pinned by a test) rather than
//! upgraded to a diagnostic.

use crate::config::REGIONS;
use crate::record::{Bin, HistogramRecord};

fn find<'a>(records: &'a [HistogramRecord], name: &str) -> Option<&'a HistogramRecord> {
    records.iter().find(|r| r.name == name)
}

fn combine(wjets: &HistogramRecord, me: &HistogramRecord, ps: &HistogramRecord, region: &str) -> Option<HistogramRecord> {
    if wjets.bins.len() != me.bins.len() || wjets.bins.len() != ps.bins.len() {
        tracing::warn!(
            region,
            "pseudodata inputs have mismatched bin counts; skipping region"
        );
        return None;
    }
    let bins: Vec<Bin> = wjets
        .bins
        .iter()
        .zip(me.bins.iter().zip(ps.bins.iter()))
        .map(|(w, (m, p))| {
            let value = w.value + 0.5 * m.value + 0.5 * p.value;
            let variance = w.error * w.error
                + 0.25 * m.error * m.error
                + 0.25 * p.error * p.error;
            Bin { value, error: variance.sqrt() }
        })
        .collect();
    HistogramRecord::from_bins(&format!("{region}_pseudodata"), bins)
}

/// Synthesize pseudodata histograms for every region whose three inputs
/// (`<r>_wjets`, `<r>_ttbar_ME_var`, `<r>_ttbar_PS_var`) are all present.
pub fn synthesize(records: &[HistogramRecord]) -> Vec<HistogramRecord> {
    let mut out = Vec::new();
    for region in REGIONS {
        let wjets = find(records, &format!("{region}_wjets"));
        let me = find(records, &format!("{region}_ttbar_ME_var"));
        let ps = find(records, &format!("{region}_ttbar_PS_var"));
        if let (Some(wjets), Some(me), Some(ps)) = (wjets, me, ps) {
            if let Some(pseudo) = combine(wjets, me, ps, region) {
                out.push(pseudo);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, values: &[f64], errors: &[f64]) -> HistogramRecord {
        let bins = values
            .iter()
            .zip(errors)
            .map(|(&value, &error)| Bin { value, error })
            .collect();
        HistogramRecord::from_bins(name, bins).unwrap()
    }

    #[test]
    fn linear_combination_of_bin_contents() {
        let records = vec![
            record("4j1b_wjets", &[10.0, 20.0], &[1.0, 1.0]),
            record("4j1b_ttbar_ME_var", &[2.0, 4.0], &[1.0, 1.0]),
            record("4j1b_ttbar_PS_var", &[4.0, 6.0], &[1.0, 1.0]),
        ];
        let out = synthesize(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "4j1b_pseudodata");
        assert_eq!(out[0].bins[0].value, 13.0);
        assert_eq!(out[0].bins[1].value, 25.0);
        assert!((out[0].integral - 38.0).abs() < 1e-12);
    }

    #[test]
    fn error_propagation_combines_variances() {
        let records = vec![
            record("4j2b_wjets", &[0.0], &[3.0]),
            record("4j2b_ttbar_ME_var", &[0.0], &[4.0]),
            record("4j2b_ttbar_PS_var", &[0.0], &[2.0]),
        ];
        let out = synthesize(&records);
        // var = 9 + 0.25*16 + 0.25*4 = 14
        assert!((out[0].bins[0].error - 14.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn regions_are_independent() {
        let mut records = vec![
            record("4j1b_wjets", &[1.0], &[1.0]),
            record("4j1b_ttbar_ME_var", &[1.0], &[1.0]),
            record("4j1b_ttbar_PS_var", &[1.0], &[1.0]),
            record("4j2b_wjets", &[1.0], &[1.0]),
            record("4j2b_ttbar_ME_var", &[1.0], &[1.0]),
        ];
        // 4j2b is missing its PS_var input: only 4j1b fires.
        let out = synthesize(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "4j1b_pseudodata");

        records.push(record("4j2b_ttbar_PS_var", &[1.0], &[1.0]));
        assert_eq!(synthesize(&records).len(), 2);
    }

    // Known gap, preserved deliberately: a region with partially present
    // inputs is skipped with no warning and no error, so upstream data loss
    // is invisible here.
    #[test]
    fn partial_inputs_skip_silently() {
        let records = vec![record("4j1b_wjets", &[1.0], &[1.0])];
        assert!(synthesize(&records).is_empty());
        assert!(synthesize(&[]).is_empty());
    }
}
