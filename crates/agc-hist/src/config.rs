//! Analysis-wide constants: cross-section table and integrated luminosity.
//!
//! The resolver and the metadata writer must agree on `target = xsec * lumi`,
//! so both take the same [`AnalysisConfig`] by reference. There is no
//! module-level mutable state.

use std::collections::BTreeMap;

/// The two analysis regions histograms are grouped under.
pub const REGIONS: [&str; 2] = ["4j1b", "4j2b"];

/// Cross-section table plus integrated luminosity.
///
/// Every process that can appear in a merged container either has an entry
/// here or is classified `unknown_process` by the resolver; there is no
/// silent default.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    xsec: BTreeMap<String, f64>,
    /// Integrated luminosity in inverse picobarns.
    pub lumi: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let mut xsec = BTreeMap::new();
        xsec.insert("ttbar".to_string(), 396.87 + 332.97);
        xsec.insert("single_top_s_chan".to_string(), 2.0268 + 1.2676);
        xsec.insert("single_top_t_chan".to_string(), (36.993 + 22.175) / 0.252);
        xsec.insert("single_top_tW".to_string(), 37.936 + 37.906);
        xsec.insert("wjets".to_string(), 61457.0 * 0.252);
        xsec.insert("zprimet".to_string(), 700.0);
        AnalysisConfig { xsec, lumi: 3378.0 }
    }
}

impl AnalysisConfig {
    /// Cross-section in picobarns for `process`, if known.
    pub fn xsec(&self, process: &str) -> Option<f64> {
        self.xsec.get(process).copied()
    }

    /// Expected yield `xsec * lumi` for `process`, if known.
    pub fn target(&self, process: &str) -> Option<f64> {
        self.xsec(process).map(|x| x * self.lumi)
    }

    /// Iterate over the known processes in table order.
    pub fn processes(&self) -> impl Iterator<Item = &str> {
        self.xsec.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttbar_target_matches_table() {
        let cfg = AnalysisConfig::default();
        assert!((cfg.xsec("ttbar").unwrap() - 729.84).abs() < 1e-9);
        assert!((cfg.target("ttbar").unwrap() - 729.84 * 3378.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_process_has_no_target() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.xsec("data"), None);
        assert_eq!(cfg.target("data"), None);
    }
}
