//! In-memory histogram record.

use crate::name;

/// One histogram bin: content plus statistical error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Bin content.
    pub value: f64,
    /// Statistical error on the content.
    pub error: f64,
}

/// A named histogram with its parsed identity.
///
/// `region`/`process`/`variation` are derived from `name` via the
/// merge-time parsing rule. Records are owned by whichever component holds
/// them; transformations clone before mutating.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramRecord {
    /// Canonical flat name, `<region>_<process>_<variation>`.
    pub name: String,
    /// Analysis selection category.
    pub region: String,
    /// Physical process label.
    pub process: String,
    /// Systematic variation label (`nominal` when elided from the name).
    pub variation: String,
    /// Ordered bin contents and errors.
    pub bins: Vec<Bin>,
    /// Sum over all bin contents.
    pub integral: f64,
}

impl HistogramRecord {
    /// Build a record from a flat name and bin arrays.
    ///
    /// Returns `None` when the name does not parse under the merge-time
    /// rule (fewer than two tokens).
    pub fn from_bins(hist_name: &str, bins: Vec<Bin>) -> Option<Self> {
        let (region, process, variation) = name::parse_merged_name(hist_name)?;
        let integral = bins.iter().map(|b| b.value).sum();
        Some(HistogramRecord {
            name: hist_name.to_string(),
            region,
            process,
            variation,
            bins,
            integral,
        })
    }

    /// Multiply every bin content and error by `factor`, updating the integral.
    pub fn scale(&mut self, factor: f64) {
        for bin in &mut self.bins {
            bin.value *= factor;
            bin.error *= factor;
        }
        self.integral *= factor;
    }

    /// Rename the record, re-deriving region/process/variation.
    ///
    /// Keeps the old identity fields when the new name does not parse
    /// (simplified names can drop below two tokens).
    pub fn rename(&mut self, new_name: String) {
        if let Some((region, process, variation)) = name::parse_merged_name(&new_name) {
            self.region = region;
            self.process = process;
            self.variation = variation;
        }
        self.name = new_name;
    }
}
