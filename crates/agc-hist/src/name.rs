//! Flat histogram-name codec: `<region>_<process>_<variation>`.
//!
//! Two different parsing rules are in use at two different pipeline stages
//! and they are deliberately NOT mutually inverse:
//!
//! - [`parse_merged_name`] is the merge-time (read) rule: token 1 is the
//!   region, token 2 the process, the rest the variation.
//! - [`parse_scaled_name`] is the scale-time (write) rule: the first token
//!   is a category prefix to strip, a trailing `up`/`down` token is the
//!   variation, and everything in between is the process.
//!
//! For example `4j1b_ttbar_ME_var` parses to `("4j1b", "ttbar", "ME_var")`
//! under the first rule but to process `"ttbar_ME_var"`, variation
//! `"nominal"` under the second. Keep them as two named operations; the
//! divergence is pinned by tests.

/// Variation label used when a name carries no explicit variation suffix.
pub const NOMINAL: &str = "nominal";

/// Parse a merged-container histogram name into `(region, process, variation)`.
///
/// Returns `None` for names with fewer than two `_`-delimited tokens.
pub fn parse_merged_name(name: &str) -> Option<(String, String, String)> {
    let parts: Vec<&str> = name.split('_').collect();
    match parts.len() {
        0 | 1 => None,
        2 => Some((parts[0].to_string(), parts[1].to_string(), NOMINAL.to_string())),
        _ => Some((
            parts[0].to_string(),
            parts[1].to_string(),
            parts[2..].join("_"),
        )),
    }
}

/// Parse a histogram name at scale time into `(process, variation)`.
///
/// The leading token (the region/category, e.g. `4j1b`) is stripped. A
/// trailing `up`/`down` token is the variation; otherwise the variation is
/// `nominal` and the process is everything after the region.
pub fn parse_scaled_name(name: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    let last = parts[parts.len() - 1];
    if matches!(last, "up" | "down") {
        let process = parts[1..parts.len() - 1].join("_");
        Some((process, last.to_string()))
    } else {
        Some((parts[1..].join("_"), NOMINAL.to_string()))
    }
}

/// Shorten a histogram name for merge output.
///
/// Drops the literal `_nominal` substring and truncates at tool-specific
/// trailing suffixes (`_Jet*`, `_Weights*`). Applied once when writing the
/// merged container; never reversed.
pub fn simplify(name: &str) -> String {
    let mut out = name.replace("_nominal", "");
    if let Some(idx) = out.find("_Jet") {
        out.truncate(idx);
    }
    if let Some(idx) = out.find("_Weights") {
        out.truncate(idx);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_name_with_variation() {
        assert_eq!(
            parse_merged_name("4j1b_ttbar_pt_scale_up"),
            Some(("4j1b".into(), "ttbar".into(), "pt_scale_up".into()))
        );
    }

    #[test]
    fn merged_name_two_tokens_is_nominal() {
        assert_eq!(
            parse_merged_name("4j2b_wjets"),
            Some(("4j2b".into(), "wjets".into(), "nominal".into()))
        );
    }

    #[test]
    fn merged_name_single_token_unparseable() {
        assert_eq!(parse_merged_name("pseudodata"), None);
        assert_eq!(parse_merged_name(""), None);
    }

    #[test]
    fn scaled_name_trailing_up_down() {
        assert_eq!(
            parse_scaled_name("4j1b_single_top_tW_pt_scale_up"),
            Some(("single_top_tW_pt_scale".into(), "up".into()))
        );
        assert_eq!(
            parse_scaled_name("4j2b_wjets_scale_var_down"),
            Some(("wjets_scale_var".into(), "down".into()))
        );
    }

    #[test]
    fn scaled_name_without_suffix_is_nominal() {
        assert_eq!(
            parse_scaled_name("4j1b_single_top_tW"),
            Some(("single_top_tW".into(), "nominal".into()))
        );
        assert_eq!(parse_scaled_name("4j2b_ttbar"), Some(("ttbar".into(), "nominal".into())));
    }

    #[test]
    fn scaled_name_too_short() {
        assert_eq!(parse_scaled_name("ttbar"), None);
    }

    // The two rules intentionally disagree on multi-token tails.
    #[test]
    fn merge_and_scale_rules_diverge() {
        let name = "4j1b_ttbar_ME_var";
        let (region, process, variation) = parse_merged_name(name).unwrap();
        assert_eq!((region.as_str(), process.as_str(), variation.as_str()), ("4j1b", "ttbar", "ME_var"));

        let (process, variation) = parse_scaled_name(name).unwrap();
        assert_eq!((process.as_str(), variation.as_str()), ("ttbar_ME_var", "nominal"));
    }

    #[test]
    fn simplify_drops_nominal_and_tool_suffixes() {
        assert_eq!(simplify("4j1b_ttbar_nominal"), "4j1b_ttbar");
        assert_eq!(simplify("4j1b_ttbar_JetPt_var"), "4j1b_ttbar");
        assert_eq!(simplify("4j2b_wjets_Weights_btag_up"), "4j2b_wjets");
        assert_eq!(simplify("4j2b_wjets_scale_var_down"), "4j2b_wjets_scale_var_down");
    }
}
