//! Scale-factor resolution and the per-file scaling pass.
//!
//! Each histogram is brought to its expected physical yield
//! `target = xsec * lumi`. The factor comes from the first applicable
//! source of truth:
//!
//! 1. unparseable name -> copy unscaled (warn)
//! 2. process absent from the cross-section table -> copy unscaled (warn)
//! 3. metadata event count `nevents > 0` -> `target / nevents`
//! 4. zero or negative integral -> copy unscaled (informational)
//! 5. integral already within 2% of target -> copy unscaled
//!    (idempotence guard: a re-run must not drift an already-normalized
//!    histogram)
//! 6. otherwise `target / integral`
//!
//! No branch raises; recoverable conditions surface as structured
//! [`ScaleWarning`] records and the caller decides their severity.

use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::metadata::{self, ScalingMetadata};
use crate::name::parse_scaled_name;
use crate::store::{ContainerEntry, ContainerReader, ContainerWriter};

/// Relative tolerance of the idempotence guard.
const NEAR_TARGET_TOLERANCE: f64 = 0.02;

/// Why a histogram was copied without scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Name does not parse under the scale-time rule.
    UnparseableName,
    /// Process has no cross-section entry.
    UnknownProcess,
    /// Integral is zero or negative; no ratio can be formed.
    ZeroIntegral,
    /// Integral is already within tolerance of the target yield.
    AlreadyAtTarget,
}

impl SkipReason {
    /// Stable identifier used in logs and summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::UnparseableName => "unparseable_name",
            SkipReason::UnknownProcess => "unknown_process",
            SkipReason::ZeroIntegral => "zero_integral",
            SkipReason::AlreadyAtTarget => "already_at_target",
        }
    }

    /// Whether this condition is warning-level (as opposed to informational).
    pub fn is_warning(self) -> bool {
        matches!(self, SkipReason::UnparseableName | SkipReason::UnknownProcess)
    }
}

/// Outcome of resolving one histogram.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleDecision {
    /// Multiply bin contents and errors by this factor.
    Scale(f64),
    /// Copy the histogram through unchanged.
    CopyUnscaled(SkipReason),
}

/// Structured record of a recoverable condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleWarning {
    /// Condition kind.
    pub kind: SkipReason,
    /// Histogram the condition applies to.
    pub histogram_name: String,
    /// Human-readable numeric context.
    pub detail: String,
}

/// A decision plus its warning, when one applies.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// What to do with the histogram.
    pub decision: ScaleDecision,
    /// Present on every copy-unscaled branch.
    pub warning: Option<ScaleWarning>,
}

impl Resolution {
    fn scale(factor: f64) -> Self {
        Resolution { decision: ScaleDecision::Scale(factor), warning: None }
    }

    fn skip(kind: SkipReason, histogram_name: &str, detail: String) -> Self {
        Resolution {
            decision: ScaleDecision::CopyUnscaled(kind),
            warning: Some(ScaleWarning {
                kind,
                histogram_name: histogram_name.to_string(),
                detail,
            }),
        }
    }
}

/// Resolve the scale factor for one histogram.
///
/// `metadata`, when present, wins over the integral ratio: the event count
/// recorded at merge time is the authoritative denominator even when both
/// are computable.
pub fn resolve(
    hist_name: &str,
    integral: f64,
    metadata: Option<&ScalingMetadata>,
    config: &AnalysisConfig,
) -> Resolution {
    let Some((process, _variation)) = parse_scaled_name(hist_name) else {
        return Resolution::skip(
            SkipReason::UnparseableName,
            hist_name,
            "name has fewer than two tokens".to_string(),
        );
    };

    let Some(target) = config.target(&process) else {
        return Resolution::skip(
            SkipReason::UnknownProcess,
            hist_name,
            format!("process '{process}' has no cross-section entry"),
        );
    };

    if let Some(nevents) = metadata.and_then(|m| m.nevents(&process)) {
        return Resolution::scale(target / nevents);
    }

    if integral <= 0.0 {
        return Resolution::skip(
            SkipReason::ZeroIntegral,
            hist_name,
            format!("integral={integral:.6}"),
        );
    }

    let rel_diff = (integral - target).abs() / target;
    if rel_diff < NEAR_TARGET_TOLERANCE {
        return Resolution::skip(
            SkipReason::AlreadyAtTarget,
            hist_name,
            format!("integral={integral:.6} target={target:.6} rel_diff={rel_diff:.4}"),
        );
    }

    Resolution::scale(target / integral)
}

/// Options for a scaling pass.
#[derive(Debug, Clone, Copy)]
pub struct ScaleOptions {
    /// Report decisions without writing anything.
    pub dry_run: bool,
    /// Replace the input file; when false, write a `_scaled` sibling.
    pub overwrite: bool,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        ScaleOptions { dry_run: false, overwrite: true }
    }
}

/// Per-file outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleSummary {
    /// Histograms a scale factor was (or, in a dry run, would be) applied to.
    pub scaled: usize,
    /// Histograms copied through unscaled.
    pub skipped: usize,
}

/// Destination for a non-overwriting scale pass: `merged.json` ->
/// `merged_scaled.json`.
pub fn scaled_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => path.with_file_name(format!("{stem}_scaled.{ext}")),
        None => path.with_file_name(format!("{stem}_scaled")),
    }
}

fn emit(warning: &ScaleWarning) {
    if warning.kind.is_warning() {
        tracing::warn!(
            kind = warning.kind.as_str(),
            histogram = %warning.histogram_name,
            detail = %warning.detail,
            "copying histogram unscaled"
        );
    } else {
        tracing::info!(
            kind = warning.kind.as_str(),
            histogram = %warning.histogram_name,
            detail = %warning.detail,
            "copying histogram unscaled"
        );
    }
}

/// Scale every histogram in one container file.
///
/// Precedence for the event-count metadata: the container's own
/// `AGC_metadata` entry first (a decode failure is downgraded to "absent"
/// with a warning), then `fallback` (typically built from the input
/// manifest). Non-histogram entries and the metadata entry itself are
/// copied through verbatim. The output is committed atomically; a dry run
/// writes nothing at all.
pub fn scale_file(
    path: impl AsRef<Path>,
    fallback: Option<&ScalingMetadata>,
    options: ScaleOptions,
    config: &AnalysisConfig,
) -> Result<ScaleSummary> {
    let path = path.as_ref();
    let reader = ContainerReader::open(path)?;

    let container_meta = reader.metadata_json().and_then(|s| match metadata::decode(s) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "ignoring undecodable AGC_metadata, falling back to integral ratios"
            );
            None
        }
    });
    let meta = container_meta.as_ref().or(fallback);

    let dest = if options.overwrite { path.to_path_buf() } else { scaled_sibling(path) };
    let mut writer = ContainerWriter::create(&dest);
    let mut summary = ScaleSummary::default();

    for entry in reader.entries() {
        match entry {
            ContainerEntry::Histogram(h) => {
                let resolution = resolve(&h.name, h.integral(), meta, config);
                if let Some(warning) = &resolution.warning {
                    emit(warning);
                }
                match resolution.decision {
                    ScaleDecision::Scale(factor) => {
                        summary.scaled += 1;
                        if options.dry_run {
                            tracing::info!(
                                histogram = %h.name,
                                current = h.integral(),
                                factor,
                                "dry-run: would scale"
                            );
                        } else {
                            tracing::debug!(histogram = %h.name, factor, "scaling");
                            writer.write_raw(h.scaled_raw(factor));
                        }
                    }
                    ScaleDecision::CopyUnscaled(_) => {
                        summary.skipped += 1;
                        writer.write_raw(h.raw().clone());
                    }
                }
            }
            ContainerEntry::Metadata(s) => writer.write_metadata_json(s),
            ContainerEntry::Other(v) => writer.write_raw(v.clone()),
        }
    }

    if options.dry_run {
        tracing::info!(
            path = %path.display(),
            scaled = summary.scaled,
            skipped = summary.skipped,
            "dry-run complete, nothing written"
        );
        return Ok(summary);
    }

    writer.commit()?;
    tracing::info!(
        path = %dest.display(),
        scaled = summary.scaled,
        skipped = summary.skipped,
        "wrote scaled container"
    );
    Ok(summary)
}
