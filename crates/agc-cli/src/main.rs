//! agcpost CLI

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use agc_hist::{merge, scale, AnalysisConfig, Manifest, ScaleOptions, ScalingMetadata};

#[derive(Parser)]
#[command(name = "agcpost")]
#[command(about = "AGC histogram post-processing: merge shards, normalize yields")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    /// Shorthand for --log-level info
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge partial shard containers into one consolidated container
    Merge {
        /// Shard container files, in merge order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output container path
        #[arg(short, long)]
        output: PathBuf,

        /// Input manifest (nanoaod_inputs.json); per-process event counts
        /// are embedded as AGC_metadata for the later scaling pass
        #[arg(long)]
        inputs_json: Option<PathBuf>,
    },

    /// Scale merged containers so each histogram integrates to xsec * lumi
    Scale {
        /// Merged container files to scale
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Report scale decisions without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Do not replace the input file; write a `_scaled` sibling instead
        #[arg(long = "no-overwrite", default_value_t = true, action = clap::ArgAction::SetFalse)]
        overwrite: bool,

        /// Input manifest (nanoaod_inputs.json), used for event counts when
        /// a container carries no AGC_metadata
        #[arg(long)]
        inputs_json: Option<PathBuf>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { tracing::Level::INFO } else { cli.log_level };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    let config = AnalysisConfig::default();

    match cli.command {
        Commands::Merge { inputs, output, inputs_json } => {
            cmd_merge(&inputs, &output, inputs_json.as_deref(), &config)
        }
        Commands::Scale { files, dry_run, overwrite, inputs_json } => {
            cmd_scale(&files, dry_run, overwrite, inputs_json.as_deref(), &config)
        }
        Commands::Version => {
            println!("agcpost {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_manifest(path: &std::path::Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("loading manifest {}", path.display()))
}

fn cmd_merge(
    inputs: &[PathBuf],
    output: &PathBuf,
    inputs_json: Option<&std::path::Path>,
    config: &AnalysisConfig,
) -> Result<()> {
    let by_process = match inputs_json {
        Some(path) => load_manifest(path)?.by_process(config),
        None => BTreeMap::new(),
    };

    let merged = merge::merge(inputs).context("merging shard containers")?;
    merged
        .write(output, by_process, config)
        .with_context(|| format!("writing merged container {}", output.display()))?;
    println!(
        "merged {} histograms from {} files into {}",
        merged.records.len(),
        inputs.len(),
        output.display()
    );
    Ok(())
}

fn cmd_scale(
    files: &[PathBuf],
    dry_run: bool,
    overwrite: bool,
    inputs_json: Option<&std::path::Path>,
    config: &AnalysisConfig,
) -> Result<()> {
    let fallback: Option<ScalingMetadata> = match inputs_json {
        Some(path) => {
            let manifest = load_manifest(path)?;
            Some(ScalingMetadata {
                histogram_names: Vec::new(),
                integrals: BTreeMap::new(),
                lumi: config.lumi,
                by_process: manifest.by_process(config),
            })
        }
        None => None,
    };

    let options = ScaleOptions { dry_run, overwrite };
    // Files are processed independently, but the first failure aborts the
    // run and leaves the remaining files unprocessed.
    for file in files {
        let summary = scale::scale_file(file, fallback.as_ref(), options, config)
            .with_context(|| format!("scaling {}", file.display()))?;
        let action = if dry_run { "dry-run" } else { "scaled" };
        println!(
            "{} {}: scaled {}, skipped {}",
            action,
            file.display(),
            summary.scaled,
            summary.skipped
        );
    }
    Ok(())
}
