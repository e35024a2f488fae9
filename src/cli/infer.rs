//! Infer-build command - score a table against per-build signature panels.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;

use crate::cli::{load_records, ColumnArgs, OutputFormat, SignatureArgs};
use crate::harmonize::build::{BuildInference, BuildInferenceConfig, BuildInferencer};

#[derive(Args)]
pub struct InferBuildArgs {
    /// Summary-statistics table (TSV/CSV/whitespace, optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub columns: ColumnArgs,

    #[command(flatten)]
    pub signature: SignatureArgs,

    /// Maximum number of records sampled
    #[arg(long, default_value = "10000")]
    pub max_samples: usize,

    /// Minimum allele match rate for the winning build
    #[arg(long, default_value = "0.8")]
    pub min_score: f64,

    /// Minimum number of sampled records found in the winning panel
    #[arg(long, default_value = "20")]
    pub min_hits: usize,
}

/// Execute the infer-build command
///
/// # Errors
///
/// Returns an error if no signature panels were given, inputs cannot be
/// loaded, or the build cannot be inferred confidently.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: InferBuildArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    if args.signature.signatures.is_empty() {
        bail!("at least one --signature BUILD=PATH is required");
    }

    let records = load_records(&args.input, &args.columns)?;
    let panels = args.signature.load()?;
    let config = BuildInferenceConfig {
        max_samples: args.max_samples,
        min_score: args.min_score,
        min_hits: args.min_hits,
    };
    let inferencer =
        BuildInferencer::with_config(panels.iter().map(|(b, p)| (b.clone(), p)).collect(), config);
    let inference = inferencer.infer(&records)?;

    match format {
        OutputFormat::Text => print_text(&inference),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inference)?),
        OutputFormat::Tsv => print_tsv(&inference),
    }

    Ok(())
}

fn print_text(inference: &BuildInference) {
    println!(
        "\nInferred build: {} (score {:.3}, {} records sampled)",
        inference.build, inference.score, inference.sampled
    );
    for s in &inference.scores {
        println!(
            "   {:<10} {:>6} hits {:>6} matches  score {:.3}",
            s.build.to_string(),
            s.hits,
            s.matches,
            s.score
        );
    }
}

fn print_tsv(inference: &BuildInference) {
    println!("build\thits\tmatches\tscore\tselected");
    for s in &inference.scores {
        println!(
            "{}\t{}\t{}\t{:.4}\t{}",
            s.build,
            s.hits,
            s.matches,
            s.score,
            s.build == inference.build
        );
    }
}
