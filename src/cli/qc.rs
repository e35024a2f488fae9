//! QC command - validate a table and report what would be dropped.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{chrom_filter, load_records, ColumnArgs, OutputFormat};
use crate::harmonize::qc::{QcPolicy, QcSummary, QualityController};

#[derive(Args)]
pub struct QcArgs {
    /// Summary-statistics table (TSV/CSV/whitespace, optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub columns: ColumnArgs,

    /// Restrict to these chromosomes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub chrom: Vec<String>,

    /// Do not count repeated (chrom, pos, ea, nea) records as dropped
    #[arg(long)]
    pub keep_duplicates: bool,
}

/// Execute the qc command
///
/// # Errors
///
/// Returns an error if the input cannot be read or its columns mapped.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: QcArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let records = load_records(&args.input, &args.columns)?;
    let chromosomes = chrom_filter(&args.chrom);
    let qc = QualityController::new(QcPolicy {
        remove_invalid: true,
        remove_duplicates: !args.keep_duplicates,
    })
    .with_chromosomes(chromosomes.as_deref());

    let (_, summary) = qc.run(records);

    match format {
        OutputFormat::Text => print_text(&summary, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Tsv => print_tsv(&summary),
    }

    Ok(())
}

fn print_text(summary: &QcSummary, verbose: bool) {
    println!("\nQuality control");
    println!("{}", "─".repeat(60));
    println!("   Records:               {}", summary.total);
    println!("   Invalid:               {}", summary.invalid);
    for (reason, count) in &summary.invalid_by_reason {
        println!("     {reason}: {count}");
    }
    println!("   Non-standard alleles:  {}", summary.flagged_nonstandard);
    println!("   Outside --chrom:       {}", summary.filtered_chrom);
    println!("   Duplicates:            {}", summary.duplicates_removed);
    println!("   Retained:              {}", summary.retained);

    if verbose && !summary.invalid_examples.is_empty() {
        println!("\n   First invalid records:");
        for example in &summary.invalid_examples {
            println!("     line {}: {}", example.line, example.reason);
        }
    }
}

fn print_tsv(summary: &QcSummary) {
    println!("metric\tcount");
    println!("total\t{}", summary.total);
    println!("invalid\t{}", summary.invalid);
    for (reason, count) in &summary.invalid_by_reason {
        println!("invalid_{}\t{count}", reason.code());
    }
    println!("flagged_nonstandard\t{}", summary.flagged_nonstandard);
    println!("filtered_chrom\t{}", summary.filtered_chrom);
    println!("duplicates_removed\t{}", summary.duplicates_removed);
    println!("retained\t{}", summary.retained);
}
