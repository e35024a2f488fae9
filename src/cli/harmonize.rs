//! Harmonize command - align a summary-statistics table to a reference panel.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use crate::cli::{chrom_filter, load_records, ColumnArgs, OutputFormat, SignatureArgs};
use crate::core::types::Build;
use crate::core::variant::VariantRecord;
use crate::harmonize::build::{BuildInference, BuildInferencer};
use crate::harmonize::options::{HarmonizeOptions, RsidOverwrite};
use crate::harmonize::pipeline::Pipeline;
use crate::harmonize::report::HarmonizationReport;
use crate::output::format::OutputFormat as TableLayout;
use crate::output::writer::{write_harmonized, WriteOptions, WriteSummary};
use crate::parsing::vcf::DEFAULT_AF_KEY;
use crate::reference::liftover::ChainMap;
use crate::reference::panel::ReferencePanel;
use crate::reference::provider::{LocalProvider, ReferenceProvider};
use crate::reference::regions::{RegionSet, SnpSet};
use crate::reference::rsid::RsidIndex;
use crate::reference::sequence::ReferenceSequence;

#[derive(Args)]
pub struct HarmonizeArgs {
    /// Summary-statistics table (TSV/CSV/whitespace, optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output table; a `.gz` suffix writes gzip
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Write the JSON run report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// JSON options file; command-line flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub columns: ColumnArgs,

    // === Reference data ===
    /// Reference panel: a VCF/TSV path or a keyword resolved in the data directory
    #[arg(long = "ref", value_name = "PATH|KEYWORD")]
    pub reference: Option<String>,

    /// INFO key holding the alt allele frequency in VCF panels
    #[arg(long, default_value = DEFAULT_AF_KEY)]
    pub ref_af_key: String,

    /// rsID lookup table: a VCF/TSV path or a keyword resolved in the data directory
    #[arg(long, value_name = "PATH|KEYWORD")]
    pub rsid_table: Option<String>,

    /// Directory searched for reference keywords (default: $SUMSTATS_HARMONIZER_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Reference FASTA used when the panel has no entry at a site
    #[arg(long)]
    pub fasta: Option<PathBuf>,

    // === Builds ===
    /// Genome build of the input table (e.g. 19, hg19, GRCh38)
    #[arg(long)]
    pub build: Option<String>,

    /// Genome build of the reference panel
    #[arg(long)]
    pub target_build: Option<String>,

    /// UCSC chain file lifting the input build to the target build
    #[arg(long)]
    pub chain: Option<PathBuf>,

    #[command(flatten)]
    pub signature: SignatureArgs,

    // === Policies ===
    /// Frequency threshold for orienting palindromic SNPs (0.5 < t <= 1)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Drop records not found in the reference
    #[arg(long)]
    pub remove: bool,

    /// Drop palindromic records that could not be oriented
    #[arg(long)]
    pub remove_ambiguous: bool,

    /// Keep records that fail validation (tagged INVALID_RECORD)
    #[arg(long)]
    pub keep_invalid: bool,

    /// Keep repeated (chrom, pos, ea, nea) records
    #[arg(long)]
    pub keep_duplicates: bool,

    /// When to replace existing rsIDs from the lookup table
    #[arg(long, value_enum)]
    pub rsid_overwrite: Option<RsidOverwrite>,

    /// Restrict to these chromosomes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub chrom: Vec<String>,

    /// Worker threads (0 = all cores)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Records per parallel shard
    #[arg(long)]
    pub shard_size: Option<usize>,

    // === Output ===
    /// Column layout of the output table
    #[arg(long, value_enum, default_value = "standard")]
    pub layout: TableLayout,

    /// Only write variants whose rsID or SNPID is listed in this file (e.g. HapMap3)
    #[arg(long, value_name = "PATH")]
    pub snp_list: Option<PathBuf>,

    /// Exclude a region set: a built-in name (hla, mhc) or a BED file; repeatable
    #[arg(long, value_name = "NAME|BED")]
    pub exclude_regions: Vec<String>,

    /// Write an MD5 checksum file next to the output
    #[arg(long)]
    pub md5: bool,
}

impl HarmonizeArgs {
    /// Merge the options file (if any) with command-line flags
    ///
    /// # Errors
    ///
    /// Returns an error if the options file cannot be loaded or the merged
    /// options are out of range.
    pub fn options(&self) -> anyhow::Result<HarmonizeOptions> {
        let mut options = match &self.config {
            Some(path) => HarmonizeOptions::load_json(path)
                .with_context(|| format!("loading options from {}", path.display()))?,
            None => HarmonizeOptions::default(),
        };

        if let Some(threshold) = self.threshold {
            options.palindromic_threshold = threshold;
        }
        options.remove |= self.remove;
        options.remove_ambiguous |= self.remove_ambiguous;
        if self.keep_invalid {
            options.remove_invalid = false;
        }
        if self.keep_duplicates {
            options.deduplicate = false;
        }
        if let Some(policy) = self.rsid_overwrite {
            options.rsid_overwrite = policy;
        }
        if let Some(chroms) = chrom_filter(&self.chrom) {
            options.chromosomes = Some(chroms);
        }
        if let Some(threads) = self.threads {
            options.threads = threads;
        }
        if let Some(shard_size) = self.shard_size {
            options.shard_size = shard_size;
        }

        options.validate()?;
        Ok(options)
    }

    fn write_options(&self) -> anyhow::Result<WriteOptions> {
        let snp_set = self
            .snp_list
            .as_deref()
            .map(SnpSet::load)
            .transpose()
            .context("loading SNP list")?;
        let exclude_regions = self
            .exclude_regions
            .iter()
            .map(|name_or_path| RegionSet::resolve(name_or_path))
            .collect::<Result<Vec<_>, _>>()
            .context("loading excluded regions")?;
        Ok(WriteOptions {
            format: self.layout,
            snp_set,
            exclude_regions,
            checksum: self.md5,
        })
    }
}

/// Execute the harmonize command
///
/// # Errors
///
/// Returns an error if inputs or reference data cannot be loaded, the options
/// are invalid, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: Box<HarmonizeArgs>, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let options = args.options()?;
    let write_options = args.write_options()?;
    let records = load_records(&args.input, &args.columns)?;

    let declared = args.build.as_deref().map(Build::parse);
    let target = args.target_build.as_deref().map(Build::parse);
    let inferred = infer_build(&args.signature, &records)?;
    let source = declared.clone().or_else(|| inferred.as_ref().map(|i| i.build.clone()));

    let provider = LocalProvider::from_env(args.data_dir.clone());
    let panel = match &args.reference {
        Some(keyword) => {
            let path = provider.fetch_reference(keyword)?;
            let panel = ReferencePanel::load(&path, &args.ref_af_key)?;
            info!(
                "Loaded {} panel entries at {} sites from {}",
                panel.len(),
                panel.site_count(),
                path.display()
            );
            panel
        }
        None => {
            if args.fasta.is_none() {
                warn!("No reference panel or FASTA given; records cannot be aligned");
            }
            ReferencePanel::empty()
        }
    };

    let rsid_index = match &args.rsid_table {
        Some(keyword) => {
            let path = provider.fetch_rsid_table(keyword)?;
            Some(RsidIndex::load(&path)?)
        }
        None => None,
    };

    let sequence = args.fasta.as_deref().map(ReferenceSequence::load).transpose()?;

    let liftover = match &args.chain {
        Some(_) if source.is_some() && source == target => {
            info!("Input is already on the target build; skipping liftover");
            None
        }
        Some(path) => Some(ChainMap::load(path)?),
        None => {
            if let (Some(source), Some(target)) = (&source, &target) {
                if source != target {
                    warn!("Input build {source} differs from target {target} but no --chain was given");
                }
            }
            None
        }
    };

    let (harmonized, report) = Pipeline::new(&panel, options)
        .with_rsid_index(rsid_index.as_ref())
        .with_sequence(sequence.as_ref())
        .with_liftover(liftover.as_ref())
        .run(records)?;
    let report = report.with_builds(declared, inferred, target);
    report.log_summary();

    let summary = write_harmonized(&harmonized, &args.output, &write_options)?;

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    match format {
        OutputFormat::Text => print_text(&report, &summary, verbose),
        OutputFormat::Json => print_json(&report, &summary)?,
        OutputFormat::Tsv => print_tsv(&report),
    }

    Ok(())
}

/// Run build inference when signature panels were given. Failure is not fatal.
fn infer_build(
    signature: &SignatureArgs,
    records: &[VariantRecord],
) -> anyhow::Result<Option<BuildInference>> {
    if signature.signatures.is_empty() {
        return Ok(None);
    }
    let panels = signature.load()?;
    let inferencer = BuildInferencer::new(panels.iter().map(|(b, p)| (b.clone(), p)).collect());
    match inferencer.infer(records) {
        Ok(inference) => Ok(Some(inference)),
        Err(e) => {
            warn!("Build inference failed: {e}");
            Ok(None)
        }
    }
}

fn print_text(report: &HarmonizationReport, summary: &WriteSummary, verbose: bool) {
    println!("\nHarmonization summary");
    println!("{}", "─".repeat(60));
    if let Some(build) = &report.source_build {
        println!("   Input build:   {build}");
    }
    if let Some(inferred) = &report.inferred_build {
        println!(
            "   Inferred build: {} (score {:.3}, {} sampled)",
            inferred.build, inferred.score, inferred.sampled
        );
    }
    if let Some(build) = &report.target_build {
        println!("   Target build:  {build}");
    }
    if report.liftover_applied {
        println!("   Liftover:      applied");
    }

    println!("\n   Records: {} in → {} out", report.input_records, report.output_records);
    for stage in &report.stages {
        println!(
            "     {:<12} {:>10} in {:>10} dropped {:>10} kept",
            stage.stage, stage.input, stage.dropped, stage.retained
        );
    }

    println!("\n   Outcomes:");
    for (tag, count) in report.outcomes.entries() {
        if count > 0 || verbose {
            println!("     {tag:<30} {count}");
        }
    }

    if report.qc.invalid > 0 {
        println!("\n   Invalid records: {}", report.qc.invalid);
        for (reason, count) in &report.qc.invalid_by_reason {
            println!("     {reason:<30} {count}");
        }
        if verbose {
            for example in &report.qc.invalid_examples {
                println!("     line {}: {}", example.line, example.reason);
            }
        }
    }

    if let Some(rsid) = &report.rsid {
        println!(
            "\n   rsIDs: {} assigned, {} overwritten, {} from SNPID, {} unresolved",
            rsid.assigned, rsid.overwritten, rsid.promoted, rsid.unresolved
        );
    }

    println!("\n   Wrote {} rows to {}", summary.rows_written, summary.path.display());
    if summary.rows_filtered_snpset + summary.rows_filtered_region + summary.rows_skipped > 0 {
        println!(
            "     ({} not in SNP list, {} in excluded regions, {} not representable)",
            summary.rows_filtered_snpset, summary.rows_filtered_region, summary.rows_skipped
        );
    }
    if let Some(md5) = &summary.md5 {
        println!("     MD5: {md5}");
    }
}

fn print_json(report: &HarmonizationReport, summary: &WriteSummary) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "report": report,
        "output": summary,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(report: &HarmonizationReport) {
    println!("section\tname\tvalue");
    println!("records\tinput\t{}", report.input_records);
    println!("records\toutput\t{}", report.output_records);
    for stage in &report.stages {
        println!("stage\t{}\t{}", stage.stage, stage.dropped);
    }
    for (tag, count) in report.outcomes.entries() {
        println!("outcome\t{tag}\t{count}");
    }
}
