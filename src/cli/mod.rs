//! Command-line interface for sumstats-harmonizer.
//!
//! Available commands:
//!
//! - **harmonize**: Align a summary-statistics table to a reference panel
//! - **infer-build**: Infer the genome build of a table from signature panels
//! - **qc**: Validate a table and report what quality control would drop
//!
//! ## Usage
//!
//! ```text
//! # Harmonize against a local panel, writing gzip output with an MD5 sidecar
//! sumstats-harmonizer harmonize gwas.tsv.gz --ref panel.vcf.gz -o out.tsv.gz --md5
//!
//! # Resolve a panel keyword against a data directory and fill rsIDs
//! sumstats-harmonizer harmonize gwas.tsv --data-dir ~/refs --ref 1kg_eas_hg19 \
//!     --rsid-table dbsnp_hg19 -o out.tsv
//!
//! # Infer the build, JSON output for scripting
//! sumstats-harmonizer infer-build gwas.tsv --signature 37=hg19.tsv --signature 38=hg38.tsv --format json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::core::chrom::normalize_chrom;
use crate::core::types::Build;
use crate::core::variant::VariantRecord;
use crate::parsing::schema::{normalize_table, ColumnOverrides, InputFormat};
use crate::parsing::table::read_table;
use crate::parsing::vcf::DEFAULT_AF_KEY;
use crate::reference::panel::ReferencePanel;

pub mod harmonize;
pub mod infer;
pub mod qc;

#[derive(Parser)]
#[command(name = "sumstats-harmonizer")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Harmonize GWAS summary statistics to a reference panel")]
#[command(
    long_about = "sumstats-harmonizer normalizes GWAS summary statistics from many tools into one schema and aligns every variant to a reference panel.\n\nFor each variant it:\n- Validates alleles, positions and statistics\n- Fills rsIDs from a lookup table\n- Orients alleles to the reference (ea = ALT, nea = REF), flipping effects where needed\n- Resolves palindromic SNPs using allele frequencies"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Write log messages to this file instead of stderr
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harmonize a summary-statistics table against a reference panel
    Harmonize(Box<harmonize::HarmonizeArgs>),

    /// Infer the genome build of a summary-statistics table
    InferBuild(infer::InferBuildArgs),

    /// Run quality control only and report the results
    Qc(qc::QcArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Options shared by every command that reads a summary-statistics table
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ColumnArgs {
    /// Column dictionary of the input table
    #[arg(long, value_enum, default_value = "auto")]
    pub input_format: InputFormat,

    /// Column holding the variant ID
    #[arg(long, value_name = "COLUMN")]
    pub snpid_col: Option<String>,

    /// Column holding the rsID
    #[arg(long, value_name = "COLUMN")]
    pub rsid_col: Option<String>,

    /// Column holding the chromosome
    #[arg(long, value_name = "COLUMN")]
    pub chrom_col: Option<String>,

    /// Column holding the base-pair position
    #[arg(long, value_name = "COLUMN")]
    pub pos_col: Option<String>,

    /// Column holding the effect allele
    #[arg(long, value_name = "COLUMN")]
    pub ea_col: Option<String>,

    /// Column holding the non-effect allele
    #[arg(long, value_name = "COLUMN")]
    pub nea_col: Option<String>,

    /// Column holding the effect allele frequency
    #[arg(long, value_name = "COLUMN")]
    pub eaf_col: Option<String>,

    /// Column holding the non-effect allele frequency (converted to EAF)
    #[arg(long, value_name = "COLUMN")]
    pub neaf_col: Option<String>,

    /// Column holding the effect size
    #[arg(long, value_name = "COLUMN")]
    pub beta_col: Option<String>,

    /// Column holding the odds ratio (converted to beta when beta is absent)
    #[arg(long, value_name = "COLUMN")]
    pub or_col: Option<String>,

    /// Column holding the Z-score
    #[arg(long, value_name = "COLUMN")]
    pub z_col: Option<String>,

    /// Column holding the standard error
    #[arg(long, value_name = "COLUMN")]
    pub se_col: Option<String>,

    /// Column holding the p-value
    #[arg(long, value_name = "COLUMN")]
    pub p_col: Option<String>,

    /// Column holding -log10(p) (converted to P when P is absent)
    #[arg(long, value_name = "COLUMN")]
    pub mlog10p_col: Option<String>,

    /// Column holding the sample size
    #[arg(long, value_name = "COLUMN")]
    pub n_col: Option<String>,

    /// Column holding the imputation INFO score
    #[arg(long, value_name = "COLUMN")]
    pub info_col: Option<String>,
}

impl ColumnArgs {
    #[must_use]
    pub fn overrides(&self) -> ColumnOverrides {
        ColumnOverrides {
            snpid: self.snpid_col.clone(),
            rsid: self.rsid_col.clone(),
            chrom: self.chrom_col.clone(),
            pos: self.pos_col.clone(),
            ea: self.ea_col.clone(),
            nea: self.nea_col.clone(),
            eaf: self.eaf_col.clone(),
            neaf: self.neaf_col.clone(),
            beta: self.beta_col.clone(),
            odds_ratio: self.or_col.clone(),
            z: self.z_col.clone(),
            se: self.se_col.clone(),
            p: self.p_col.clone(),
            mlog10p: self.mlog10p_col.clone(),
            n: self.n_col.clone(),
            info: self.info_col.clone(),
        }
    }
}

/// Per-build signature panels for build inference
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SignatureArgs {
    /// Signature panel for a build, as BUILD=PATH (e.g. 38=hg38_sites.tsv); repeatable
    #[arg(long = "signature", value_name = "BUILD=PATH", value_parser = parse_signature)]
    pub signatures: Vec<(Build, PathBuf)>,

    /// INFO key holding the alt allele frequency in VCF panels
    #[arg(long, default_value = DEFAULT_AF_KEY)]
    pub af_key: String,
}

impl SignatureArgs {
    /// Load every signature panel
    ///
    /// # Errors
    ///
    /// Returns an error if any panel cannot be read.
    pub fn load(&self) -> anyhow::Result<Vec<(Build, ReferencePanel)>> {
        self.signatures
            .iter()
            .map(|(build, path)| {
                let panel = ReferencePanel::load(path, &self.af_key)
                    .with_context(|| format!("loading signature panel for {build}"))?;
                info!("Loaded {} signature sites for {build}", panel.len());
                Ok((build.clone(), panel))
            })
            .collect()
    }
}

/// Parse a `BUILD=PATH` signature argument
///
/// # Errors
///
/// Returns a message if the value has no `=` or an empty side.
pub fn parse_signature(s: &str) -> Result<(Build, PathBuf), String> {
    match s.split_once('=') {
        Some((build, path)) if !build.trim().is_empty() && !path.trim().is_empty() => {
            Ok((Build::parse(build), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected BUILD=PATH, got '{s}'")),
    }
}

/// Read and normalize a summary-statistics table
///
/// # Errors
///
/// Returns an error if the file cannot be read or its columns cannot be mapped.
pub fn load_records(path: &Path, columns: &ColumnArgs) -> anyhow::Result<Vec<VariantRecord>> {
    let table = read_table(path).with_context(|| format!("reading {}", path.display()))?;
    let records = normalize_table(&table, columns.input_format, &columns.overrides())
        .with_context(|| format!("mapping columns of {}", path.display()))?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Normalize user-supplied chromosome names; an empty list means no filter
#[must_use]
pub fn chrom_filter(chroms: &[String]) -> Option<Vec<String>> {
    if chroms.is_empty() {
        None
    } else {
        Some(chroms.iter().map(|c| normalize_chrom(c)).collect())
    }
}
