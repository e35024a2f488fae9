//! # sumstats-harmonizer
//!
//! A library for harmonizing GWAS summary statistics.
//!
//! Summary statistics arrive in dozens of layouts (PLINK, REGENIE, SAIGE,
//! BOLT-LMM, METAL, GWAS-SSF, ...) with inconsistent chromosome names, allele
//! orientation and strand. Before two studies can be compared or meta-analyzed
//! every variant must be expressed against the same reference: same build, same
//! strand, effect allele equal to the reference ALT allele.
//!
//! `sumstats-harmonizer` normalizes a table into one record schema, validates
//! and deduplicates it, fills rsIDs, and aligns each record to a reference
//! panel, tagging it with the outcome of the alignment.
//!
//! ## Features
//!
//! - **Schema normalization**: Per-tool column dictionaries plus explicit overrides
//! - **Build inference**: Position/allele concordance against signature panels
//! - **Allele alignment**: Strand flips, ref/alt swaps and both, with effect flipping
//! - **Palindromic SNPs**: Oriented by allele frequency with a configurable threshold
//! - **Liftover**: UCSC chain files applied before panel lookup
//! - **Parallel**: Sharded processing with rayon; output keeps input order
//!
//! ## Example
//!
//! ```rust,no_run
//! use sumstats_harmonizer::harmonize::options::HarmonizeOptions;
//! use sumstats_harmonizer::harmonize::pipeline::harmonize;
//! use sumstats_harmonizer::parsing::schema::{normalize_table, ColumnOverrides, InputFormat};
//! use sumstats_harmonizer::parsing::table::read_table;
//! use sumstats_harmonizer::reference::panel::ReferencePanel;
//! use std::path::Path;
//!
//! let table = read_table(Path::new("gwas.tsv.gz")).unwrap();
//! let records = normalize_table(&table, InputFormat::Auto, &ColumnOverrides::default()).unwrap();
//! let panel = ReferencePanel::load(Path::new("panel.vcf.gz"), "AF").unwrap();
//!
//! let (harmonized, report) = harmonize(records, &panel, None, &HarmonizeOptions::default()).unwrap();
//! println!("{} records, {:.1}% aligned", harmonized.len(), report.aligned_fraction() * 100.0);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Record types, outcome tags, allele and chromosome helpers
//! - [`parsing`]: Readers for sumstats tables, VCF/TSV panels, FASTA and BED
//! - [`reference`]: Reference panels, rsID indexes, sequences, chains and region sets
//! - [`harmonize`]: QC, rsID resolution, build inference and the harmonizer itself
//! - [`output`]: Output layouts and atomic writing
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod harmonize;
pub mod output;
pub mod parsing;
pub mod reference;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::types::*;
pub use core::variant::{HarmonizedRecord, InvalidReason, InvalidRecordError, VariantRecord};
pub use harmonize::options::HarmonizeOptions;
pub use harmonize::pipeline::{harmonize, CancellationToken, Pipeline};
pub use harmonize::report::HarmonizationReport;
pub use harmonize::HarmonizeError;
pub use reference::panel::{ReferencePanel, ReferencePanelEntry};
pub use reference::rsid::RsidIndex;
