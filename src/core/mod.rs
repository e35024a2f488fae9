//! Core data types for summary-statistics harmonization.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`VariantRecord`](variant::VariantRecord): One row of a summary-statistics table
//! - [`HarmonizedRecord`](variant::HarmonizedRecord): A record with its harmonization outcome
//! - [`Build`](types::Build): Genome build (`GRCh37`, `GRCh38`)
//! - [`HarmonizationOutcome`](types::HarmonizationOutcome): Per-record result tag
//! - [`allele`]: Allele classification, complements and palindrome checks
//! - [`chrom`]: Chromosome name normalization

pub mod allele;
pub mod chrom;
pub mod types;
pub mod variant;
