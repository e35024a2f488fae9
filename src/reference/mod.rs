//! Read-only reference data shared by every harmonization worker.
//!
//! Each index is built once from owned entries and afterwards only exposes
//! `&self` lookups, so a single instance can be shared across rayon workers:
//!
//! - [`panel::ReferencePanel`]: REF/ALT/AF sites keyed by (chrom, pos)
//! - [`rsid::RsidIndex`]: (chrom, pos) to rsID
//! - [`sequence::ReferenceSequence`]: FASTA bases for sites missing from the panel
//! - [`liftover::ChainMap`]: UCSC chain liftover between builds
//! - [`regions::RegionSet`] and [`regions::SnpSet`]: output filters
//! - [`provider::ReferenceProvider`]: keyword to local path resolution

use std::path::PathBuf;

use thiserror::Error;

use crate::parsing::ParseError;

pub mod liftover;
pub mod panel;
pub mod provider;
pub mod regions;
pub mod rsid;
pub mod sequence;

#[derive(Error, Debug)]
pub enum ReferenceLoadError {
    #[error("Failed to load {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("No usable entries in {}", .path.display())]
    Empty { path: PathBuf },

    #[error("Reference not found: {0}")]
    NotFound(String),
}
