//! Serialization of harmonized records.
//!
//! - [`format`]: column layouts (standard, LDSC, GWAS-SSF)
//! - [`writer`]: row filtering, gzip, atomic replace and MD5 sidecars

pub mod format;
pub mod writer;

pub use format::OutputFormat;
pub use writer::{write_harmonized, WriteError, WriteOptions, WriteSummary};
