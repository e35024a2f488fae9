//! The harmonization stages and the pipeline that threads records through them.
//!
//! Stages run in a fixed order, each consuming and producing the canonical
//! record table:
//!
//! 1. [`build`]: infer the genome build (optional, non-fatal)
//! 2. [`qc`]: validate, filter chromosomes and deduplicate
//! 3. [`rsid`]: fill or replace rsIDs from a lookup table
//! 4. [`harmonizer`]: align each record to the reference panel
//!
//! [`pipeline::Pipeline`] runs stages 2-4 over sharded records with rayon and
//! returns a [`report::HarmonizationReport`].

use thiserror::Error;

use crate::output::writer::WriteError;
use crate::parsing::schema::SchemaError;
use crate::reference::ReferenceLoadError;

pub mod build;
pub mod harmonizer;
pub mod options;
pub mod pipeline;
pub mod qc;
pub mod report;
pub mod rsid;

pub use options::OptionsError;

#[derive(Error, Debug)]
pub enum HarmonizeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    ReferenceLoad(#[from] ReferenceLoadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Invalid options: {0}")]
    Options(#[from] OptionsError),

    #[error("Harmonization was cancelled")]
    Cancelled,

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}
