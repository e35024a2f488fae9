//! Parser for FASTA reference sequences using noodles.
//!
//! Sequences are loaded whole and upper-cased so that soft-masked
//! (lower-case) bases compare equal to their hard counterparts.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz`, `.fa.bgz` (gzip/bgzip compressed)

use std::ffi::OsStr;
use std::io::BufRead;
use std::path::Path;

use noodles::fasta;
use tracing::debug;

use crate::core::chrom::normalize_chrom;
use crate::parsing::{open_text, ParseError};

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    if [".fa", ".fasta", ".fna"]
        .iter()
        .any(|ext| path_str.ends_with(&format!("{ext}.gz")) || path_str.ends_with(&format!("{ext}.bgz")))
    {
        return true;
    }

    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "fna")
    )
}

/// Parse a FASTA file into `(normalized chromosome, upper-case sequence)` pairs.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, or `ParseError::InvalidFormat` if no sequences are found.
pub fn read_fasta(path: &Path) -> Result<Vec<(String, Vec<u8>)>, ParseError> {
    let mut reader = fasta::io::Reader::new(open_text(path)?);
    read_fasta_records(&mut reader)
}

/// Parse from a noodles FASTA reader
fn read_fasta_records<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<(String, Vec<u8>)>, ParseError> {
    let mut sequences = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        let bases: Vec<u8> = record
            .sequence()
            .as_ref()
            .iter()
            .map(u8::to_ascii_uppercase)
            .collect();

        debug!("Loaded FASTA sequence {name} ({} bp)", bases.len());
        sequences.push((normalize_chrom(&name), bases));
    }

    if sequences.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(sequences)
}
