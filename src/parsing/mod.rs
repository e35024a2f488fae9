//! Parsers for summary statistics and reference data.
//!
//! This module provides parsers for:
//!
//! - **Delimited tables**: Tab, comma or whitespace separated summary statistics
//! - **Schema normalization**: Mapping heterogeneous headers onto [`VariantRecord`]s
//! - **VCF files**: Reference panels (REF/ALT/AF) and rsID lookup tables
//! - **TSV files**: Reference panels, rsID tables, SNP lists and BED regions
//! - **FASTA files**: Reference sequences for allele checks
//!
//! All readers accept plain text or gzip/bgzip compressed input; compression is
//! detected from the file's magic bytes rather than its extension.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sumstats_harmonizer::parsing::schema::{normalize_table, ColumnOverrides, InputFormat};
//! use sumstats_harmonizer::parsing::table::read_table;
//! use std::path::Path;
//!
//! let table = read_table(Path::new("sumstats.tsv.gz")).unwrap();
//! let records = normalize_table(&table, InputFormat::Auto, &ColumnOverrides::default()).unwrap();
//! ```
//!
//! [`VariantRecord`]: crate::core::variant::VariantRecord

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

pub mod fasta;
pub mod schema;
pub mod table;
pub mod tsv;
pub mod vcf;

/// gzip (and bgzip) magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Too many rows: {0} exceeds maximum allowed")]
    TooManyRows(usize),
}

/// Open a text file for buffered reading, transparently decompressing gzip/bgzip.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened or read.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if is_gzip {
        // bgzip files are multi-member gzip streams
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Check if a path names a VCF file (`.vcf`, `.vcf.gz`, `.vcf.bgz`)
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_vcf_path(path: &Path) -> bool {
    let name = path.to_string_lossy().to_lowercase();
    name.ends_with(".vcf") || name.ends_with(".vcf.gz") || name.ends_with(".vcf.bgz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_text_plain() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"CHR\tPOS\n1\t100\n").unwrap();

        let mut content = String::new();
        open_text(file.path())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "CHR\tPOS\n1\t100\n");
    }

    #[test]
    fn test_open_text_gzip_without_extension() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"CHR\tPOS\n1\t100\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&compressed).unwrap();

        let mut content = String::new();
        open_text(file.path())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "CHR\tPOS\n1\t100\n");
    }

    #[test]
    fn test_is_vcf_path() {
        assert!(is_vcf_path(Path::new("panel.vcf")));
        assert!(is_vcf_path(Path::new("panel.VCF.GZ")));
        assert!(is_vcf_path(Path::new("panel.vcf.bgz")));
        assert!(!is_vcf_path(Path::new("panel.tsv.gz")));
    }
}
