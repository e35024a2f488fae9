//! Atomic writing of harmonized tables with optional gzip and MD5 sidecar.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::variant::HarmonizedRecord;
use crate::output::format::OutputFormat;
use crate::reference::regions::{RegionSet, SnpSet};
use crate::utils::validation::md5_hex;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move output into place at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Row filters and output settings
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub format: OutputFormat,

    /// Only write records whose rsID or SNPID is in this set
    pub snp_set: Option<SnpSet>,

    /// Drop records inside any of these regions
    pub exclude_regions: Vec<RegionSet>,

    /// Write `<output>.md5` next to the output
    pub checksum: bool,
}

/// What ended up in the output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub rows_written: usize,
    pub rows_filtered_snpset: usize,
    pub rows_filtered_region: usize,

    /// Rows the output layout could not represent
    pub rows_skipped: usize,

    /// Hex MD5 of the written bytes, when requested
    pub md5: Option<String>,
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz" || ext == "bgz")
}

/// Render the table, then atomically replace `path` with it.
///
/// The bytes are written to a temporary file in the destination directory and
/// renamed over `path`, so an existing file is never left half-written.
///
/// # Errors
///
/// Returns `WriteError::Io` if the temporary file cannot be created or
/// written, or `WriteError::Persist` if the final rename fails.
pub fn write_harmonized(
    records: &[HarmonizedRecord],
    path: &Path,
    options: &WriteOptions,
) -> Result<WriteSummary, WriteError> {
    let mut summary = WriteSummary {
        path: path.to_path_buf(),
        rows_written: 0,
        rows_filtered_snpset: 0,
        rows_filtered_region: 0,
        rows_skipped: 0,
        md5: None,
    };

    let mut text = options.format.header();
    text.push('\n');
    for harmonized in records {
        let record = &harmonized.record;
        if let Some(snps) = &options.snp_set {
            if !snps.contains_record(record) {
                summary.rows_filtered_snpset += 1;
                continue;
            }
        }
        if options
            .exclude_regions
            .iter()
            .any(|set| set.contains(&record.chrom, record.pos))
        {
            summary.rows_filtered_region += 1;
            continue;
        }
        let Some(row) = options.format.render_row(harmonized) else {
            summary.rows_skipped += 1;
            continue;
        };
        text.push_str(&row);
        text.push('\n');
        summary.rows_written += 1;
    }

    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let bytes = if is_gzip_path(path) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).map_err(io_err)?;
        encoder.finish().map_err(io_err)?
    } else {
        text.into_bytes()
    };

    // A checksum left from an earlier run must never describe the new file
    let sidecar = md5_sidecar_path(path);
    match std::fs::remove_file(&sidecar) {
        Ok(()) => debug!("Removed previous checksum {}", sidecar.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(WriteError::Io {
                path: sidecar,
                source,
            })
        }
    }

    write_atomic(path, &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());

    if options.checksum {
        let digest = md5_hex(&bytes);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        write_atomic(&sidecar, format!("{digest}  {file_name}\n").as_bytes())?;
        summary.md5 = Some(digest);
    }

    info!(
        "Wrote {} rows to {} ({} outside SNP set, {} in excluded regions, {} skipped)",
        summary.rows_written,
        path.display(),
        summary.rows_filtered_snpset,
        summary.rows_filtered_region,
        summary.rows_skipped
    );
    Ok(summary)
}

/// `<path>.md5`
#[must_use]
pub fn md5_sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".md5");
    PathBuf::from(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| WriteError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
