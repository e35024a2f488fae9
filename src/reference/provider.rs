//! Resolution of reference keywords to local files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::reference::ReferenceLoadError;

/// Environment variable naming the default data directory
pub const DATA_DIR_ENV: &str = "SUMSTATS_HARMONIZER_DATA";

/// File suffixes tried, in order, when resolving a keyword
const SUFFIXES: [&str; 4] = [".vcf.gz", ".vcf", ".tsv.gz", ".tsv"];

/// Supplies local paths for reference panels and rsID tables.
///
/// Downloading is outside this crate; an implementation only maps a build name
/// or keyword (e.g. `1kg_eas_hg19`) to a file that already exists.
pub trait ReferenceProvider {
    /// Path of the reference panel for a build or keyword
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::NotFound` if nothing matches.
    fn fetch_reference(&self, build_or_keyword: &str) -> Result<PathBuf, ReferenceLoadError>;

    /// Path of the rsID lookup table for a keyword or path
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::NotFound` if nothing matches.
    fn fetch_rsid_table(&self, keyword_or_path: &str) -> Result<PathBuf, ReferenceLoadError>;
}

/// Resolves existing paths as-is and keywords against a data directory
#[derive(Debug, Clone, Default)]
pub struct LocalProvider {
    data_dir: Option<PathBuf>,
}

impl LocalProvider {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        Self { data_dir }
    }

    /// Use an explicit directory, falling back to `SUMSTATS_HARMONIZER_DATA`
    pub fn from_env(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir.or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from));
        Self::new(data_dir)
    }

    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn resolve(&self, keyword: &str) -> Result<PathBuf, ReferenceLoadError> {
        let direct = Path::new(keyword);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        if let Some(dir) = &self.data_dir {
            for suffix in SUFFIXES {
                let candidate = dir.join(format!("{keyword}{suffix}"));
                debug!("Looking for {}", candidate.display());
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        Err(ReferenceLoadError::NotFound(keyword.to_string()))
    }
}

impl ReferenceProvider for LocalProvider {
    fn fetch_reference(&self, build_or_keyword: &str) -> Result<PathBuf, ReferenceLoadError> {
        self.resolve(build_or_keyword)
    }

    fn fetch_rsid_table(&self, keyword_or_path: &str) -> Result<PathBuf, ReferenceLoadError> {
        self.resolve(keyword_or_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_existing_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let provider = LocalProvider::new(None);
        let path = provider
            .fetch_reference(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(path, file.path());
    }

    #[test]
    fn test_resolve_keyword_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1kg_eas_hg19.tsv"), "x").unwrap();
        std::fs::write(dir.path().join("1kg_eas_hg19.vcf.gz"), "x").unwrap();

        let provider = LocalProvider::new(Some(dir.path().to_path_buf()));
        let path = provider.fetch_reference("1kg_eas_hg19").unwrap();
        // VCF wins over TSV
        assert_eq!(path, dir.path().join("1kg_eas_hg19.vcf.gz"));

        assert!(matches!(
            provider.fetch_rsid_table("1kg_dbsnp151_hg38"),
            Err(ReferenceLoadError::NotFound(_))
        ));
    }
}
