//! Region and identifier sets used to filter output rows.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::variant::VariantRecord;
use crate::parsing::tsv::{read_bed, read_id_list};
use crate::reference::ReferenceLoadError;

/// A 1-based inclusive genomic interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    #[must_use]
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.chrom == chrom && (self.start..=self.end).contains(&pos)
    }
}

/// A named collection of regions to exclude from output
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    pub name: String,
    by_chrom: HashMap<String, Vec<Region>>,
}

impl RegionSet {
    pub fn new(name: impl Into<String>, regions: impl IntoIterator<Item = Region>) -> Self {
        let mut by_chrom: HashMap<String, Vec<Region>> = HashMap::new();
        for region in regions {
            by_chrom.entry(region.chrom.clone()).or_default().push(region);
        }
        Self {
            name: name.into(),
            by_chrom,
        }
    }

    /// Built-in region sets.
    ///
    /// `hla` (alias `mhc`) is chr6:25,000,000-34,000,000, wide enough to cover
    /// the extended MHC on both GRCh37 and GRCh38.
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hla" | "mhc" => Some(Self::new("hla", [Region::new("6", 25_000_000, 34_000_000)])),
            _ => None,
        }
    }

    /// Resolve a built-in name or load a BED file
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::NotFound` if `name_or_path` is neither a built-in
    /// name nor an existing file, or `ReferenceLoadError::Parse` on a bad BED.
    pub fn resolve(name_or_path: &str) -> Result<Self, ReferenceLoadError> {
        if let Some(set) = Self::named(name_or_path) {
            return Ok(set);
        }
        let path = Path::new(name_or_path);
        if !path.exists() {
            return Err(ReferenceLoadError::NotFound(name_or_path.to_string()));
        }
        let regions = read_bed(path).map_err(|source| ReferenceLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(name_or_path, regions))
    }

    #[must_use]
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.by_chrom
            .get(chrom)
            .is_some_and(|regions| regions.iter().any(|r| r.contains(chrom, pos)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_chrom.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Set of variant identifiers (e.g. HapMap3 SNPs) to restrict output to
#[derive(Debug, Clone, Default)]
pub struct SnpSet {
    ids: HashSet<String>,
}

impl SnpSet {
    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Load identifiers from a file, one per line
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::Parse` if the file cannot be read or
    /// `ReferenceLoadError::Empty` if it has no identifiers.
    pub fn load(path: &Path) -> Result<Self, ReferenceLoadError> {
        let ids = read_id_list(path).map_err(|source| ReferenceLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if ids.is_empty() {
            return Err(ReferenceLoadError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self::from_ids(ids))
    }

    /// A record is in the set if its rsID or SNPID is listed
    #[must_use]
    pub fn contains_record(&self, record: &VariantRecord) -> bool {
        [&record.rsid, &record.snpid]
            .into_iter()
            .flatten()
            .any(|id| self.ids.contains(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hla_region() {
        let hla = RegionSet::named("HLA").unwrap();
        assert!(hla.contains("6", 25_000_000));
        assert!(hla.contains("6", 30_000_000));
        assert!(hla.contains("6", 34_000_000));
        assert!(!hla.contains("6", 34_000_001));
        assert!(!hla.contains("5", 30_000_000));
        assert!(RegionSet::named("centromeres").is_none());
    }

    #[test]
    fn test_resolve_missing_file() {
        assert!(matches!(
            RegionSet::resolve("/nonexistent/regions.bed"),
            Err(ReferenceLoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_snp_set_matches_rsid_or_snpid() {
        let set = SnpSet::from_ids(vec!["rs1".to_string(), "1:500:A:G".to_string()]);

        let by_rsid = VariantRecord::new("1", 100, "A", "G").with_rsid("rs1");
        let mut by_snpid = VariantRecord::new("1", 500, "A", "G");
        by_snpid.snpid = Some("1:500:A:G".to_string());
        let neither = VariantRecord::new("1", 600, "A", "G").with_rsid("rs9");

        assert!(set.contains_record(&by_rsid));
        assert!(set.contains_record(&by_snpid));
        assert!(!set.contains_record(&neither));
    }
}
