//! Position to rsID lookup index.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::parsing::{is_vcf_path, tsv, vcf};
use crate::reference::ReferenceLoadError;

/// One (chrom, pos) -> rsID row of a lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsidLookupEntry {
    pub chrom: String,
    pub pos: u64,
    pub rsid: String,
}

/// Read-only rsID index. When a site has several IDs the first one loaded wins.
#[derive(Debug, Clone, Default)]
pub struct RsidIndex {
    ids: HashMap<String, HashMap<u64, String>>,
    len: usize,
}

impl RsidIndex {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = RsidLookupEntry>) -> Self {
        let mut index = Self::default();
        let mut shadowed = 0usize;

        for entry in entries {
            let by_pos = index.ids.entry(entry.chrom).or_default();
            if by_pos.contains_key(&entry.pos) {
                shadowed += 1;
                continue;
            }
            by_pos.insert(entry.pos, entry.rsid);
            index.len += 1;
        }

        if shadowed > 0 {
            debug!("{shadowed} rsIDs shared a position with an earlier entry and were ignored");
        }
        index
    }

    /// Load a lookup table from a VCF (by extension) or a TSV with
    /// `rsid chrom pos` columns
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::Parse` if the file cannot be parsed or
    /// `ReferenceLoadError::Empty` if it holds no IDs.
    pub fn load(path: &Path) -> Result<Self, ReferenceLoadError> {
        let entries = if is_vcf_path(path) {
            vcf::read_rsid_vcf(path)
        } else {
            tsv::read_rsid_table(path)
        }
        .map_err(|source| ReferenceLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if entries.is_empty() {
            return Err(ReferenceLoadError::Empty {
                path: path.to_path_buf(),
            });
        }

        let index = Self::from_entries(entries);
        info!("Loaded {} rsIDs from {}", index.len(), path.display());
        Ok(index)
    }

    #[must_use]
    pub fn lookup(&self, chrom: &str, pos: u64) -> Option<&str> {
        self.ids
            .get(chrom)
            .and_then(|by_pos| by_pos.get(&pos))
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
