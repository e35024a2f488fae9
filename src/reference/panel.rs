//! Reference panel indexed by (chromosome, position).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::parsing::{is_vcf_path, tsv, vcf};
use crate::reference::ReferenceLoadError;

/// One biallelic reference site (multi-allelic sites become several entries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePanelEntry {
    pub chrom: String,

    /// 1-based position
    pub pos: u64,

    pub ref_allele: String,
    pub alt_allele: String,

    /// Alternate allele frequency, if the panel carries one
    pub alt_allele_freq: Option<f64>,

    pub rsid: Option<String>,
}

impl ReferencePanelEntry {
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        ref_allele: impl Into<String>,
        alt_allele: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            ref_allele: ref_allele.into(),
            alt_allele: alt_allele.into(),
            alt_allele_freq: None,
            rsid: None,
        }
    }

    #[must_use]
    pub fn with_freq(mut self, freq: f64) -> Self {
        self.alt_allele_freq = Some(freq);
        self
    }

    #[must_use]
    pub fn with_rsid(mut self, rsid: impl Into<String>) -> Self {
        self.rsid = Some(rsid.into());
        self
    }
}

/// Read-only site index. Entries at a site keep their load order.
#[derive(Debug, Clone, Default)]
pub struct ReferencePanel {
    sites: HashMap<String, HashMap<u64, Vec<ReferencePanelEntry>>>,
    entries: usize,
}

impl ReferencePanel {
    /// An empty panel: every lookup misses
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index from entries
    pub fn from_entries(entries: impl IntoIterator<Item = ReferencePanelEntry>) -> Self {
        let mut panel = Self::default();
        for entry in entries {
            panel
                .sites
                .entry(entry.chrom.clone())
                .or_default()
                .entry(entry.pos)
                .or_default()
                .push(entry);
            panel.entries += 1;
        }
        panel
    }

    /// Load a panel from a VCF (by extension) or a TSV file
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::Parse` if the file cannot be parsed or
    /// `ReferenceLoadError::Empty` if it holds no sites.
    pub fn load(path: &Path, af_key: &str) -> Result<Self, ReferenceLoadError> {
        let entries = if is_vcf_path(path) {
            vcf::read_panel_vcf(path, af_key)
        } else {
            tsv::read_panel_tsv(path)
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

        let panel = Self::from_entries(entries);
        info!(
            "Loaded reference panel {}: {} entries at {} sites",
            path.display(),
            panel.len(),
            panel.site_count()
        );
        Ok(panel)
    }

    /// Entries at a site, in load order (empty if the site is absent)
    #[must_use]
    pub fn candidates(&self, chrom: &str, pos: u64) -> &[ReferencePanelEntry] {
        self.sites
            .get(chrom)
            .and_then(|by_pos| by_pos.get(&pos))
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains_site(&self, chrom: &str, pos: u64) -> bool {
        !self.candidates(chrom, pos).is_empty()
    }

    /// Number of entries (multi-allelic sites count once per ALT)
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of distinct (chrom, pos) sites
    #[must_use]
    pub fn site_count(&self) -> usize {
        self.sites.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_candidates_keep_load_order() {
        let panel = ReferencePanel::from_entries(vec![
            ReferencePanelEntry::new("1", 100, "A", "G"),
            ReferencePanelEntry::new("1", 100, "A", "T"),
            ReferencePanelEntry::new("2", 100, "C", "T"),
        ]);

        assert_eq!(panel.len(), 3);
        assert_eq!(panel.site_count(), 2);

        let candidates = panel.candidates("1", 100);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].alt_allele, "G");
        assert_eq!(candidates[1].alt_allele, "T");

        assert!(panel.candidates("1", 101).is_empty());
        assert!(panel.candidates("3", 100).is_empty());
        assert!(!panel.contains_site("X", 1));
    }

    #[test]
    fn test_load_vcf_panel() {
        let mut file = NamedTempFile::with_suffix(".vcf").unwrap();
        file.write_all(b"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n1\t100000\trs1\tA\tG\t.\t.\tAF=0.2\n")
            .unwrap();
        file.flush().unwrap();

        let panel = ReferencePanel::load(file.path(), "AF").unwrap();
        assert_eq!(panel.candidates("1", 100_000)[0].alt_allele_freq, Some(0.2));
    }

    #[test]
    fn test_load_empty_panel_is_error() {
        let mut file = NamedTempFile::with_suffix(".tsv").unwrap();
        file.write_all(b"chrom\tpos\tref\talt\n").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            ReferencePanel::load(file.path(), "AF"),
            Err(ReferenceLoadError::Empty { .. })
        ));
    }
}
