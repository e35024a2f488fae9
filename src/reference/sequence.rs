//! Reference genome sequence used when no panel entry covers a site.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::core::allele::reverse_complement;
use crate::parsing::fasta::read_fasta;
use crate::reference::panel::ReferencePanelEntry;
use crate::reference::ReferenceLoadError;

/// Upper-case sequences keyed by normalized chromosome name
#[derive(Debug, Clone, Default)]
pub struct ReferenceSequence {
    sequences: HashMap<String, Vec<u8>>,
}

impl ReferenceSequence {
    pub fn from_sequences(sequences: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            sequences: sequences.into_iter().collect(),
        }
    }

    /// Load a FASTA file (plain or gzip)
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::Parse` if the FASTA cannot be read.
    pub fn load(path: &Path) -> Result<Self, ReferenceLoadError> {
        let sequences = read_fasta(path).map_err(|source| ReferenceLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let reference = Self::from_sequences(sequences);
        info!(
            "Loaded {} reference sequences from {}",
            reference.sequences.len(),
            path.display()
        );
        Ok(reference)
    }

    /// Bases at `pos..pos + len` (1-based), if entirely within the sequence
    #[must_use]
    pub fn fetch(&self, chrom: &str, pos: u64, len: usize) -> Option<&[u8]> {
        let seq = self.sequences.get(chrom)?;
        let start = usize::try_from(pos).ok()?.checked_sub(1)?;
        seq.get(start..start.checked_add(len)?)
    }

    /// Synthesize a panel entry for a record's alleles from the reference bases.
    ///
    /// The forward strand is tried first, then the reverse complement of both
    /// alleles. An allele that the reference reads at `pos` becomes REF and
    /// the other ALT. When both read, as with an indel whose alleles share a
    /// prefix, the longer one is REF. No frequency is attached.
    #[must_use]
    pub fn infer_entry(&self, chrom: &str, pos: u64, ea: &str, nea: &str) -> Option<ReferencePanelEntry> {
        if let Some(entry) = self.orient(chrom, pos, ea, nea) {
            return Some(entry);
        }
        let (comp_ea, comp_nea) = (reverse_complement(ea)?, reverse_complement(nea)?);
        self.orient(chrom, pos, &comp_ea, &comp_nea)
    }

    fn orient(&self, chrom: &str, pos: u64, ea: &str, nea: &str) -> Option<ReferencePanelEntry> {
        let reads = |allele: &str| {
            !allele.is_empty() && self.fetch(chrom, pos, allele.len()) == Some(allele.as_bytes())
        };

        match (reads(nea), reads(ea)) {
            (true, true) if ea.len() > nea.len() => Some(ReferencePanelEntry::new(chrom, pos, ea, nea)),
            (true, _) => Some(ReferencePanelEntry::new(chrom, pos, nea, ea)),
            (false, true) => Some(ReferencePanelEntry::new(chrom, pos, ea, nea)),
            (false, false) => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
