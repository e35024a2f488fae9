//! Record-level alignment of summary statistics to a reference panel.
//!
//! [`decide`] is a pure function: given a record and the panel entries at its
//! site it returns the outcome plus the alignment to apply. [`Harmonizer`]
//! wraps it with site lookup, optional liftover and the FASTA fallback, then
//! applies the alignment to the record.
//!
//! Every aligned record ends up written as `ea = alt, nea = ref`, so running
//! the harmonizer again on its own output only produces `MATCHED_FORWARD`
//! (palindromic sites resolve the same way twice as well).

use tracing::debug;

use crate::core::allele::{classify_allele, is_palindromic, reverse_complement};
use crate::core::types::{HarmonizationOutcome, OutcomeHistogram};
use crate::core::variant::{HarmonizedRecord, VariantRecord};
use crate::reference::liftover::{ChainMap, Strand};
use crate::reference::panel::{ReferencePanel, ReferencePanelEntry};
use crate::reference::sequence::ReferenceSequence;

/// How a record's alleles relate to a panel entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// ea = alt, nea = ref
    Forward,
    /// ea = ref, nea = alt
    RefAlt,
    /// Complemented alleles are ea = alt, nea = ref
    Strand,
    /// Complemented alleles are ea = ref, nea = alt
    Both,
}

impl Orientation {
    fn outcome(self) -> HarmonizationOutcome {
        match self {
            Self::Forward => HarmonizationOutcome::MatchedForward,
            Self::RefAlt => HarmonizationOutcome::MatchedFlippedRefAlt,
            Self::Strand => HarmonizationOutcome::MatchedFlippedStrand,
            Self::Both => HarmonizationOutcome::MatchedFlippedBoth,
        }
    }

    fn flips_effect(self) -> bool {
        matches!(self, Self::RefAlt | Self::Both)
    }
}

/// Compare a pair of alleles with a panel entry in all four orientations
#[must_use]
pub fn match_orientation(ea: &str, nea: &str, entry: &ReferencePanelEntry) -> Option<Orientation> {
    let (ref_allele, alt_allele) = (entry.ref_allele.as_str(), entry.alt_allele.as_str());

    if ea == alt_allele && nea == ref_allele {
        return Some(Orientation::Forward);
    }
    if ea == ref_allele && nea == alt_allele {
        return Some(Orientation::RefAlt);
    }

    let comp_ea = reverse_complement(ea)?;
    let comp_nea = reverse_complement(nea)?;
    if comp_ea == alt_allele && comp_nea == ref_allele {
        return Some(Orientation::Strand);
    }
    if comp_ea == ref_allele && comp_nea == alt_allele {
        return Some(Orientation::Both);
    }
    None
}

/// Relabel a record to `ea = entry.alt, nea = entry.ref`, flipping the effect if needed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment<'a> {
    pub entry: &'a ReferencePanelEntry,
    pub flip: bool,
}

/// Outcome of the decision procedure for one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision<'a> {
    pub outcome: HarmonizationOutcome,
    pub alignment: Option<Alignment<'a>>,
}

impl<'a> Decision<'a> {
    fn unaligned(outcome: HarmonizationOutcome) -> Self {
        Self {
            outcome,
            alignment: None,
        }
    }

    fn aligned(outcome: HarmonizationOutcome, entry: &'a ReferencePanelEntry, flip: bool) -> Self {
        Self {
            outcome,
            alignment: Some(Alignment { entry, flip }),
        }
    }
}

/// Side of the frequency spectrum a value confidently lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FreqSide {
    High,
    Low,
}

fn freq_side(freq: f64, threshold: f64) -> Option<FreqSide> {
    if freq >= threshold {
        Some(FreqSide::High)
    } else if freq <= 1.0 - threshold {
        Some(FreqSide::Low)
    } else {
        None
    }
}

/// Whether a record passes validation and carries plain nucleotide alleles
fn is_comparable(record: &VariantRecord) -> bool {
    record.validate().is_ok()
        && classify_allele(&record.ea).is_harmonizable()
        && classify_allele(&record.nea).is_harmonizable()
}

/// Decide how to align `record` against the panel entries at its site.
///
/// Entries are tried in load order. A non-palindromic record takes the first
/// entry matching in any orientation. A palindromic (A/T or C/G) record takes
/// the first matching entry and is oriented by comparing its `eaf` with the
/// entry's alt frequency: both must lie at or beyond `threshold` or at or
/// below `1 - threshold`, otherwise the record is left ambiguous.
#[must_use]
pub fn decide<'a>(
    record: &VariantRecord,
    candidates: &'a [ReferencePanelEntry],
    threshold: f64,
) -> Decision<'a> {
    if !is_comparable(record) {
        return Decision::unaligned(HarmonizationOutcome::InvalidRecord);
    }

    let palindromic = is_palindromic(&record.ea, &record.nea);
    let matched = candidates
        .iter()
        .find_map(|entry| match_orientation(&record.ea, &record.nea, entry).map(|o| (entry, o)));

    let Some((entry, orientation)) = matched else {
        return Decision::unaligned(HarmonizationOutcome::NotFoundInReference);
    };

    if !palindromic {
        return Decision::aligned(orientation.outcome(), entry, orientation.flips_effect());
    }

    let sides = record
        .eaf
        .zip(entry.alt_allele_freq)
        .map(|(eaf, ref_af)| (freq_side(eaf, threshold), freq_side(ref_af, threshold)));

    match sides {
        Some((Some(record_side), Some(ref_side))) => {
            let flipped = record_side != ref_side;
            Decision::aligned(
                HarmonizationOutcome::PalindromicResolvedByFreq { flipped },
                entry,
                flipped,
            )
        }
        _ => Decision::unaligned(HarmonizationOutcome::PalindromicAmbiguous),
    }
}

/// Apply a decision's alignment to a record
pub fn apply(record: &mut VariantRecord, decision: &Decision<'_>) {
    let Some(Alignment { entry, flip }) = decision.alignment else {
        return;
    };

    record.ea.clone_from(&entry.alt_allele);
    record.nea.clone_from(&entry.ref_allele);
    if flip {
        record.flip_effect();
    }
    if record.rsid.is_none() {
        record.rsid.clone_from(&entry.rsid);
    }
}

/// Aligns records to a reference panel
#[derive(Debug, Clone, Copy)]
pub struct Harmonizer<'a> {
    panel: &'a ReferencePanel,
    sequence: Option<&'a ReferenceSequence>,
    liftover: Option<&'a ChainMap>,
    threshold: f64,
}

impl<'a> Harmonizer<'a> {
    pub fn new(panel: &'a ReferencePanel, threshold: f64) -> Self {
        Self {
            panel,
            sequence: None,
            liftover: None,
            threshold,
        }
    }

    /// Fall back to reference bases when the panel has no entry at a site
    #[must_use]
    pub fn with_sequence(mut self, sequence: Option<&'a ReferenceSequence>) -> Self {
        self.sequence = sequence;
        self
    }

    /// Lift each record to the panel's build before lookup
    #[must_use]
    pub fn with_liftover(mut self, liftover: Option<&'a ChainMap>) -> Self {
        self.liftover = liftover;
        self
    }

    /// Harmonize one record
    pub fn harmonize_record(&self, mut record: VariantRecord) -> HarmonizedRecord {
        // Invalid records are tagged before any coordinate change
        if !is_comparable(&record) {
            return HarmonizedRecord {
                record,
                outcome: HarmonizationOutcome::InvalidRecord,
            };
        }

        if let Some(chains) = self.liftover {
            if !lift_record(chains, &mut record) {
                return HarmonizedRecord {
                    record,
                    outcome: HarmonizationOutcome::NotFoundInReference,
                };
            }
        }

        let mut candidates = self.panel.candidates(&record.chrom, record.pos);
        let synthesized;
        if candidates.is_empty() {
            if let Some(entry) = self
                .sequence
                .and_then(|seq| seq.infer_entry(&record.chrom, record.pos, &record.ea, &record.nea))
            {
                synthesized = entry;
                candidates = std::slice::from_ref(&synthesized);
            }
        }

        let decision = decide(&record, candidates, self.threshold);
        apply(&mut record, &decision);

        HarmonizedRecord {
            record,
            outcome: decision.outcome,
        }
    }

    /// Harmonize records in order, tallying outcomes
    pub fn harmonize_all(
        &self,
        records: impl IntoIterator<Item = VariantRecord>,
    ) -> (Vec<HarmonizedRecord>, OutcomeHistogram) {
        let mut histogram = OutcomeHistogram::default();
        let harmonized: Vec<HarmonizedRecord> = records
            .into_iter()
            .map(|record| {
                let result = self.harmonize_record(record);
                histogram.record(result.outcome);
                result
            })
            .collect();
        (harmonized, histogram)
    }
}

/// Move a record onto the lifted coordinates.
///
/// On a minus-strand chain the alleles are reverse-complemented and the new
/// position is that of the last base of `nea`. Returns false when the
/// position does not lift.
fn lift_record(chains: &ChainMap, record: &mut VariantRecord) -> bool {
    let Some(lifted) = chains.lift(&record.chrom, record.pos) else {
        debug!("{}:{} did not lift", record.chrom, record.pos);
        return false;
    };

    match lifted.strand {
        Strand::Plus => {
            record.chrom = lifted.chrom;
            record.pos = lifted.pos;
            true
        }
        Strand::Minus => {
            let span = record.nea.len().max(1) as u64;
            let end = if span > 1 {
                chains.lift(&record.chrom, record.pos + span - 1)
            } else {
                Some(lifted)
            };
            let Some(end) = end else {
                return false;
            };
            if !record.complement_alleles() {
                return false;
            }
            record.chrom = end.chrom;
            record.pos = end.pos;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ref_allele: &str, alt_allele: &str) -> ReferencePanelEntry {
        ReferencePanelEntry::new("1", 100_000, ref_allele, alt_allele)
    }

    fn record(ea: &str, nea: &str) -> VariantRecord {
        VariantRecord::new("1", 100_000, ea, nea)
            .with_eaf(0.2)
            .with_beta(0.05)
            .with_se(0.01)
    }

    #[test]
    fn test_match_orientation() {
        let e = entry("A", "G");
        assert_eq!(match_orientation("G", "A", &e), Some(Orientation::Forward));
        assert_eq!(match_orientation("A", "G", &e), Some(Orientation::RefAlt));
        assert_eq!(match_orientation("C", "T", &e), Some(Orientation::Strand));
        assert_eq!(match_orientation("T", "C", &e), Some(Orientation::Both));
        assert_eq!(match_orientation("G", "C", &e), None);
    }

    #[test]
    fn test_decide_forward_and_ref_alt() {
        let candidates = [entry("A", "G")];

        let d = decide(&record("G", "A"), &candidates, 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::MatchedForward);
        assert!(!d.alignment.unwrap().flip);

        let d = decide(&record("A", "G"), &candidates, 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
        assert!(d.alignment.unwrap().flip);
    }

    #[test]
    fn test_decide_not_found_and_invalid() {
        let candidates = [entry("A", "G")];
        let d = decide(&record("C", "A"), &candidates, 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::NotFoundInReference);

        let d = decide(&record("G", "A"), &[], 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::NotFoundInReference);

        let d = decide(&record("N", "A"), &candidates, 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::InvalidRecord);

        let d = decide(&record("<DEL>", "A"), &candidates, 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::InvalidRecord);
    }

    #[test]
    fn test_decide_multi_allelic_uses_matching_entry() {
        let candidates = [entry("A", "C"), entry("A", "G")];
        let d = decide(&record("A", "G"), &candidates, 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
        assert_eq!(d.alignment.unwrap().entry.alt_allele, "G");
    }

    #[test]
    fn test_palindromic_resolution() {
        let candidates = [entry("T", "A").with_freq(0.01)];

        // Opposite sides: effect allele is ref
        let r = record("A", "T").with_eaf(0.995);
        let d = decide(&r, &candidates, 0.99);
        assert_eq!(
            d.outcome,
            HarmonizationOutcome::PalindromicResolvedByFreq { flipped: true }
        );

        // Same side: effect allele is alt
        let r = record("A", "T").with_eaf(0.005);
        let d = decide(&r, &candidates, 0.99);
        assert_eq!(
            d.outcome,
            HarmonizationOutcome::PalindromicResolvedByFreq { flipped: false }
        );

        // Middle band
        let r = record("A", "T").with_eaf(0.5);
        let d = decide(&r, &candidates, 0.99);
        assert_eq!(d.outcome, HarmonizationOutcome::PalindromicAmbiguous);
        assert!(d.alignment.is_none());
    }

    #[test]
    fn test_palindromic_boundaries() {
        // eaf exactly at the threshold is confident
        let candidates = [entry("T", "A").with_freq(0.01)];
        let r = record("A", "T").with_eaf(0.99);
        assert!(decide(&r, &candidates, 0.99).outcome.is_aligned());

        // Reference AF of 0.5 is never confident
        let candidates = [entry("T", "A").with_freq(0.5)];
        let r = record("A", "T").with_eaf(0.995);
        assert_eq!(
            decide(&r, &candidates, 0.99).outcome,
            HarmonizationOutcome::PalindromicAmbiguous
        );

        // No frequency on the record
        let candidates = [entry("T", "A").with_freq(0.01)];
        let mut r = record("A", "T");
        r.eaf = None;
        assert_eq!(
            decide(&r, &candidates, 0.99).outcome,
            HarmonizationOutcome::PalindromicAmbiguous
        );
    }

    #[test]
    fn test_apply_strand_flip() {
        let panel = ReferencePanel::from_entries(vec![entry("A", "G").with_rsid("rs42")]);
        let harmonizer = Harmonizer::new(&panel, 0.99);

        let result = harmonizer.harmonize_record(record("C", "T"));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedFlippedStrand);
        assert_eq!(result.record.ea, "G");
        assert_eq!(result.record.nea, "A");
        assert_eq!(result.record.beta, Some(0.05));
        assert_eq!(result.record.eaf, Some(0.2));
        assert_eq!(result.record.rsid.as_deref(), Some("rs42"));
    }

    #[test]
    fn test_apply_both_flips() {
        let panel = ReferencePanel::from_entries(vec![entry("A", "G")]);
        let harmonizer = Harmonizer::new(&panel, 0.99);

        let result = harmonizer.harmonize_record(record("T", "C"));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedFlippedBoth);
        assert_eq!(result.record.ea, "G");
        assert_eq!(result.record.nea, "A");
        assert!((result.record.beta.unwrap() + 0.05).abs() < 1e-12);
        assert!((result.record.eaf.unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(result.record.se, Some(0.01));
    }

    #[test]
    fn test_existing_rsid_is_kept() {
        let panel = ReferencePanel::from_entries(vec![entry("A", "G").with_rsid("rs42")]);
        let harmonizer = Harmonizer::new(&panel, 0.99);
        let result = harmonizer.harmonize_record(record("G", "A").with_rsid("rs7"));
        assert_eq!(result.record.rsid.as_deref(), Some("rs7"));
    }

    #[test]
    fn test_indel_matching() {
        let panel = ReferencePanel::from_entries(vec![entry("AC", "A")]);
        let harmonizer = Harmonizer::new(&panel, 0.99);

        let result = harmonizer.harmonize_record(record("AC", "A"));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
        assert_eq!(result.record.ea, "A");
        assert_eq!(result.record.nea, "AC");

        // Reverse complement of AC is GT
        let result = harmonizer.harmonize_record(record("T", "GT"));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedFlippedStrand);
    }

    #[test]
    fn test_sequence_fallback() {
        let panel = ReferencePanel::empty();
        let sequence = ReferenceSequence::from_sequences(vec![("1".to_string(), b"ACGT".to_vec())]);
        let harmonizer = Harmonizer::new(&panel, 0.99).with_sequence(Some(&sequence));

        let mut r = VariantRecord::new("1", 2, "C", "T").with_beta(0.3);
        r.eaf = Some(0.4);
        let result = harmonizer.harmonize_record(r);
        // Reference base C equals ea, so the effect allele is the reference allele
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
        assert_eq!(result.record.ea, "T");
        assert!((result.record.beta.unwrap() + 0.3).abs() < 1e-12);

        // Neither C/G nor its complement reads A at position 1
        let result = harmonizer.harmonize_record(VariantRecord::new("1", 1, "C", "G"));
        assert_eq!(result.outcome, HarmonizationOutcome::NotFoundInReference);
    }

    #[test]
    fn test_sequence_fallback_deletion_orientation() {
        let panel = ReferencePanel::empty();
        let sequence = ReferenceSequence::from_sequences(vec![("1".to_string(), b"ACGT".to_vec())]);
        let harmonizer = Harmonizer::new(&panel, 0.99).with_sequence(Some(&sequence));

        // Reference carries AC, so effect allele AC is REF and the record flips
        let result = harmonizer.harmonize_record(VariantRecord::new("1", 1, "AC", "A").with_beta(0.3));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
        assert_eq!(result.record.ea, "A");
        assert_eq!(result.record.nea, "AC");
        assert!((result.record.beta.unwrap() + 0.3).abs() < 1e-12);

        // Deletion reported with the effect allele already ALT
        let result = harmonizer.harmonize_record(VariantRecord::new("1", 1, "A", "AC").with_beta(0.3));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedForward);
        assert_eq!(result.record.ea, "A");
        assert_eq!(result.record.nea, "AC");
        assert!((result.record.beta.unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_liftover_before_lookup() {
        let chains = ChainMap::parse(
            "chain 100 chr1 1000 + 0 1000 chr1 2000 + 500 1500 1\n1000\n\
             chain 100 chr2 1000 + 0 1000 chr2 1000 - 0 1000 2\n1000\n"
                .as_bytes(),
        )
        .unwrap();
        let panel = ReferencePanel::from_entries(vec![
            ReferencePanelEntry::new("1", 600, "A", "G"),
            ReferencePanelEntry::new("2", 991, "A", "G"),
        ]);
        let harmonizer = Harmonizer::new(&panel, 0.99).with_liftover(Some(&chains));

        let result = harmonizer.harmonize_record(VariantRecord::new("1", 100, "G", "A"));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedForward);
        assert_eq!(result.record.pos, 600);

        // Minus strand: 1-based 10 -> 1000 - 9 = 991, alleles complemented C/T -> G/A
        let result = harmonizer.harmonize_record(VariantRecord::new("2", 10, "C", "T"));
        assert_eq!(result.outcome, HarmonizationOutcome::MatchedForward);
        assert_eq!(result.record.pos, 991);
        assert_eq!(result.record.ea, "G");

        let result = harmonizer.harmonize_record(VariantRecord::new("3", 10, "C", "T"));
        assert_eq!(result.outcome, HarmonizationOutcome::NotFoundInReference);
        assert_eq!(result.record.chrom, "3");
    }

    #[test]
    fn test_harmonize_all_histogram() {
        let panel = ReferencePanel::from_entries(vec![entry("A", "G")]);
        let harmonizer = Harmonizer::new(&panel, 0.99);
        let (records, histogram) = harmonizer.harmonize_all(vec![
            record("G", "A"),
            record("A", "G"),
            VariantRecord::new("2", 5, "A", "G"),
        ]);
        assert_eq!(records.len(), 3);
        assert_eq!(histogram.matched_forward, 1);
        assert_eq!(histogram.matched_flipped_ref_alt, 1);
        assert_eq!(histogram.not_found_in_reference, 1);
    }
}
