//! Record validation and deduplication.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::variant::{InvalidReason, InvalidRecordError, VariantRecord};

/// Maximum number of invalid-record examples kept in a summary
pub const MAX_INVALID_EXAMPLES: usize = 100;

/// What to do with records that fail checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcPolicy {
    pub remove_invalid: bool,
    pub remove_duplicates: bool,
}

impl Default for QcPolicy {
    fn default() -> Self {
        Self {
            remove_invalid: true,
            remove_duplicates: true,
        }
    }
}

/// Counts from a QC pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QcSummary {
    pub total: usize,

    /// Records failing validation (dropped or kept per policy)
    pub invalid: usize,
    pub invalid_by_reason: BTreeMap<InvalidReason, usize>,

    /// Records with IUPAC-ambiguous or structural alleles, passed on
    pub flagged_nonstandard: usize,

    /// Records outside the chromosome allow-list
    pub filtered_chrom: usize,

    pub duplicates_removed: usize,
    pub retained: usize,

    /// First few invalid records, for the report
    pub invalid_examples: Vec<InvalidRecordError>,
}

impl QcSummary {
    /// Fold another shard's summary into this one
    pub fn merge(&mut self, other: Self) {
        self.total += other.total;
        self.invalid += other.invalid;
        for (reason, count) in other.invalid_by_reason {
            *self.invalid_by_reason.entry(reason).or_default() += count;
        }
        self.flagged_nonstandard += other.flagged_nonstandard;
        self.filtered_chrom += other.filtered_chrom;
        self.duplicates_removed += other.duplicates_removed;
        self.retained += other.retained;

        let room = MAX_INVALID_EXAMPLES.saturating_sub(self.invalid_examples.len());
        self.invalid_examples
            .extend(other.invalid_examples.into_iter().take(room));
    }

    /// Records dropped by this pass
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.total.saturating_sub(self.retained)
    }
}

/// Validates records and removes duplicates
#[derive(Debug, Clone, Default)]
pub struct QualityController<'a> {
    policy: QcPolicy,
    chromosomes: Option<&'a [String]>,
}

impl<'a> QualityController<'a> {
    pub fn new(policy: QcPolicy) -> Self {
        Self {
            policy,
            chromosomes: None,
        }
    }

    /// Only keep records on these chromosomes
    #[must_use]
    pub fn with_chromosomes(mut self, chromosomes: Option<&'a [String]>) -> Self {
        self.chromosomes = chromosomes;
        self
    }

    /// Validate a batch of records, preserving order.
    ///
    /// Does not deduplicate; that needs the whole table (see [`Self::deduplicate`]).
    /// `retained` in the returned summary counts the records returned.
    pub fn check(&self, records: Vec<VariantRecord>) -> (Vec<VariantRecord>, QcSummary) {
        let mut summary = QcSummary {
            total: records.len(),
            ..QcSummary::default()
        };
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if let Some(allowed) = self.chromosomes {
                if !allowed.iter().any(|c| *c == record.chrom) {
                    summary.filtered_chrom += 1;
                    continue;
                }
            }

            if let Err(err) = record.validate() {
                summary.invalid += 1;
                *summary.invalid_by_reason.entry(err.reason).or_default() += 1;
                if summary.invalid_examples.len() < MAX_INVALID_EXAMPLES {
                    summary.invalid_examples.push(err);
                }
                if self.policy.remove_invalid {
                    continue;
                }
            } else if record.has_nonstandard_allele() {
                summary.flagged_nonstandard += 1;
            }

            kept.push(record);
        }

        summary.retained = kept.len();
        (kept, summary)
    }

    /// Remove repeated (chrom, pos, ea, nea) records, keeping the first by input order.
    ///
    /// Returns the surviving records and the number removed. A no-op when the
    /// policy keeps duplicates.
    pub fn deduplicate(&self, records: Vec<VariantRecord>) -> (Vec<VariantRecord>, usize) {
        if !self.policy.remove_duplicates {
            return (records, 0);
        }

        let before = records.len();
        let first: Vec<bool> = {
            let mut seen = HashSet::with_capacity(before);
            records.iter().map(|r| seen.insert(r.identity_key())).collect()
        };
        let unique: Vec<VariantRecord> = records
            .into_iter()
            .zip(first)
            .filter_map(|(record, keep)| keep.then_some(record))
            .collect();

        let removed = before - unique.len();
        if removed > 0 {
            debug!("Removed {removed} duplicate records");
        }
        (unique, removed)
    }

    /// Validate then deduplicate a whole table
    pub fn run(&self, records: Vec<VariantRecord>) -> (Vec<VariantRecord>, QcSummary) {
        let (checked, mut summary) = self.check(records);
        let (unique, removed) = self.deduplicate(checked);
        summary.duplicates_removed = removed;
        summary.retained = unique.len();
        (unique, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(line: usize, chrom: &str, pos: u64, ea: &str, nea: &str) -> VariantRecord {
        VariantRecord::new(chrom, pos, ea, nea).with_line(line)
    }

    #[test]
    fn test_invalid_records_dropped() {
        let qc = QualityController::new(QcPolicy::default());
        let records = vec![
            rec(0, "1", 100, "A", "G"),
            rec(1, "1", 0, "A", "G"),
            rec(2, "1", 200, "A", "A"),
            rec(3, "1", 300, "A", "G").with_eaf(1.5),
            rec(4, "1", 400, "A", "G").with_se(-1.0),
            rec(5, "1", 500, "1", "G"),
            rec(6, "1", 600, "N", "G"),
        ];

        let (kept, summary) = qc.run(records);
        assert_eq!(kept.len(), 2);
        assert_eq!(summary.total, 7);
        assert_eq!(summary.invalid, 5);
        assert_eq!(summary.flagged_nonstandard, 1);
        assert_eq!(summary.invalid_by_reason[&InvalidReason::BadPosition], 1);
        assert_eq!(summary.invalid_by_reason[&InvalidReason::IdenticalAlleles], 1);
        assert_eq!(summary.invalid_by_reason[&InvalidReason::BadFrequency], 1);
        assert_eq!(summary.invalid_by_reason[&InvalidReason::BadStatistic], 1);
        assert_eq!(summary.invalid_by_reason[&InvalidReason::BadAllele], 1);
        assert_eq!(summary.invalid_examples[0].line, 1);
        assert_eq!(summary.retained, 2);
    }

    #[test]
    fn test_keep_invalid_policy() {
        let qc = QualityController::new(QcPolicy {
            remove_invalid: false,
            remove_duplicates: true,
        });
        let (kept, summary) = qc.run(vec![rec(0, "1", 0, "A", "G")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(summary.invalid, 1);
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let qc = QualityController::new(QcPolicy::default());
        let records = vec![
            rec(0, "1", 100, "A", "G").with_beta(0.1),
            rec(1, "1", 100, "A", "G").with_beta(0.2),
            rec(2, "1", 100, "G", "A"),
            rec(3, "2", 100, "A", "G"),
            rec(4, "2", 100, "A", "G"),
        ];
        let (unique, removed) = qc.deduplicate(records);
        assert_eq!(removed, 2);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].beta, Some(0.1));
        assert_eq!(
            unique.iter().map(|r| r.line).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
    }

    #[test]
    fn test_chromosome_filter() {
        let allowed = vec!["1".to_string()];
        let qc = QualityController::new(QcPolicy::default()).with_chromosomes(Some(&allowed));
        let (kept, summary) = qc.check(vec![rec(0, "1", 1, "A", "G"), rec(1, "2", 1, "A", "G")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(summary.filtered_chrom, 1);
    }

    #[test]
    fn test_merge_caps_examples() {
        let mut a = QcSummary::default();
        for line in 0..MAX_INVALID_EXAMPLES {
            a.invalid_examples
                .push(InvalidRecordError::new(line, InvalidReason::BadPosition));
        }
        let mut b = QcSummary {
            total: 3,
            invalid: 1,
            ..QcSummary::default()
        };
        b.invalid_examples
            .push(InvalidRecordError::new(999, InvalidReason::BadAllele));
        b.invalid_by_reason.insert(InvalidReason::BadAllele, 1);

        a.merge(b);
        assert_eq!(a.total, 3);
        assert_eq!(a.invalid_examples.len(), MAX_INVALID_EXAMPLES);
        assert_eq!(a.invalid_by_reason[&InvalidReason::BadAllele], 1);
    }
}
