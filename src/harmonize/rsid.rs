//! rsID assignment from a position lookup table.

use serde::{Deserialize, Serialize};

use crate::core::variant::VariantRecord;
use crate::harmonize::options::RsidOverwrite;
use crate::reference::rsid::RsidIndex;
use crate::utils::validation::is_valid_rsid;

/// Counts from an rsID resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsidSummary {
    /// Records whose SNPID was already an rsID and was copied over
    pub promoted: usize,
    /// Records without an rsID that received one
    pub assigned: usize,
    /// Records whose existing rsID was replaced
    pub overwritten: usize,
    /// Records left without an rsID
    pub unresolved: usize,
}

impl RsidSummary {
    pub fn merge(&mut self, other: &Self) {
        self.promoted += other.promoted;
        self.assigned += other.assigned;
        self.overwritten += other.overwritten;
        self.unresolved += other.unresolved;
    }
}

/// Fills or replaces rsIDs by (chrom, pos) lookup. Misses are never errors.
#[derive(Debug, Clone, Copy)]
pub struct RsidResolver<'a> {
    index: &'a RsidIndex,
    policy: RsidOverwrite,
}

impl<'a> RsidResolver<'a> {
    pub fn new(index: &'a RsidIndex, policy: RsidOverwrite) -> Self {
        Self { index, policy }
    }

    fn wants_lookup(&self, current: Option<&str>) -> bool {
        match (self.policy, current) {
            (_, None) | (RsidOverwrite::All, _) => true,
            (RsidOverwrite::Invalid, Some(id)) => !is_valid_rsid(id),
            (RsidOverwrite::Empty, Some(_)) => false,
        }
    }

    /// Resolve a single record, updating `summary`
    pub fn resolve(&self, record: &mut VariantRecord, summary: &mut RsidSummary) {
        if record.rsid.is_none() {
            if let Some(snpid) = record.snpid.as_deref().filter(|id| is_valid_rsid(id)) {
                record.rsid = Some(snpid.to_string());
                summary.promoted += 1;
            }
        }

        if !self.wants_lookup(record.rsid.as_deref()) {
            return;
        }

        let Some(found) = self.index.lookup(&record.chrom, record.pos) else {
            if record.rsid.is_none() {
                summary.unresolved += 1;
            }
            return;
        };

        match record.rsid.as_deref() {
            None => summary.assigned += 1,
            Some(existing) if existing != found => summary.overwritten += 1,
            Some(_) => return,
        }
        record.rsid = Some(found.to_string());
    }

    /// Resolve every record in place
    pub fn resolve_all(&self, records: &mut [VariantRecord]) -> RsidSummary {
        let mut summary = RsidSummary::default();
        for record in records.iter_mut() {
            self.resolve(record, &mut summary);
        }
        summary
    }
}
