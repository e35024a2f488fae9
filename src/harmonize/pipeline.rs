//! Sharded, cancellable execution of QC, rsID resolution and harmonization.
//!
//! Records are split into shards of `shard_size`. Shards are processed in
//! batches of one shard per worker thread with an order-preserving parallel
//! map, and the cancellation token is checked between batches. Deduplication
//! needs the whole table and runs as a single pass in input order between
//! validation and harmonization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::types::{HarmonizationOutcome, OutcomeHistogram};
use crate::core::variant::{HarmonizedRecord, VariantRecord};
use crate::harmonize::harmonizer::Harmonizer;
use crate::harmonize::options::HarmonizeOptions;
use crate::harmonize::qc::{QcPolicy, QcSummary, QualityController};
use crate::harmonize::report::{HarmonizationReport, StageCounts};
use crate::harmonize::rsid::{RsidResolver, RsidSummary};
use crate::harmonize::HarmonizeError;
use crate::reference::liftover::ChainMap;
use crate::reference::panel::ReferencePanel;
use crate::reference::rsid::RsidIndex;
use crate::reference::sequence::ReferenceSequence;

/// Cooperative cancellation flag shared between a caller and a running pipeline
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Split records into consecutive shards of at most `shard_size`
pub fn into_shards<T>(records: Vec<T>, shard_size: usize) -> Vec<Vec<T>> {
    let shard_size = shard_size.max(1);
    let mut shards = Vec::with_capacity(records.len().div_ceil(shard_size));
    let mut iter = records.into_iter().peekable();
    while iter.peek().is_some() {
        shards.push(iter.by_ref().take(shard_size).collect());
    }
    shards
}

/// Configured harmonization run over shared, read-only reference data
pub struct Pipeline<'a> {
    panel: &'a ReferencePanel,
    rsid_index: Option<&'a RsidIndex>,
    sequence: Option<&'a ReferenceSequence>,
    liftover: Option<&'a ChainMap>,
    options: HarmonizeOptions,
    cancel: CancellationToken,
}

impl<'a> Pipeline<'a> {
    pub fn new(panel: &'a ReferencePanel, options: HarmonizeOptions) -> Self {
        Self {
            panel,
            rsid_index: None,
            sequence: None,
            liftover: None,
            options,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_rsid_index(mut self, index: Option<&'a RsidIndex>) -> Self {
        self.rsid_index = index;
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: Option<&'a ReferenceSequence>) -> Self {
        self.sequence = sequence;
        self
    }

    #[must_use]
    pub fn with_liftover(mut self, liftover: Option<&'a ChainMap>) -> Self {
        self.liftover = liftover;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run QC, rsID resolution and harmonization.
    ///
    /// Output records keep their input order regardless of thread count.
    ///
    /// # Errors
    ///
    /// Returns `HarmonizeError::Options` for invalid options,
    /// `HarmonizeError::ThreadPool` if a dedicated pool cannot be built, or
    /// `HarmonizeError::Cancelled` if the token is cancelled mid-run.
    pub fn run(
        &self,
        records: Vec<VariantRecord>,
    ) -> Result<(Vec<HarmonizedRecord>, HarmonizationReport), HarmonizeError> {
        self.options.validate()?;

        if self.options.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.threads)
                .build()
                .map_err(|e| HarmonizeError::ThreadPool(e.to_string()))?;
            pool.install(|| self.run_stages(records))
        } else {
            self.run_stages(records)
        }
    }

    fn run_stages(
        &self,
        records: Vec<VariantRecord>,
    ) -> Result<(Vec<HarmonizedRecord>, HarmonizationReport), HarmonizeError> {
        let opts = &self.options;
        let mut report = HarmonizationReport::new(records.len());
        report.liftover_applied = self.liftover.is_some();

        info!(
            "Harmonizing {} records ({} threads, shard size {})",
            records.len(),
            rayon::current_num_threads(),
            opts.shard_size
        );

        // Validation and chromosome filtering
        let qc = QualityController::new(QcPolicy {
            remove_invalid: opts.remove_invalid,
            remove_duplicates: opts.deduplicate,
        })
        .with_chromosomes(opts.chromosomes.as_deref());

        let checked = self.process_sharded(records, |shard| qc.check(shard))?;
        let mut qc_summary = QcSummary::default();
        let mut kept = Vec::new();
        for (shard, summary) in checked {
            qc_summary.merge(summary);
            kept.extend(shard);
        }
        report
            .stages
            .push(StageCounts::new("qc", qc_summary.total, kept.len()));

        // Global dedup in input order
        let before_dedup = kept.len();
        let (unique, removed) = qc.deduplicate(kept);
        qc_summary.duplicates_removed = removed;
        qc_summary.retained = unique.len();
        report
            .stages
            .push(StageCounts::new("deduplicate", before_dedup, unique.len()));
        report.qc = qc_summary;

        // rsID resolution and harmonization
        let harmonizer = Harmonizer::new(self.panel, opts.palindromic_threshold)
            .with_sequence(self.sequence)
            .with_liftover(self.liftover);
        let resolver = self
            .rsid_index
            .map(|index| RsidResolver::new(index, opts.rsid_overwrite));

        let to_harmonize = unique.len();
        let processed = self.process_sharded(unique, |mut shard| {
            let rsid = resolver.map(|r| r.resolve_all(&mut shard));
            let (harmonized, histogram) = harmonizer.harmonize_all(shard);
            (harmonized, histogram, rsid)
        })?;

        let mut outcomes = OutcomeHistogram::default();
        let mut rsid_summary: Option<RsidSummary> = None;
        let mut harmonized = Vec::with_capacity(to_harmonize);
        for (shard, histogram, rsid) in processed {
            outcomes.merge(&histogram);
            if let Some(rsid) = rsid {
                rsid_summary.get_or_insert_with(RsidSummary::default).merge(&rsid);
            }
            harmonized.extend(shard);
        }
        report
            .stages
            .push(StageCounts::new("harmonize", to_harmonize, harmonized.len()));
        report.outcomes = outcomes;
        report.rsid = rsid_summary;

        // Outcome policies
        let before_policy = harmonized.len();
        harmonized.retain(|h| !self.drops(h.outcome));
        report.dropped_by_policy = before_policy - harmonized.len();
        report
            .stages
            .push(StageCounts::new("policy", before_policy, harmonized.len()));
        report.output_records = harmonized.len();

        Ok((harmonized, report))
    }

    /// Whether the outcome policies remove a record with this outcome
    fn drops(&self, outcome: HarmonizationOutcome) -> bool {
        match outcome {
            HarmonizationOutcome::NotFoundInReference => self.options.remove,
            HarmonizationOutcome::PalindromicAmbiguous => self.options.remove_ambiguous,
            HarmonizationOutcome::InvalidRecord => self.options.remove_invalid,
            _ => false,
        }
    }

    /// Apply `f` to each shard in parallel, preserving shard order
    fn process_sharded<T, R, F>(&self, records: Vec<T>, f: F) -> Result<Vec<R>, HarmonizeError>
    where
        T: Send,
        R: Send,
        F: Fn(Vec<T>) -> R + Sync + Send,
    {
        let shards = into_shards(records, self.options.shard_size);
        let batch_size = rayon::current_num_threads().max(1);
        let mut results = Vec::with_capacity(shards.len());
        let mut remaining = shards.into_iter();

        loop {
            if self.cancel.is_cancelled() {
                debug!("Cancellation requested after {} shards", results.len());
                return Err(HarmonizeError::Cancelled);
            }

            let batch: Vec<Vec<T>> = remaining.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let processed: Vec<R> = batch.into_par_iter().map(&f).collect();
            results.extend(processed);
        }

        Ok(results)
    }
}

/// Harmonize records against a panel with an optional rsID table.
///
/// # Errors
///
/// See [`Pipeline::run`].
pub fn harmonize(
    records: Vec<VariantRecord>,
    panel: &ReferencePanel,
    rsid_index: Option<&RsidIndex>,
    options: &HarmonizeOptions,
) -> Result<(Vec<HarmonizedRecord>, HarmonizationReport), HarmonizeError> {
    Pipeline::new(panel, options.clone())
        .with_rsid_index(rsid_index)
        .run(records)
}
