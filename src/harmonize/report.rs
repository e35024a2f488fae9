use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::types::{Build, OutcomeHistogram};
use crate::harmonize::build::BuildInference;
use crate::harmonize::qc::QcSummary;
use crate::harmonize::rsid::RsidSummary;

/// Record counts entering and leaving one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub stage: String,
    pub input: usize,
    pub dropped: usize,
    pub retained: usize,
}

impl StageCounts {
    pub fn new(stage: impl Into<String>, input: usize, retained: usize) -> Self {
        Self {
            stage: stage.into(),
            input,
            dropped: input.saturating_sub(retained),
            retained,
        }
    }
}

/// Summary of a harmonization run, produced even when records are dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizationReport {
    /// RFC 3339 timestamp of report creation
    pub created_at: String,

    /// Build declared by the user, if any
    pub source_build: Option<Build>,

    /// Build inferred from the data, if inference ran and succeeded
    pub inferred_build: Option<BuildInference>,

    pub target_build: Option<Build>,
    pub liftover_applied: bool,

    pub input_records: usize,
    pub stages: Vec<StageCounts>,
    pub qc: QcSummary,
    pub rsid: Option<RsidSummary>,
    pub outcomes: OutcomeHistogram,

    /// Records removed after harmonization by the remove/ambiguous/invalid policies
    pub dropped_by_policy: usize,
    pub output_records: usize,
}

impl HarmonizationReport {
    pub fn new(input_records: usize) -> Self {
        Self {
            created_at: chrono::Utc::now().to_rfc3339(),
            source_build: None,
            inferred_build: None,
            target_build: None,
            liftover_applied: false,
            input_records,
            stages: Vec::new(),
            qc: QcSummary::default(),
            rsid: None,
            outcomes: OutcomeHistogram::default(),
            dropped_by_policy: 0,
            output_records: 0,
        }
    }

    /// Record the build context of the run
    #[must_use]
    pub fn with_builds(
        mut self,
        source: Option<Build>,
        inferred: Option<BuildInference>,
        target: Option<Build>,
    ) -> Self {
        self.source_build = source;
        self.inferred_build = inferred;
        self.target_build = target;
        self
    }

    /// Fraction of harmonized records aligned to the reference
    #[must_use]
    pub fn aligned_fraction(&self) -> f64 {
        let total = self.outcomes.total();
        if total == 0 {
            return 0.0;
        }
        let unaligned = self.outcomes.palindromic_ambiguous
            + self.outcomes.not_found_in_reference
            + self.outcomes.invalid_record;
        #[allow(clippy::cast_precision_loss)]
        let fraction = (total - unaligned) as f64 / total as f64;
        fraction
    }

    /// Emit the headline numbers through `tracing`
    pub fn log_summary(&self) {
        info!(
            "Harmonized {} input records -> {} output records ({:.1}% aligned)",
            self.input_records,
            self.output_records,
            self.aligned_fraction() * 100.0
        );
        for stage in &self.stages {
            info!(
                "  {:<12} in={} dropped={} kept={}",
                stage.stage, stage.input, stage.dropped, stage.retained
            );
        }
        for (tag, count) in self.outcomes.entries() {
            if count > 0 {
                info!("  {tag}: {count}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HarmonizationOutcome;

    #[test]
    fn test_stage_counts() {
        let stage = StageCounts::new("qc", 10, 7);
        assert_eq!(stage.dropped, 3);
    }

    #[test]
    fn test_aligned_fraction() {
        let mut report = HarmonizationReport::new(4);
        assert!(report.aligned_fraction().abs() < f64::EPSILON);

        report.outcomes.record(HarmonizationOutcome::MatchedForward);
        report.outcomes.record(HarmonizationOutcome::MatchedFlippedRefAlt);
        report.outcomes.record(HarmonizationOutcome::PalindromicAmbiguous);
        report.outcomes.record(HarmonizationOutcome::NotFoundInReference);
        assert!((report.aligned_fraction() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_report_serializes() {
        let report = HarmonizationReport::new(1).with_builds(Some(Build::Grch37), None, Some(Build::Grch38));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["input_records"], 1);
        assert_eq!(json["source_build"], "Grch37");
        assert!(json["created_at"].as_str().unwrap().contains('T'));
        assert_eq!(json["outcomes"]["MATCHED_FORWARD"], 0);
    }
}
