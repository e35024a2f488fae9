//! Genome build inference from position/allele concordance.
//!
//! A fixed-stride sample of records is looked up in one signature panel per
//! candidate build. For each build the score is the fraction of sampled
//! records found at a panel site whose alleles also match that site in some
//! orientation. Sampling is deterministic so the same input always infers the
//! same build.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::types::Build;
use crate::core::variant::VariantRecord;
use crate::harmonize::harmonizer::match_orientation;
use crate::reference::panel::ReferencePanel;

/// Scores closer than this are considered tied
const TIE_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildInferenceError {
    #[error("No records with a usable position to sample")]
    NoRecords,

    #[error("No candidate builds were supplied")]
    NoCandidates,

    #[error("Too few reference hits to infer the build (best: {hits}, need {min_hits})")]
    InsufficientHits { hits: usize, min_hits: usize },

    #[error("Best build {build} scored {score:.3}, below the minimum of {min_score:.3}")]
    LowConfidence {
        build: Build,
        score: f64,
        min_score: f64,
    },

    #[error("Builds {first} and {second} are tied at {score:.3}")]
    Ambiguous {
        first: Build,
        second: Build,
        score: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInferenceConfig {
    /// Maximum number of records sampled
    pub max_samples: usize,

    /// Minimum match rate for the winning build
    pub min_score: f64,

    /// Minimum number of sampled records found in the winning build's panel
    pub min_hits: usize,
}

impl Default for BuildInferenceConfig {
    fn default() -> Self {
        Self {
            max_samples: 10_000,
            min_score: 0.8,
            min_hits: 20,
        }
    }
}

/// Concordance of the sample with one build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildScore {
    pub build: Build,

    /// Sampled records with a panel entry at their position
    pub hits: usize,

    /// Hits whose alleles also match
    pub matches: usize,

    /// `matches / hits`, or 0 when there are no hits
    pub score: f64,
}

/// Successful build inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInference {
    pub build: Build,
    pub score: f64,
    pub scores: Vec<BuildScore>,
    pub sampled: usize,
}

/// Infers the build of a record table against per-build signature panels
pub struct BuildInferencer<'a> {
    signatures: Vec<(Build, &'a ReferencePanel)>,
    config: BuildInferenceConfig,
}

impl<'a> BuildInferencer<'a> {
    pub fn new(signatures: Vec<(Build, &'a ReferencePanel)>) -> Self {
        Self::with_config(signatures, BuildInferenceConfig::default())
    }

    pub fn with_config(signatures: Vec<(Build, &'a ReferencePanel)>, config: BuildInferenceConfig) -> Self {
        Self { signatures, config }
    }

    /// Infer the build of `records`.
    ///
    /// # Errors
    ///
    /// Returns a `BuildInferenceError` when there is nothing to sample, the best
    /// build has too few hits or too low a score, or two builds tie.
    pub fn infer(&self, records: &[VariantRecord]) -> Result<BuildInference, BuildInferenceError> {
        if self.signatures.is_empty() {
            return Err(BuildInferenceError::NoCandidates);
        }

        let sample = sample_records(records, self.config.max_samples);
        if sample.is_empty() {
            return Err(BuildInferenceError::NoRecords);
        }

        let mut scores: Vec<BuildScore> = self
            .signatures
            .iter()
            .map(|(build, panel)| score_build(build, panel, &sample))
            .collect();

        for s in &scores {
            debug!(
                "Build {}: {} hits, {} allele matches, score {:.3}",
                s.build, s.hits, s.matches, s.score
            );
        }

        // Highest score first; among equal scores, more matches first
        scores.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.matches.cmp(&a.matches))
        });

        let best = &scores[0];
        if best.hits < self.config.min_hits {
            return Err(BuildInferenceError::InsufficientHits {
                hits: best.hits,
                min_hits: self.config.min_hits,
            });
        }
        if let Some(second) = scores.get(1) {
            if (best.score - second.score).abs() < TIE_EPSILON {
                return Err(BuildInferenceError::Ambiguous {
                    first: best.build.clone(),
                    second: second.build.clone(),
                    score: best.score,
                });
            }
        }
        if best.score < self.config.min_score {
            return Err(BuildInferenceError::LowConfidence {
                build: best.build.clone(),
                score: best.score,
                min_score: self.config.min_score,
            });
        }

        info!(
            "Inferred build {} (score {:.3} over {} sampled records)",
            best.build,
            best.score,
            sample.len()
        );

        Ok(BuildInference {
            build: best.build.clone(),
            score: best.score,
            sampled: sample.len(),
            scores,
        })
    }
}

/// Every `ceil(len / max_samples)`-th record with a usable position
fn sample_records(records: &[VariantRecord], max_samples: usize) -> Vec<&VariantRecord> {
    let usable: Vec<&VariantRecord> = records
        .iter()
        .filter(|r| r.pos > 0 && !r.chrom.is_empty())
        .collect();
    let stride = usable.len().div_ceil(max_samples.max(1)).max(1);
    usable.into_iter().step_by(stride).collect()
}

fn score_build(build: &Build, panel: &ReferencePanel, sample: &[&VariantRecord]) -> BuildScore {
    let mut hits = 0usize;
    let mut matches = 0usize;

    for record in sample {
        let candidates = panel.candidates(&record.chrom, record.pos);
        if candidates.is_empty() {
            continue;
        }
        hits += 1;
        if candidates
            .iter()
            .any(|entry| match_orientation(&record.ea, &record.nea, entry).is_some())
        {
            matches += 1;
        }
    }

    BuildScore {
        build: build.clone(),
        hits,
        matches,
        score: if hits == 0 {
            0.0
        } else {
            count_to_f64(matches) / count_to_f64(hits)
        },
    }
}

/// Convert a count to f64 for ratio calculations.
#[inline]
#[allow(clippy::cast_precision_loss)] // Sample counts are far below 2^52
fn count_to_f64(count: usize) -> f64 {
    count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::panel::ReferencePanelEntry;

    /// Records at positions 1000, 2000, ... with G/A alleles
    fn records(n: u64) -> Vec<VariantRecord> {
        (1..=n)
            .map(|i| VariantRecord::new("1", i * 1000, "G", "A"))
            .collect()
    }

    fn panel_at(positions: impl Iterator<Item = u64>) -> ReferencePanel {
        ReferencePanel::from_entries(positions.map(|pos| ReferencePanelEntry::new("1", pos, "A", "G")))
    }

    #[test]
    fn test_infers_matching_build() {
        let hg19 = panel_at((1..=50).map(|i| i * 1000));
        let hg38 = panel_at((1..=50).map(|i| i * 1000 + 7));

        let inferencer = BuildInferencer::new(vec![(Build::Grch37, &hg19), (Build::Grch38, &hg38)]);
        let result = inferencer.infer(&records(50)).unwrap();
        assert_eq!(result.build, Build::Grch37);
        assert!((result.score - 1.0).abs() < 1e-12);
        assert_eq!(result.sampled, 50);
        assert_eq!(result.scores.len(), 2);
    }

    #[test]
    fn test_insufficient_hits() {
        let hg19 = panel_at((1..=5).map(|i| i * 1000));
        let inferencer = BuildInferencer::new(vec![(Build::Grch37, &hg19)]);
        assert!(matches!(
            inferencer.infer(&records(50)),
            Err(BuildInferenceError::InsufficientHits { hits: 5, .. })
        ));
    }

    #[test]
    fn test_low_confidence() {
        // Positions hit but G/A never matches A/C on either strand
        let hg19 = ReferencePanel::from_entries(
            (1..=50).map(|i| ReferencePanelEntry::new("1", i * 1000, "A", "C")),
        );
        let inferencer = BuildInferencer::new(vec![(Build::Grch37, &hg19)]);
        assert!(matches!(
            inferencer.infer(&records(50)),
            Err(BuildInferenceError::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let a = panel_at((1..=50).map(|i| i * 1000));
        let b = panel_at((1..=50).map(|i| i * 1000));
        let inferencer = BuildInferencer::new(vec![(Build::Grch37, &a), (Build::Grch38, &b)]);
        assert!(matches!(
            inferencer.infer(&records(50)),
            Err(BuildInferenceError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_sampling_is_strided_and_bounded() {
        let recs = records(100);
        let sample = sample_records(&recs, 30);
        // stride = ceil(100 / 30) = 4
        assert_eq!(sample.len(), 25);
        assert_eq!(sample[1].pos, 5000);

        let mut with_invalid = records(3);
        with_invalid[1].pos = 0;
        assert_eq!(sample_records(&with_invalid, 10).len(), 2);
    }

    #[test]
    fn test_no_records() {
        let hg19 = panel_at(std::iter::empty());
        let inferencer = BuildInferencer::new(vec![(Build::Grch37, &hg19)]);
        assert_eq!(inferencer.infer(&[]), Err(BuildInferenceError::NoRecords));
    }
}
