use serde::{Deserialize, Serialize};

/// Genome build (coordinate system version)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Build {
    Grch37,
    Grch38,
    Other(String),
}

impl Build {
    /// Parse a build name.
    ///
    /// Accepts the common spellings seen in sumstats metadata: `19`, `37`, `hg19`,
    /// `b37`, `GRCh37`, `38`, `hg38`, `GRCh38` (case-insensitive). Anything else
    /// becomes [`Build::Other`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "19" | "37" | "hg19" | "b37" | "grch37" | "hs37d5" => Self::Grch37,
            "38" | "hg38" | "b38" | "grch38" => Self::Grch38,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    /// Short code used by downstream tools ("19" or "38")
    #[must_use]
    pub fn short_code(&self) -> &str {
        match self {
            Self::Grch37 => "19",
            Self::Grch38 => "38",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Build {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grch37 => write!(f, "GRCh37"),
            Self::Grch38 => write!(f, "GRCh38"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

impl std::str::FromStr for Build {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Per-record result of harmonizing against the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmonizationOutcome {
    /// Alleles already agree with the reference (ea = alt, nea = ref)
    MatchedForward,
    /// Alleles agree after taking the complement strand
    MatchedFlippedStrand,
    /// Effect allele is the reference allele; alleles swapped and effect flipped
    MatchedFlippedRefAlt,
    /// Both a strand flip and a ref/alt swap were needed
    MatchedFlippedBoth,
    /// Palindromic site oriented using allele frequencies
    PalindromicResolvedByFreq {
        /// Whether the effect had to be flipped onto the alt allele
        flipped: bool,
    },
    /// Palindromic site whose orientation could not be determined
    PalindromicAmbiguous,
    /// No usable reference site at this position
    NotFoundInReference,
    /// Alleles failed domain validation before comparison
    InvalidRecord,
}

impl HarmonizationOutcome {
    /// Stable tag used in output files and reports
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MatchedForward => "MATCHED_FORWARD",
            Self::MatchedFlippedStrand => "MATCHED_FLIPPED_STRAND",
            Self::MatchedFlippedRefAlt => "MATCHED_FLIPPED_REF_ALT",
            Self::MatchedFlippedBoth => "MATCHED_FLIPPED_BOTH",
            Self::PalindromicResolvedByFreq { .. } => "PALINDROMIC_RESOLVED_BY_FREQ",
            Self::PalindromicAmbiguous => "PALINDROMIC_AMBIGUOUS",
            Self::NotFoundInReference => "NOT_FOUND_IN_REFERENCE",
            Self::InvalidRecord => "INVALID_RECORD",
        }
    }

    /// True when the record was aligned to a reference site
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        matches!(
            self,
            Self::MatchedForward
                | Self::MatchedFlippedStrand
                | Self::MatchedFlippedRefAlt
                | Self::MatchedFlippedBoth
                | Self::PalindromicResolvedByFreq { .. }
        )
    }

    /// True when the effect direction was flipped onto the other allele
    #[must_use]
    pub fn flipped_effect(&self) -> bool {
        matches!(
            self,
            Self::MatchedFlippedRefAlt
                | Self::MatchedFlippedBoth
                | Self::PalindromicResolvedByFreq { flipped: true }
        )
    }
}

impl std::fmt::Display for HarmonizationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Histogram of harmonization outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OutcomeHistogram {
    pub matched_forward: usize,
    pub matched_flipped_strand: usize,
    pub matched_flipped_ref_alt: usize,
    pub matched_flipped_both: usize,
    pub palindromic_resolved_by_freq: usize,
    pub palindromic_ambiguous: usize,
    pub not_found_in_reference: usize,
    pub invalid_record: usize,
}

impl OutcomeHistogram {
    pub fn record(&mut self, outcome: HarmonizationOutcome) {
        *self.slot_mut(outcome) += 1;
    }

    #[must_use]
    pub fn count(&self, outcome: HarmonizationOutcome) -> usize {
        match outcome {
            HarmonizationOutcome::MatchedForward => self.matched_forward,
            HarmonizationOutcome::MatchedFlippedStrand => self.matched_flipped_strand,
            HarmonizationOutcome::MatchedFlippedRefAlt => self.matched_flipped_ref_alt,
            HarmonizationOutcome::MatchedFlippedBoth => self.matched_flipped_both,
            HarmonizationOutcome::PalindromicResolvedByFreq { .. } => {
                self.palindromic_resolved_by_freq
            }
            HarmonizationOutcome::PalindromicAmbiguous => self.palindromic_ambiguous,
            HarmonizationOutcome::NotFoundInReference => self.not_found_in_reference,
            HarmonizationOutcome::InvalidRecord => self.invalid_record,
        }
    }

    fn slot_mut(&mut self, outcome: HarmonizationOutcome) -> &mut usize {
        match outcome {
            HarmonizationOutcome::MatchedForward => &mut self.matched_forward,
            HarmonizationOutcome::MatchedFlippedStrand => &mut self.matched_flipped_strand,
            HarmonizationOutcome::MatchedFlippedRefAlt => &mut self.matched_flipped_ref_alt,
            HarmonizationOutcome::MatchedFlippedBoth => &mut self.matched_flipped_both,
            HarmonizationOutcome::PalindromicResolvedByFreq { .. } => {
                &mut self.palindromic_resolved_by_freq
            }
            HarmonizationOutcome::PalindromicAmbiguous => &mut self.palindromic_ambiguous,
            HarmonizationOutcome::NotFoundInReference => &mut self.not_found_in_reference,
            HarmonizationOutcome::InvalidRecord => &mut self.invalid_record,
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.matched_forward += other.matched_forward;
        self.matched_flipped_strand += other.matched_flipped_strand;
        self.matched_flipped_ref_alt += other.matched_flipped_ref_alt;
        self.matched_flipped_both += other.matched_flipped_both;
        self.palindromic_resolved_by_freq += other.palindromic_resolved_by_freq;
        self.palindromic_ambiguous += other.palindromic_ambiguous;
        self.not_found_in_reference += other.not_found_in_reference;
        self.invalid_record += other.invalid_record;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.entries().iter().map(|(_, count)| count).sum()
    }

    /// (tag, count) pairs in a fixed order
    #[must_use]
    pub fn entries(&self) -> [(&'static str, usize); 8] {
        [
            ("MATCHED_FORWARD", self.matched_forward),
            ("MATCHED_FLIPPED_STRAND", self.matched_flipped_strand),
            ("MATCHED_FLIPPED_REF_ALT", self.matched_flipped_ref_alt),
            ("MATCHED_FLIPPED_BOTH", self.matched_flipped_both),
            (
                "PALINDROMIC_RESOLVED_BY_FREQ",
                self.palindromic_resolved_by_freq,
            ),
            ("PALINDROMIC_AMBIGUOUS", self.palindromic_ambiguous),
            ("NOT_FOUND_IN_REFERENCE", self.not_found_in_reference),
            ("INVALID_RECORD", self.invalid_record),
        ]
    }
}
