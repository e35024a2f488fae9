use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::allele::{classify_allele, reverse_complement, AlleleClass};
use crate::core::types::HarmonizationOutcome;

/// One row of a summary-statistics table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantRecord {
    /// 0-based position of the row in the input table
    pub line: usize,

    /// Normalized chromosome name ("1".."22", "X", "Y", "MT")
    pub chrom: String,

    /// 1-based position; 0 means the input position was missing or unparseable
    pub pos: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snpid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,

    /// Effect allele
    pub ea: String,

    /// Non-effect allele
    pub nea: String,

    /// Effect allele frequency
    pub eaf: Option<f64>,

    pub beta: Option<f64>,

    /// Odds ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,

    pub se: Option<f64>,
    pub p: Option<f64>,
    pub n: Option<u64>,

    /// Imputation quality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<f64>,
}

/// Pre-harmonization identity of a record: (chrom, pos, ea, nea)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey<'a> {
    pub chrom: &'a str,
    pub pos: u64,
    pub ea: &'a str,
    pub nea: &'a str,
}

impl VariantRecord {
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        ea: impl Into<String>,
        nea: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            ea: ea.into(),
            nea: nea.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    #[must_use]
    pub fn with_eaf(mut self, eaf: f64) -> Self {
        self.eaf = Some(eaf);
        self
    }

    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    #[must_use]
    pub fn with_se(mut self, se: f64) -> Self {
        self.se = Some(se);
        self
    }

    #[must_use]
    pub fn with_p(mut self, p: f64) -> Self {
        self.p = Some(p);
        self
    }

    #[must_use]
    pub fn with_n(mut self, n: u64) -> Self {
        self.n = Some(n);
        self
    }

    #[must_use]
    pub fn with_rsid(mut self, rsid: impl Into<String>) -> Self {
        self.rsid = Some(rsid.into());
        self
    }

    pub fn identity_key(&self) -> IdentityKey<'_> {
        IdentityKey {
            chrom: &self.chrom,
            pos: self.pos,
            ea: &self.ea,
            nea: &self.nea,
        }
    }

    /// Attribute the effect to the other allele without touching the allele labels.
    ///
    /// Negates `beta` and `z`, inverts the odds ratio and complements `eaf`.
    /// `se`, `p`, `n` and `info` do not depend on orientation.
    pub fn flip_effect(&mut self) {
        self.beta = self.beta.map(|b| -b);
        self.z = self.z.map(|z| -z);
        self.odds_ratio = self.odds_ratio.map(|or| 1.0 / or);
        self.eaf = self.eaf.map(|f| 1.0 - f);
    }

    /// Swap `ea`/`nea` and flip the effect accordingly
    pub fn swap_alleles(&mut self) {
        std::mem::swap(&mut self.ea, &mut self.nea);
        self.flip_effect();
    }

    /// Rewrite both alleles on the opposite strand.
    ///
    /// Returns false (leaving the record untouched) if either allele has no
    /// complement.
    pub fn complement_alleles(&mut self) -> bool {
        match (reverse_complement(&self.ea), reverse_complement(&self.nea)) {
            (Some(ea), Some(nea)) => {
                self.ea = ea;
                self.nea = nea;
                true
            }
            _ => false,
        }
    }

    /// Z-score, derived from beta/se when not given
    #[must_use]
    pub fn z_score(&self) -> Option<f64> {
        self.z.or_else(|| match (self.beta, self.se) {
            (Some(beta), Some(se)) if se > 0.0 => Some(beta / se),
            _ => None,
        })
    }

    /// Best available identifier: rsID, then SNPID, then `chrom:pos:nea:ea`
    #[must_use]
    pub fn display_id(&self) -> String {
        self.rsid
            .clone()
            .or_else(|| self.snpid.clone())
            .unwrap_or_else(|| format!("{}:{}:{}:{}", self.chrom, self.pos, self.nea, self.ea))
    }

    /// Check field domains.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as an `InvalidRecordError`.
    pub fn validate(&self) -> Result<(), InvalidRecordError> {
        let fail = |reason| Err(InvalidRecordError::new(self.line, reason));

        if self.pos == 0 {
            return fail(InvalidReason::BadPosition);
        }
        if !classify_allele(&self.ea).is_valid() || !classify_allele(&self.nea).is_valid() {
            return fail(InvalidReason::BadAllele);
        }
        if self.ea == self.nea {
            return fail(InvalidReason::IdenticalAlleles);
        }
        if let Some(eaf) = self.eaf {
            if !(0.0..=1.0).contains(&eaf) {
                return fail(InvalidReason::BadFrequency);
            }
        }
        if self.beta.is_some_and(|b| !b.is_finite())
            || self.z.is_some_and(|z| !z.is_finite())
            || self.se.is_some_and(|se| !se.is_finite() || se < 0.0)
            || self.p.is_some_and(|p| !(0.0..=1.0).contains(&p))
            || self.odds_ratio.is_some_and(|or| !or.is_finite() || or <= 0.0)
        {
            return fail(InvalidReason::BadStatistic);
        }
        Ok(())
    }

    /// Whether either allele is an IUPAC-ambiguous or structural allele
    #[must_use]
    pub fn has_nonstandard_allele(&self) -> bool {
        [&self.ea, &self.nea].into_iter().any(|a| {
            matches!(
                classify_allele(a),
                AlleleClass::Iupac | AlleleClass::Structural
            )
        })
    }
}

/// Why a record failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    BadPosition,
    BadAllele,
    IdenticalAlleles,
    BadFrequency,
    BadStatistic,
}

impl InvalidReason {
    /// Short snake_case code, as used in serialized reports
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::BadPosition => "bad_position",
            Self::BadAllele => "bad_allele",
            Self::IdenticalAlleles => "identical_alleles",
            Self::BadFrequency => "bad_frequency",
            Self::BadStatistic => "bad_statistic",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadPosition => write!(f, "position missing or not positive"),
            Self::BadAllele => write!(f, "allele outside the nucleotide alphabet"),
            Self::IdenticalAlleles => write!(f, "effect and non-effect alleles are identical"),
            Self::BadFrequency => write!(f, "allele frequency outside [0, 1]"),
            Self::BadStatistic => write!(f, "non-finite or out-of-range statistic"),
        }
    }
}

/// Per-record validation failure; reported, never fatal
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("record on input row {line}: {reason}")]
pub struct InvalidRecordError {
    pub line: usize,
    pub reason: InvalidReason,
}

impl InvalidRecordError {
    pub fn new(line: usize, reason: InvalidReason) -> Self {
        Self { line, reason }
    }
}

/// A record paired with the outcome of harmonization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizedRecord {
    pub record: VariantRecord,
    pub outcome: HarmonizationOutcome,
}
