//! Column layouts for harmonized output tables.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::variant::HarmonizedRecord;

/// Token written for a missing value
pub const MISSING: &str = "NA";

/// Output table layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Harmonized columns plus the outcome tag
    #[default]
    Standard,
    /// LD score regression `.sumstats` layout
    Ldsc,
    /// GWAS-SSF layout
    Ssf,
}

impl OutputFormat {
    /// Header columns, in output order
    #[must_use]
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Standard => &[
                "SNPID", "CHR", "POS", "EA", "NEA", "EAF", "BETA", "SE", "P", "N", "RSID", "STATUS",
            ],
            Self::Ldsc => &["SNP", "A1", "A2", "Z", "N", "P", "FRQ"],
            Self::Ssf => &[
                "chromosome",
                "base_pair_location",
                "effect_allele",
                "other_allele",
                "beta",
                "standard_error",
                "effect_allele_frequency",
                "p_value",
                "rsid",
                "n",
            ],
        }
    }

    /// Tab-joined header line (without newline)
    #[must_use]
    pub fn header(self) -> String {
        self.columns().join("\t")
    }

    /// Render one record as a tab-joined line, or None if this layout cannot
    /// represent it (LDSC rows need a Z-score).
    #[must_use]
    pub fn render_row(self, harmonized: &HarmonizedRecord) -> Option<String> {
        let r = &harmonized.record;
        let fields: Vec<String> = match self {
            Self::Standard => vec![
                r.snpid
                    .clone()
                    .unwrap_or_else(|| format!("{}:{}:{}:{}", r.chrom, r.pos, r.nea, r.ea)),
                r.chrom.clone(),
                r.pos.to_string(),
                r.ea.clone(),
                r.nea.clone(),
                opt(r.eaf),
                opt(r.beta),
                opt(r.se),
                opt(r.p),
                opt(r.n),
                r.rsid.clone().unwrap_or_else(|| MISSING.to_string()),
                harmonized.outcome.tag().to_string(),
            ],
            Self::Ldsc => {
                let z = r.z_score()?;
                vec![
                    r.display_id(),
                    r.ea.clone(),
                    r.nea.clone(),
                    z.to_string(),
                    opt(r.n),
                    opt(r.p),
                    opt(r.eaf),
                ]
            }
            Self::Ssf => vec![
                r.chrom.clone(),
                r.pos.to_string(),
                r.ea.clone(),
                r.nea.clone(),
                opt(r.beta),
                opt(r.se),
                opt(r.eaf),
                opt(r.p),
                r.rsid.clone().unwrap_or_else(|| MISSING.to_string()),
                opt(r.n),
            ],
        };
        Some(fields.join("\t"))
    }
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HarmonizationOutcome;
    use crate::core::variant::VariantRecord;

    fn harmonized(record: VariantRecord) -> HarmonizedRecord {
        HarmonizedRecord {
            record,
            outcome: HarmonizationOutcome::MatchedForward,
        }
    }

    #[test]
    fn test_standard_row() {
        let record = VariantRecord::new("1", 100_000, "G", "A")
            .with_eaf(0.2)
            .with_beta(0.05)
            .with_rsid("rs1");
        let row = OutputFormat::Standard.render_row(&harmonized(record)).unwrap();
        assert_eq!(row, "1:100000:A:G\t1\t100000\tG\tA\t0.2\t0.05\tNA\tNA\tNA\trs1\tMATCHED_FORWARD");
        assert_eq!(OutputFormat::Standard.columns().len(), row.split('\t').count());
    }

    #[test]
    fn test_ldsc_row_derives_z() {
        let record = VariantRecord::new("1", 5, "G", "A")
            .with_beta(1.0)
            .with_se(0.5)
            .with_n(1000)
            .with_rsid("rs5");
        let row = OutputFormat::Ldsc.render_row(&harmonized(record)).unwrap();
        assert_eq!(row, "rs5\tG\tA\t2\t1000\tNA\tNA");
    }

    #[test]
    fn test_ldsc_row_without_z_skipped() {
        let record = VariantRecord::new("1", 5, "G", "A").with_beta(1.0);
        assert!(OutputFormat::Ldsc.render_row(&harmonized(record)).is_none());
    }

    #[test]
    fn test_ssf_header() {
        assert!(OutputFormat::Ssf.header().starts_with("chromosome\tbase_pair_location\t"));
        let record = VariantRecord::new("X", 7, "C", "T").with_p(0.01);
        let row = OutputFormat::Ssf.render_row(&harmonized(record)).unwrap();
        assert_eq!(row, "X\t7\tC\tT\tNA\tNA\tNA\t0.01\tNA\tNA");
    }
}
