//! Schema normalization: map heterogeneous summary-statistics headers onto
//! [`VariantRecord`]s.
//!
//! Every GWAS tool names its columns differently. A column is resolved by, in
//! order:
//!
//! 1. An explicit override from [`ColumnOverrides`] (which must exist in the header)
//! 2. The synonym dictionary of the declared [`InputFormat`]
//! 3. The merged dictionary used for [`InputFormat::Auto`]
//!
//! `CHR`, `POS`, `EA` and `NEA` are required; everything else is optional.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::chrom::normalize_chrom;
use crate::core::variant::VariantRecord;
use crate::parsing::table::{canonical_header, RawTable};
use crate::parsing::ParseError;
use crate::utils::validation::is_missing_token;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Required column(s) could not be resolved: {}", .missing.join(", "))]
    MissingRequired { missing: Vec<String> },

    #[error("Column '{column}' given for {field} is not present in the header")]
    OverrideNotFound { field: String, column: String },

    #[error("Column '{column}' was resolved for both {first} and {second}")]
    DuplicateColumn {
        column: String,
        first: String,
        second: String,
    },

    #[error("Failed to read input table: {0}")]
    Parse(#[from] ParseError),
}

/// Known input formats, each with its own column dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// Try every dictionary except SAIGE's
    #[default]
    Auto,
    /// GWAS-SSF (GWAS Catalog standard format)
    Ssf,
    /// PLINK2 `.glm` output
    Plink,
    Regenie,
    Saige,
    Bolt,
    Metal,
    Ldsc,
    /// GWASLab canonical column names
    Gwaslab,
}

/// Canonical fields of a [`VariantRecord`] that can be mapped from a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Snpid,
    Rsid,
    Chrom,
    Pos,
    Ea,
    Nea,
    Eaf,
    Neaf,
    Beta,
    OddsRatio,
    Z,
    Se,
    P,
    Mlog10p,
    N,
    Info,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Snpid,
        Field::Rsid,
        Field::Chrom,
        Field::Pos,
        Field::Ea,
        Field::Nea,
        Field::Eaf,
        Field::Neaf,
        Field::Beta,
        Field::OddsRatio,
        Field::Z,
        Field::Se,
        Field::P,
        Field::Mlog10p,
        Field::N,
        Field::Info,
    ];

    pub const REQUIRED: [Field; 4] = [Field::Chrom, Field::Pos, Field::Ea, Field::Nea];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Field::Snpid => "SNPID",
            Field::Rsid => "rsID",
            Field::Chrom => "CHR",
            Field::Pos => "POS",
            Field::Ea => "EA",
            Field::Nea => "NEA",
            Field::Eaf => "EAF",
            Field::Neaf => "NEAF",
            Field::Beta => "BETA",
            Field::OddsRatio => "OR",
            Field::Z => "Z",
            Field::Se => "SE",
            Field::P => "P",
            Field::Mlog10p => "MLOG10P",
            Field::N => "N",
            Field::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Explicit column names supplied by the user, one per canonical field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOverrides {
    pub snpid: Option<String>,
    pub rsid: Option<String>,
    pub chrom: Option<String>,
    pub pos: Option<String>,
    pub ea: Option<String>,
    pub nea: Option<String>,
    pub eaf: Option<String>,
    pub neaf: Option<String>,
    pub beta: Option<String>,
    pub odds_ratio: Option<String>,
    pub z: Option<String>,
    pub se: Option<String>,
    pub p: Option<String>,
    pub mlog10p: Option<String>,
    pub n: Option<String>,
    pub info: Option<String>,
}

impl ColumnOverrides {
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Snpid => &self.snpid,
            Field::Rsid => &self.rsid,
            Field::Chrom => &self.chrom,
            Field::Pos => &self.pos,
            Field::Ea => &self.ea,
            Field::Nea => &self.nea,
            Field::Eaf => &self.eaf,
            Field::Neaf => &self.neaf,
            Field::Beta => &self.beta,
            Field::OddsRatio => &self.odds_ratio,
            Field::Z => &self.z,
            Field::Se => &self.se,
            Field::P => &self.p,
            Field::Mlog10p => &self.mlog10p,
            Field::N => &self.n,
            Field::Info => &self.info,
        };
        value.as_deref()
    }
}

/// Column synonyms for one field in one format
fn synonyms(format: InputFormat, field: Field) -> &'static [&'static str] {
    use Field as F;
    use InputFormat as I;

    match (format, field) {
        (I::Gwaslab, F::Snpid) => &["SNPID"],
        (I::Gwaslab, F::Rsid) => &["rsID"],
        (I::Gwaslab, F::Chrom) => &["CHR"],
        (I::Gwaslab, F::Pos) => &["POS"],
        (I::Gwaslab, F::Ea) => &["EA"],
        (I::Gwaslab, F::Nea) => &["NEA"],
        (I::Gwaslab, F::Eaf) => &["EAF"],
        (I::Gwaslab, F::Neaf) => &["NEAF"],
        (I::Gwaslab, F::Beta) => &["BETA"],
        (I::Gwaslab, F::OddsRatio) => &["OR"],
        (I::Gwaslab, F::Z) => &["Z"],
        (I::Gwaslab, F::Se) => &["SE"],
        (I::Gwaslab, F::P) => &["P"],
        (I::Gwaslab, F::Mlog10p) => &["MLOG10P"],
        (I::Gwaslab, F::N) => &["N"],
        (I::Gwaslab, F::Info) => &["INFO"],

        (I::Ssf, F::Snpid) => &["variant_id"],
        (I::Ssf, F::Rsid) => &["rsid"],
        (I::Ssf, F::Chrom) => &["chromosome"],
        (I::Ssf, F::Pos) => &["base_pair_location"],
        (I::Ssf, F::Ea) => &["effect_allele"],
        (I::Ssf, F::Nea) => &["other_allele"],
        (I::Ssf, F::Eaf) => &["effect_allele_frequency"],
        (I::Ssf, F::Beta) => &["beta"],
        (I::Ssf, F::OddsRatio) => &["odds_ratio"],
        (I::Ssf, F::Se) => &["standard_error"],
        (I::Ssf, F::P) => &["p_value"],
        (I::Ssf, F::Mlog10p) => &["neg_log_10_p_value"],
        (I::Ssf, F::N) => &["n"],
        (I::Ssf, F::Info) => &["info"],

        (I::Plink, F::Snpid) => &["ID"],
        (I::Plink, F::Chrom) => &["CHROM"],
        (I::Plink, F::Pos) => &["POS"],
        (I::Plink, F::Ea) => &["A1"],
        (I::Plink, F::Nea) => &["OMITTED", "AX"],
        (I::Plink, F::Eaf) => &["A1_FREQ"],
        (I::Plink, F::Beta) => &["BETA"],
        (I::Plink, F::OddsRatio) => &["OR"],
        (I::Plink, F::Z) => &["Z_STAT", "T_STAT"],
        (I::Plink, F::Se) => &["SE", "LOG(OR)_SE"],
        (I::Plink, F::P) => &["P"],
        (I::Plink, F::Mlog10p) => &["LOG10_P", "NEG_LOG10_P"],
        (I::Plink, F::N) => &["OBS_CT"],
        (I::Plink, F::Info) => &["MACH_R2"],

        (I::Regenie, F::Snpid) => &["ID"],
        (I::Regenie, F::Chrom) => &["CHROM"],
        (I::Regenie, F::Pos) => &["GENPOS"],
        (I::Regenie, F::Ea) => &["ALLELE1"],
        (I::Regenie, F::Nea) => &["ALLELE0"],
        (I::Regenie, F::Eaf) => &["A1FREQ"],
        (I::Regenie, F::Beta) => &["BETA"],
        (I::Regenie, F::Se) => &["SE"],
        (I::Regenie, F::Mlog10p) => &["LOG10P"],
        (I::Regenie, F::N) => &["N"],
        (I::Regenie, F::Info) => &["INFO"],

        (I::Saige, F::Snpid) => &["MarkerID", "SNPID"],
        (I::Saige, F::Chrom) => &["CHR"],
        (I::Saige, F::Pos) => &["POS"],
        (I::Saige, F::Ea) => &["Allele2"],
        (I::Saige, F::Nea) => &["Allele1"],
        (I::Saige, F::Eaf) => &["AF_Allele2"],
        (I::Saige, F::Beta) => &["BETA"],
        (I::Saige, F::Se) => &["SE"],
        (I::Saige, F::Z) => &["Tstat"],
        (I::Saige, F::P) => &["p.value"],
        (I::Saige, F::N) => &["N"],
        (I::Saige, F::Info) => &["imputationInfo"],

        (I::Bolt, F::Snpid) => &["SNP"],
        (I::Bolt, F::Chrom) => &["CHR"],
        (I::Bolt, F::Pos) => &["BP"],
        (I::Bolt, F::Ea) => &["ALLELE1"],
        (I::Bolt, F::Nea) => &["ALLELE0"],
        (I::Bolt, F::Eaf) => &["A1FREQ"],
        (I::Bolt, F::Beta) => &["BETA"],
        (I::Bolt, F::Se) => &["SE"],
        (I::Bolt, F::P) => &["P_BOLT_LMM_INF", "P_BOLT_LMM", "P_LINREG"],
        (I::Bolt, F::Info) => &["INFO"],

        (I::Metal, F::Snpid) => &["MarkerName"],
        (I::Metal, F::Ea) => &["Allele1"],
        (I::Metal, F::Nea) => &["Allele2"],
        (I::Metal, F::Eaf) => &["Freq1"],
        (I::Metal, F::Beta) => &["Effect"],
        (I::Metal, F::Se) => &["StdErr"],
        (I::Metal, F::Z) => &["Zscore"],
        (I::Metal, F::P) => &["P-value"],
        (I::Metal, F::N) => &["Weight", "N"],

        (I::Ldsc, F::Snpid) => &["SNP"],
        (I::Ldsc, F::Chrom) => &["CHR"],
        (I::Ldsc, F::Pos) => &["BP"],
        (I::Ldsc, F::Ea) => &["A1"],
        (I::Ldsc, F::Nea) => &["A2"],
        (I::Ldsc, F::Eaf) => &["FRQ"],
        (I::Ldsc, F::Z) => &["Z"],
        (I::Ldsc, F::P) => &["P"],
        (I::Ldsc, F::N) => &["N"],

        // Generic spellings seen in hand-made files
        (I::Auto, F::Snpid) => &["SNP", "MarkerName", "variant", "variant_id", "ID"],
        (I::Auto, F::Rsid) => &["rsid", "rs_id", "dbSNP"],
        (I::Auto, F::Chrom) => &["chromosome", "chrom", "chr", "#chrom", "CHR_ID"],
        (I::Auto, F::Pos) => &[
            "pos",
            "bp",
            "position",
            "base_pair_location",
            "GENPOS",
            "BP_hg19",
            "BP_hg38",
        ],
        (I::Auto, F::Ea) => &[
            "EA",
            "effect_allele",
            "A1",
            "ALLELE1",
            "alt",
            "tested_allele",
            "risk_allele",
        ],
        (I::Auto, F::Nea) => &[
            "NEA",
            "other_allele",
            "non_effect_allele",
            "A2",
            "ALLELE0",
            "Allele2",
            "ref",
            "OMITTED",
        ],
        (I::Auto, F::Eaf) => &[
            "EAF",
            "effect_allele_frequency",
            "A1_FREQ",
            "A1FREQ",
            "FRQ",
            "Freq1",
            "freq",
        ],
        (I::Auto, F::Beta) => &["beta", "effect", "b", "log_odds"],
        (I::Auto, F::OddsRatio) => &["OR", "odds_ratio"],
        (I::Auto, F::Z) => &["Z", "zscore", "z_stat", "Zscore"],
        (I::Auto, F::Se) => &["se", "standard_error", "stderr", "sebeta"],
        (I::Auto, F::P) => &["P", "pval", "p_value", "p-value", "pvalue", "p.value"],
        (I::Auto, F::Mlog10p) => &["MLOG10P", "LOG10P", "neg_log_10_p_value"],
        (I::Auto, F::N) => &["N", "n_total", "samplesize", "OBS_CT", "neff"],
        (I::Auto, F::Info) => &["INFO", "imputationInfo", "r2"],

        _ => &[],
    }
}

/// Formats merged into the `auto` dictionary, in priority order
const AUTO_FORMATS: [InputFormat; 8] = [
    InputFormat::Gwaslab,
    InputFormat::Ssf,
    InputFormat::Plink,
    InputFormat::Regenie,
    InputFormat::Bolt,
    InputFormat::Ldsc,
    InputFormat::Metal,
    InputFormat::Auto,
];

/// Resolved column indices for each canonical field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    indices: Vec<(Field, usize)>,
}

impl ColumnMapping {
    /// Resolve every field against a header.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::OverrideNotFound` if an explicit column is absent,
    /// `SchemaError::DuplicateColumn` if two fields land on the same column, or
    /// `SchemaError::MissingRequired` if CHR/POS/EA/NEA cannot be resolved.
    pub fn resolve(
        table: &RawTable,
        format: InputFormat,
        overrides: &ColumnOverrides,
    ) -> Result<Self, SchemaError> {
        let mut indices: Vec<(Field, usize)> = Vec::new();

        // Overrides first so that they claim their columns before any guessing
        for field in Field::ALL {
            if let Some(column) = overrides.get(field) {
                let idx = table
                    .column_index(column)
                    .ok_or_else(|| SchemaError::OverrideNotFound {
                        field: field.name().to_string(),
                        column: column.to_string(),
                    })?;
                claim(&mut indices, table, field, idx)?;
            }
        }

        for field in Field::ALL {
            if overrides.get(field).is_some() {
                continue;
            }
            if let Some(idx) = detect_column(table, format, field, &indices) {
                claim(&mut indices, table, field, idx)?;
            }
        }

        let mapping = Self { indices };
        let missing: Vec<String> = Field::REQUIRED
            .iter()
            .filter(|f| mapping.index(**f).is_none())
            .map(|f| f.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingRequired { missing });
        }

        Ok(mapping)
    }

    #[must_use]
    pub fn index(&self, field: Field) -> Option<usize> {
        self.indices
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, idx)| *idx)
    }
}

fn claim(
    indices: &mut Vec<(Field, usize)>,
    table: &RawTable,
    field: Field,
    idx: usize,
) -> Result<(), SchemaError> {
    if let Some((other, _)) = indices.iter().find(|(_, i)| *i == idx) {
        return Err(SchemaError::DuplicateColumn {
            column: table.header[idx].clone(),
            first: other.name().to_string(),
            second: field.name().to_string(),
        });
    }
    indices.push((field, idx));
    Ok(())
}

/// Find the first unclaimed header column matching a synonym of `field`
fn detect_column(
    table: &RawTable,
    format: InputFormat,
    field: Field,
    claimed: &[(Field, usize)],
) -> Option<usize> {
    let formats: Vec<InputFormat> = if format == InputFormat::Auto {
        AUTO_FORMATS.to_vec()
    } else {
        std::iter::once(format).chain(AUTO_FORMATS).collect()
    };

    for fmt in formats {
        for synonym in synonyms(fmt, field) {
            let wanted = canonical_header(synonym);
            let found = table.header.iter().enumerate().find(|(i, h)| {
                canonical_header(h) == wanted && !claimed.iter().any(|(_, c)| c == i)
            });
            if let Some((idx, _)) = found {
                return Some(idx);
            }
        }
    }
    None
}

/// Convert a raw table into variant records.
///
/// # Errors
///
/// Returns a `SchemaError` if the required columns cannot be resolved. Bad
/// values inside rows never fail here; they become missing fields and are
/// caught by quality control.
pub fn normalize_table(
    table: &RawTable,
    format: InputFormat,
    overrides: &ColumnOverrides,
) -> Result<Vec<VariantRecord>, SchemaError> {
    let mapping = ColumnMapping::resolve(table, format, overrides)?;

    for field in Field::ALL {
        if let Some(idx) = mapping.index(field) {
            debug!("Mapped {} <- column '{}'", field, table.header[idx]);
        }
    }

    let records: Vec<VariantRecord> = table
        .rows
        .iter()
        .enumerate()
        .map(|(line, row)| row_to_record(line, row, &mapping))
        .collect();

    info!(
        "Normalized {} records from {} columns",
        records.len(),
        table.header.len()
    );
    Ok(records)
}

fn row_to_record(line: usize, row: &[String], mapping: &ColumnMapping) -> VariantRecord {
    let cell = |field: Field| -> Option<&str> {
        mapping
            .index(field)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .filter(|s| !is_missing_token(s))
    };
    let float = |field: Field| cell(field).and_then(parse_float);

    let eaf = float(Field::Eaf).or_else(|| float(Field::Neaf).map(|f| 1.0 - f));
    let p = float(Field::P).or_else(|| float(Field::Mlog10p).map(|m| 10f64.powf(-m)));
    let odds_ratio = float(Field::OddsRatio);
    let beta = float(Field::Beta).or_else(|| odds_ratio.filter(|or| *or > 0.0).map(f64::ln));

    VariantRecord {
        line,
        chrom: cell(Field::Chrom).map(normalize_chrom).unwrap_or_default(),
        pos: cell(Field::Pos).and_then(parse_position).unwrap_or(0),
        snpid: cell(Field::Snpid).map(str::to_string),
        rsid: cell(Field::Rsid).map(str::to_string),
        ea: cell(Field::Ea).map(normalize_allele).unwrap_or_default(),
        nea: cell(Field::Nea).map(normalize_allele).unwrap_or_default(),
        eaf,
        beta,
        odds_ratio,
        z: float(Field::Z),
        se: float(Field::Se),
        p,
        n: cell(Field::N).and_then(parse_count),
        info: float(Field::Info),
    }
}

fn normalize_allele(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Parse a 1-based position, tolerating float spellings such as `12345.0`
fn parse_position(s: &str) -> Option<u64> {
    let s = s.trim();
    s.parse::<u64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 1.0 && f.fract() == 0.0 && *f < 1e15)
            .map(|f| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Checked above
                let pos = f as u64;
                pos
            })
    })
}

/// Parse a sample size, rounding fractional effective sample sizes
fn parse_count(s: &str) -> Option<u64> {
    let s = s.trim();
    s.parse::<u64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0 && *f < 1e15)
            .map(|f| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Checked above
                let n = f.round() as u64;
                n
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::table::parse_table_text;

    #[test]
    fn test_normalize_gwaslab_headers() {
        let table = parse_table_text(
            "SNPID\tCHR\tPOS\tEA\tNEA\tEAF\tBETA\tSE\tP\tN\n\
             1:100000:A:G\tchr1\t100000\tg\ta\t0.2\t0.05\t0.01\t1e-6\t5000\n",
        )
        .unwrap();

        let records = normalize_table(&table, InputFormat::Auto, &ColumnOverrides::default())
            .unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.chrom, "1");
        assert_eq!(r.pos, 100_000);
        assert_eq!(r.ea, "G");
        assert_eq!(r.nea, "A");
        assert_eq!(r.eaf, Some(0.2));
        assert_eq!(r.beta, Some(0.05));
        assert_eq!(r.n, Some(5000));
        assert_eq!(r.snpid.as_deref(), Some("1:100000:A:G"));
    }

    #[test]
    fn test_normalize_ssf_headers() {
        let table = parse_table_text(
            "chromosome\tbase_pair_location\teffect_allele\tother_allele\tbeta\tstandard_error\teffect_allele_frequency\tp_value\trsid\n\
             22\t16050075\tA\tG\t-0.01\t0.02\t0.1\t0.5\trs587697622\n",
        )
        .unwrap();
        let records =
            normalize_table(&table, InputFormat::Ssf, &ColumnOverrides::default()).unwrap();
        assert_eq!(records[0].rsid.as_deref(), Some("rs587697622"));
        assert_eq!(records[0].se, Some(0.02));
    }

    #[test]
    fn test_normalize_regenie_log10p() {
        let table = parse_table_text(
            "CHROM GENPOS ID ALLELE0 ALLELE1 A1FREQ N BETA SE LOG10P\n\
             1 79033 1:79033:A:G A G 0.0025 500 -0.2 0.1 2\n",
        )
        .unwrap();
        let records =
            normalize_table(&table, InputFormat::Regenie, &ColumnOverrides::default()).unwrap();
        let r = &records[0];
        assert_eq!(r.ea, "G");
        assert_eq!(r.nea, "A");
        assert!((r.p.unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_saige_allele_order() {
        let table = parse_table_text(
            "CHR\tPOS\tMarkerID\tAllele1\tAllele2\tAF_Allele2\tBETA\tSE\tp.value\n\
             1\t13\trs1\tA\tC\t0.3\t0.1\t0.05\t0.04\n",
        )
        .unwrap();
        let records =
            normalize_table(&table, InputFormat::Saige, &ColumnOverrides::default()).unwrap();
        assert_eq!(records[0].ea, "C");
        assert_eq!(records[0].nea, "A");
        assert_eq!(records[0].eaf, Some(0.3));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let table = parse_table_text(
            "c\tp\teffect\tother\tnon_effect_freq\n1\t5\tA\tG\t0.9\n",
        )
        .unwrap();
        let overrides = ColumnOverrides {
            chrom: Some("c".to_string()),
            pos: Some("p".to_string()),
            ea: Some("effect".to_string()),
            nea: Some("other".to_string()),
            neaf: Some("non_effect_freq".to_string()),
            ..ColumnOverrides::default()
        };
        let records = normalize_table(&table, InputFormat::Auto, &overrides).unwrap();
        assert_eq!(records[0].ea, "A");
        assert!((records[0].eaf.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_minor_allele_frequency_is_not_eaf() {
        let table = parse_table_text("CHR POS EA NEA MAF\n1 5 A G 0.02\n").unwrap();
        let records =
            normalize_table(&table, InputFormat::Auto, &ColumnOverrides::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].eaf, None);
    }

    #[test]
    fn test_override_not_found() {
        let table = parse_table_text("CHR\tPOS\tEA\tNEA\n1\t5\tA\tG\n").unwrap();
        let overrides = ColumnOverrides {
            beta: Some("missing_beta".to_string()),
            ..ColumnOverrides::default()
        };
        let err = normalize_table(&table, InputFormat::Auto, &overrides).unwrap_err();
        assert!(matches!(err, SchemaError::OverrideNotFound { .. }));
    }

    #[test]
    fn test_missing_required_columns() {
        let table = parse_table_text("MarkerName\tAllele1\tAllele2\n1:5\tA\tG\n").unwrap();
        let err =
            normalize_table(&table, InputFormat::Metal, &ColumnOverrides::default()).unwrap_err();
        match err {
            SchemaError::MissingRequired { missing } => {
                assert_eq!(missing, vec!["CHR".to_string(), "POS".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_values_and_bad_position() {
        let table = parse_table_text(
            "CHR\tPOS\tEA\tNEA\tBETA\tOR\tN\n23\tNA\tA\tG\tNA\t2.0\t1234.6\n",
        )
        .unwrap();
        let records =
            normalize_table(&table, InputFormat::Auto, &ColumnOverrides::default()).unwrap();
        let r = &records[0];
        assert_eq!(r.chrom, "X");
        assert_eq!(r.pos, 0);
        assert!((r.beta.unwrap() - 2f64.ln()).abs() < 1e-12);
        assert_eq!(r.n, Some(1235));
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("12345"), Some(12345));
        assert_eq!(parse_position("1.2345e4"), Some(12345));
        assert_eq!(parse_position("12.5"), None);
        assert_eq!(parse_position("-3"), None);
    }
}
