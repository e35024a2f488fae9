use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default frequency threshold for resolving palindromic SNPs
pub const DEFAULT_PALINDROMIC_THRESHOLD: f64 = 0.99;

/// Default number of records per parallel shard
pub const DEFAULT_SHARD_SIZE: usize = 50_000;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Palindromic threshold must be in (0.5, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Shard size must be positive")]
    InvalidShardSize,

    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    Json(#[from] serde_json::Error),
}

/// When to replace a record's rsID with the lookup table's
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RsidOverwrite {
    /// Only fill records without an rsID
    #[default]
    Empty,
    /// Also replace values that do not look like `rs<digits>`
    Invalid,
    /// Replace whenever the table has an ID for the position
    All,
}

/// Policy knobs for a harmonization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizeOptions {
    /// Frequencies at or beyond this (or at or below `1 - threshold`) orient palindromic SNPs
    pub palindromic_threshold: f64,

    /// Drop records not found in the reference
    pub remove: bool,

    /// Drop palindromic records that could not be oriented
    pub remove_ambiguous: bool,

    /// Drop records that fail validation
    pub remove_invalid: bool,

    /// Drop repeated (chrom, pos, ea, nea) records, keeping the first
    pub deduplicate: bool,

    pub rsid_overwrite: RsidOverwrite,

    /// Worker threads; 0 uses the global rayon pool
    pub threads: usize,

    pub shard_size: usize,

    /// Restrict to these chromosomes (normalized names)
    pub chromosomes: Option<Vec<String>>,
}

impl Default for HarmonizeOptions {
    fn default() -> Self {
        Self {
            palindromic_threshold: DEFAULT_PALINDROMIC_THRESHOLD,
            remove: false,
            remove_ambiguous: false,
            remove_invalid: true,
            deduplicate: true,
            rsid_overwrite: RsidOverwrite::Empty,
            threads: 0,
            shard_size: DEFAULT_SHARD_SIZE,
            chromosomes: None,
        }
    }
}

impl HarmonizeOptions {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::InvalidThreshold` unless `0.5 < threshold <= 1`,
    /// or `OptionsError::InvalidShardSize` for a zero shard size.
    pub fn validate(&self) -> Result<(), OptionsError> {
        let t = self.palindromic_threshold;
        if !(t > 0.5 && t <= 1.0) {
            return Err(OptionsError::InvalidThreshold(t));
        }
        if self.shard_size == 0 {
            return Err(OptionsError::InvalidShardSize);
        }
        Ok(())
    }

    /// Load options from a JSON file; absent keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns `OptionsError` if the file cannot be read, is not valid JSON,
    /// or holds out-of-range values.
    pub fn load_json(path: &Path) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Whether a chromosome passes the optional allow-list
    #[must_use]
    pub fn allows_chrom(&self, chrom: &str) -> bool {
        self.chromosomes
            .as_ref()
            .map_or(true, |allowed| allowed.iter().any(|c| c == chrom))
    }
}
