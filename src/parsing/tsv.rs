use std::io::BufRead;
use std::path::Path;

use crate::core::chrom::normalize_chrom;
use crate::parsing::table::{read_reference_table, read_table_with_limit, RawTable};
use crate::parsing::{open_text, ParseError};
use crate::reference::panel::ReferencePanelEntry;
use crate::reference::regions::Region;
use crate::reference::rsid::RsidLookupEntry;
use crate::utils::validation::{check_row_limit, is_missing_token, MAX_REFERENCE_ROWS};

const CHROM_NAMES: &[&str] = &["chrom", "chr", "chromosome", "contig"];
const POS_NAMES: &[&str] = &["pos", "bp", "position", "base_pair_location"];
const REF_NAMES: &[&str] = &["ref", "ref_allele", "reference"];
const ALT_NAMES: &[&str] = &["alt", "alt_allele", "alternate"];
const AF_NAMES: &[&str] = &["af", "alt_af", "alt_freq", "alt_allele_freq", "freq"];
const RSID_NAMES: &[&str] = &["rsid", "rs_id", "snp", "id", "marker"];

/// Identifier-list header tokens skipped on the first line
const ID_HEADERS: &[&str] = &["snp", "rsid", "id", "snpid", "marker"];

fn find_column(table: &RawTable, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| table.column_index(name))
}

fn require_column(table: &RawTable, names: &[&str]) -> Result<usize, ParseError> {
    find_column(table, names).ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Missing column (expected one of: {})",
            names.join(", ")
        ))
    })
}

/// Parse a 1-based position cell, reporting its row on failure
fn position_cell(cell: &str, row: usize) -> Result<u64, ParseError> {
    cell.parse().map_err(|_| {
        ParseError::InvalidFormat(format!("Invalid position on row {}: '{cell}'", row + 1))
    })
}

/// Parse a TSV reference panel with columns `chrom pos ref alt [af] [rsid]`
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a required column is missing or a
/// position does not parse, or `ParseError::Io` if the file cannot be read.
pub fn read_panel_tsv(path: &Path) -> Result<Vec<ReferencePanelEntry>, ParseError> {
    panel_from_table(&read_reference_table(path)?)
}

/// Build panel entries from an already-read table
///
/// # Errors
///
/// See [`read_panel_tsv`].
pub fn panel_from_table(table: &RawTable) -> Result<Vec<ReferencePanelEntry>, ParseError> {
    let chrom = require_column(table, CHROM_NAMES)?;
    let pos = require_column(table, POS_NAMES)?;
    let ref_col = require_column(table, REF_NAMES)?;
    let alt_col = require_column(table, ALT_NAMES)?;
    let af = find_column(table, AF_NAMES);
    let rsid = find_column(table, RSID_NAMES);

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(ReferencePanelEntry {
                chrom: normalize_chrom(&row[chrom]),
                pos: position_cell(&row[pos], i)?,
                ref_allele: row[ref_col].to_ascii_uppercase(),
                alt_allele: row[alt_col].to_ascii_uppercase(),
                alt_allele_freq: af.and_then(|c| row[c].parse::<f64>().ok()),
                rsid: rsid
                    .map(|c| row[c].as_str())
                    .filter(|s| !is_missing_token(s))
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Parse an rsID lookup table with `rsid chrom pos` columns in any order
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a required column is missing or a
/// position does not parse, or `ParseError::Io` if the file cannot be read.
pub fn read_rsid_table(path: &Path) -> Result<Vec<RsidLookupEntry>, ParseError> {
    rsid_from_table(&read_reference_table(path)?)
}

/// Build rsID lookups from an already-read table; rows without an ID are skipped
///
/// # Errors
///
/// See [`read_rsid_table`].
pub fn rsid_from_table(table: &RawTable) -> Result<Vec<RsidLookupEntry>, ParseError> {
    let rsid = require_column(table, RSID_NAMES)?;
    let chrom = require_column(table, CHROM_NAMES)?;
    let pos = require_column(table, POS_NAMES)?;

    let mut entries = Vec::with_capacity(table.len());
    for (i, row) in table.rows.iter().enumerate() {
        if is_missing_token(&row[rsid]) {
            continue;
        }
        entries.push(RsidLookupEntry {
            chrom: normalize_chrom(&row[chrom]),
            pos: position_cell(&row[pos], i)?,
            rsid: row[rsid].clone(),
        });
    }
    Ok(entries)
}

/// Read a list of variant identifiers: first column of each line, with an
/// optional header line (`SNP`, `rsid`, ...)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::TooManyRows` if the limit is exceeded.
pub fn read_id_list(path: &Path) -> Result<Vec<String>, ParseError> {
    let reader = open_text(path)?;
    let mut ids = Vec::new();
    let mut first = true;

    for line in reader.lines() {
        let line = line?;
        let Some(id) = line.split_whitespace().next() else {
            continue;
        };
        if id.starts_with('#') {
            continue;
        }
        if first {
            first = false;
            if ID_HEADERS.contains(&id.to_lowercase().as_str()) {
                continue;
            }
        }
        if check_row_limit(ids.len(), MAX_REFERENCE_ROWS).is_some() {
            return Err(ParseError::TooManyRows(ids.len()));
        }
        ids.push(id.to_string());
    }

    Ok(ids)
}

/// Read a BED file into 1-based inclusive regions.
///
/// BED intervals are 0-based half-open, so `chr6 25000000 34000000` becomes
/// positions 25,000,001..=34,000,000. `track`/`browser` lines are ignored.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than three columns
/// or non-numeric coordinates.
pub fn read_bed(path: &Path) -> Result<Vec<Region>, ParseError> {
    let reader = open_text(path)?;
    let mut regions = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(ParseError::InvalidFormat(format!(
                "BED line {} has fewer than 3 fields",
                i + 1
            )));
        }

        let coord = |s: &str| -> Result<u64, ParseError> {
            s.parse().map_err(|_| {
                ParseError::InvalidFormat(format!("Invalid BED coordinate on line {}: '{s}'", i + 1))
            })
        };
        let start = coord(fields[1])?;
        let end = coord(fields[2])?;

        regions.push(Region::new(normalize_chrom(fields[0]), start + 1, end));
    }

    Ok(regions)
}

/// Parse an rsID table from in-memory text
///
/// # Errors
///
/// See [`read_rsid_table`].
pub fn parse_rsid_text(text: &str) -> Result<Vec<RsidLookupEntry>, ParseError> {
    rsid_from_table(&read_table_with_limit(text.as_bytes(), MAX_REFERENCE_ROWS)?)
}
