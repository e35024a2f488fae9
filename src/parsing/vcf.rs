//! Reader for VCF reference panels.
//!
//! Only the eight fixed columns are used: `CHROM POS ID REF ALT QUAL FILTER
//! INFO`. The alternate allele frequency is taken from an INFO key (`AF` by
//! default). Multi-allelic records are split into one entry per ALT allele,
//! each paired with its own AF value.
//!
//! Like the header parsing in the rest of this module, lines are parsed as
//! text rather than through a full VCF model: panels such as 1000 Genomes
//! sites files carry no samples and the fixed columns are all we need.

use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use crate::core::chrom::normalize_chrom;
use crate::parsing::{open_text, ParseError};
use crate::reference::panel::ReferencePanelEntry;
use crate::reference::rsid::RsidLookupEntry;
use crate::utils::validation::{check_row_limit, is_missing_token, MAX_REFERENCE_ROWS};

/// Default INFO key holding the alternate allele frequency
pub const DEFAULT_AF_KEY: &str = "AF";

/// Read every site of a VCF file (plain or gzip/bgzip) as panel entries
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::InvalidFormat`
/// on a malformed data line, or `ParseError::TooManyRows` if the limit is exceeded.
pub fn read_panel_vcf(path: &Path, af_key: &str) -> Result<Vec<ReferencePanelEntry>, ParseError> {
    read_panel_vcf_from(open_text(path)?, af_key)
}

/// Read panel entries from any buffered VCF reader
///
/// # Errors
///
/// See [`read_panel_vcf`].
pub fn read_panel_vcf_from<R: BufRead>(
    reader: R,
    af_key: &str,
) -> Result<Vec<ReferencePanelEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        if check_row_limit(entries.len(), MAX_REFERENCE_ROWS).is_some() {
            return Err(ParseError::TooManyRows(entries.len()));
        }

        let parsed = parse_vcf_line(&line, af_key)
            .map_err(|e| ParseError::InvalidFormat(format!("line {}: {e}", idx + 1)))?;
        if parsed.is_empty() {
            skipped += 1;
        }
        entries.extend(parsed);
    }

    if skipped > 0 {
        debug!("Skipped {skipped} VCF sites without a usable ALT allele");
    }

    Ok(entries)
}

/// Parse one VCF data line into zero or more panel entries.
///
/// Returns an empty vector for monomorphic sites (`ALT` of `.`).
///
/// # Errors
///
/// Returns a description of the problem if the line has fewer than eight
/// columns or a non-numeric position.
pub fn parse_vcf_line(line: &str, af_key: &str) -> Result<Vec<ReferencePanelEntry>, String> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
    if fields.len() < 8 {
        return Err(format!(
            "expected at least 8 tab-separated columns, found {}",
            fields.len()
        ));
    }

    let chrom = normalize_chrom(fields[0]);
    let pos: u64 = fields[1]
        .parse()
        .map_err(|_| format!("invalid position '{}'", fields[1]))?;
    let rsid = first_id(fields[2]);
    let ref_allele = fields[3].to_ascii_uppercase();

    if fields[4] == "." {
        return Ok(Vec::new());
    }

    let freqs = info_values(fields[7], af_key);
    let entries = fields[4]
        .split(',')
        .enumerate()
        .map(|(i, alt)| ReferencePanelEntry {
            chrom: chrom.clone(),
            pos,
            ref_allele: ref_allele.clone(),
            alt_allele: alt.to_ascii_uppercase(),
            alt_allele_freq: freqs
                .as_ref()
                .and_then(|values| values.get(i))
                .and_then(|v| v.parse::<f64>().ok()),
            rsid: rsid.clone(),
        })
        .collect();

    Ok(entries)
}

/// First identifier of an ID column (`rs1;rs2` keeps `rs1`), `.` means none
fn first_id(id: &str) -> Option<String> {
    id.split(';')
        .next()
        .filter(|s| !is_missing_token(s))
        .map(str::to_string)
}

/// Comma-separated values of an INFO key, if present
fn info_values<'a>(info: &'a str, key: &str) -> Option<Vec<&'a str>> {
    info.split(';').find_map(|item| {
        let (k, v) = item.split_once('=')?;
        (k == key).then(|| v.split(',').collect())
    })
}

/// Read an rsID table from a VCF: one entry per site with a non-missing ID
///
/// # Errors
///
/// See [`read_panel_vcf`].
pub fn read_rsid_vcf(path: &Path) -> Result<Vec<RsidLookupEntry>, ParseError> {
    let entries = read_panel_vcf(path, DEFAULT_AF_KEY)?;
    let mut lookups: Vec<RsidLookupEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(rsid) = entry.rsid else {
            continue;
        };
        // Split multi-allelic lines repeat the same site
        let repeated = lookups
            .last()
            .is_some_and(|last| last.chrom == entry.chrom && last.pos == entry.pos && last.rsid == rsid);
        if !repeated {
            lookups.push(RsidLookupEntry {
                chrom: entry.chrom,
                pos: entry.pos,
                rsid,
            });
        }
    }

    Ok(lookups)
}
