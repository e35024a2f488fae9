//! Chromosome name normalization.
//!
//! Summary statistics use every naming convention there is:
//!
//! | Source | Chromosome 1 | X    | Mitochondrial |
//! |--------|--------------|------|---------------|
//! | UCSC   | chr1         | chrX | chrM          |
//! | NCBI   | 1            | X    | MT            |
//! | PLINK  | 1            | 23   | 26            |
//!
//! All of them are folded into the NCBI style so that records, reference
//! panels and lookup tables agree on a single key.

/// Normalize a chromosome name to NCBI style ("1".."22", "X", "Y", "MT").
///
/// Names that are not recognized are returned trimmed but otherwise unchanged
/// (minus any `chr` prefix), so alt/decoy contigs still get a stable key.
pub fn normalize_chrom(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = strip_chr_prefix(trimmed);

    if let Ok(number) = stripped.parse::<u32>() {
        return match number {
            1..=22 => number.to_string(),
            23 | 25 => "X".to_string(),
            24 => "Y".to_string(),
            26 => "MT".to_string(),
            _ => stripped.to_string(),
        };
    }

    match stripped.to_uppercase().as_str() {
        "X" | "XY" | "PAR1" | "PAR2" => "X".to_string(),
        "Y" => "Y".to_string(),
        "M" | "MT" => "MT".to_string(),
        _ => stripped.to_string(),
    }
}

fn strip_chr_prefix(name: &str) -> &str {
    if name.len() > 3 && name.is_char_boundary(3) && name[..3].eq_ignore_ascii_case("chr") {
        &name[3..]
    } else {
        name
    }
}

/// Check if a normalized name is a standard chromosome (1-22, X, Y, MT)
pub fn is_standard_chrom(name: &str) -> bool {
    match name {
        "X" | "Y" | "MT" => true,
        _ => name
            .parse::<u32>()
            .is_ok_and(|n| (1..=22).contains(&n) && !name.starts_with('0')),
    }
}
