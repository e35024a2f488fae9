//! Allele classification and strand helpers.

use serde::{Deserialize, Serialize};

/// IUPAC nucleotide codes, including ambiguity codes
const IUPAC_CODES: &[u8] = b"ACGTURYSWKMBDHVN";

/// Kind of allele string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlleleClass {
    /// Single A/C/G/T base
    Snv,
    /// Multi-base A/C/G/T string, or `-` for an empty allele
    Indel,
    /// Valid IUPAC string containing ambiguity codes (N, R, Y, ...)
    Iupac,
    /// Symbolic or breakend allele such as `<DEL>`
    Structural,
    /// Anything else (empty, digits, punctuation)
    Invalid,
}

impl AlleleClass {
    /// Whether the allele can be compared against a reference panel
    #[must_use]
    pub fn is_harmonizable(self) -> bool {
        matches!(self, Self::Snv | Self::Indel)
    }

    /// Whether the allele passes basic domain validation
    #[must_use]
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Classify an (upper-case) allele string
pub fn classify_allele(allele: &str) -> AlleleClass {
    let bytes = allele.as_bytes();
    if bytes.is_empty() {
        return AlleleClass::Invalid;
    }
    if allele == "-" {
        return AlleleClass::Indel;
    }
    if (allele.starts_with('<') && allele.ends_with('>'))
        || allele.contains('[')
        || allele.contains(']')
    {
        return AlleleClass::Structural;
    }
    if bytes.iter().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
        return if bytes.len() == 1 {
            AlleleClass::Snv
        } else {
            AlleleClass::Indel
        };
    }
    if bytes.iter().all(|b| IUPAC_CODES.contains(b)) {
        return AlleleClass::Iupac;
    }
    AlleleClass::Invalid
}

/// Complement of a single nucleotide (A<->T, C<->G)
#[must_use]
pub fn complement_base(base: u8) -> Option<u8> {
    match base {
        b'A' => Some(b'T'),
        b'T' => Some(b'A'),
        b'C' => Some(b'G'),
        b'G' => Some(b'C'),
        _ => None,
    }
}

/// Reverse complement of an allele.
///
/// Returns `None` for alleles containing anything but A/C/G/T. The empty
/// allele `-` is its own reverse complement.
pub fn reverse_complement(allele: &str) -> Option<String> {
    if allele == "-" {
        return Some("-".to_string());
    }
    let bytes: Option<Vec<u8>> = allele.bytes().rev().map(complement_base).collect();
    bytes.and_then(|b| String::from_utf8(b).ok())
}

/// Check if an allele pair is palindromic (A/T or C/G).
///
/// Only single-base pairs can be palindromic; an indel pair never is.
pub fn is_palindromic(a: &str, b: &str) -> bool {
    match (a.as_bytes(), b.as_bytes()) {
        ([x], [y]) => complement_base(*x) == Some(*y),
        _ => false,
    }
}
