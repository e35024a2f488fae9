//! Centralized validation and helper functions.

/// Maximum number of rows read from a summary-statistics table (DOS protection)
pub const MAX_ROWS: usize = 50_000_000;

/// Maximum number of sites read from a reference panel, rsID table or SNP list
pub const MAX_REFERENCE_ROWS: usize = 1_000_000_000;

/// Lowercase hex MD5 digest of a byte buffer, as written by `md5sum`.
///
/// ```
/// use sumstats_harmonizer::utils::validation::md5_hex;
///
/// assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[must_use]
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Check that a string looks like a dbSNP identifier (`rs` followed by digits).
///
/// ```
/// use sumstats_harmonizer::utils::validation::is_valid_rsid;
///
/// assert!(is_valid_rsid("rs123"));
/// assert!(!is_valid_rsid("1:12345:A:G"));
/// ```
#[must_use]
pub fn is_valid_rsid(s: &str) -> bool {
    s.strip_prefix("rs")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Check if reading another row would exceed `max`.
///
/// Call this with the current count BEFORE adding a new row.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_row_limit(count: usize, max: usize) -> Option<String> {
    if count >= max {
        Some(format!(
            "Too many rows: adding another would exceed maximum of {max}"
        ))
    } else {
        None
    }
}

/// Tokens that mean "no value" in summary-statistics files.
///
/// `nan` is not among them: it parses to a non-finite float and fails validation.
pub fn is_missing_token(s: &str) -> bool {
    matches!(
        s.trim(),
        "" | "." | "NA" | "na" | "N/A" | "null" | "NULL" | "None"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        let digest = md5_hex(b"SNP\tA1\tA2\n");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_is_valid_rsid() {
        assert!(is_valid_rsid("rs1"));
        assert!(is_valid_rsid("rs4477212"));
        assert!(!is_valid_rsid("rs"));
        assert!(!is_valid_rsid("RS12"));
        assert!(!is_valid_rsid("rs12a"));
        assert!(!is_valid_rsid("."));
    }

    #[test]
    fn test_check_row_limit() {
        assert!(check_row_limit(100, MAX_ROWS).is_none());
        assert!(check_row_limit(MAX_ROWS - 1, MAX_ROWS).is_none());
        assert!(check_row_limit(MAX_ROWS, MAX_ROWS).is_some());
        // A whole-genome panel is larger than any summary-statistics file
        assert!(check_row_limit(84_000_000, MAX_REFERENCE_ROWS).is_none());
        assert!(check_row_limit(MAX_REFERENCE_ROWS, MAX_REFERENCE_ROWS).is_some());
    }

    #[test]
    fn test_is_missing_token() {
        assert!(is_missing_token("NA"));
        assert!(is_missing_token(" "));
        assert!(is_missing_token("."));
        assert!(!is_missing_token("0"));
        assert!(!is_missing_token("nan"));
    }
}
