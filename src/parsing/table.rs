//! Delimited text tables with a header row.
//!
//! This is the "already-parsed row iterator with named fields" the
//! harmonization core consumes: a header plus string cells, with no
//! interpretation of column meaning (that is the schema normalizer's job).

use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use crate::parsing::{open_text, ParseError};
use crate::utils::validation::{check_row_limit, MAX_REFERENCE_ROWS, MAX_ROWS};

/// Field separator detected from the header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Whitespace,
}

impl Delimiter {
    /// Pick the delimiter used by a header line
    pub fn detect(header: &str) -> Self {
        if header.contains('\t') {
            Self::Tab
        } else if header.contains(',') {
            Self::Comma
        } else {
            Self::Whitespace
        }
    }

    pub fn split<'a>(self, line: &'a str) -> Vec<&'a str> {
        match self {
            Self::Tab => line.split('\t').collect(),
            Self::Comma => line.split(',').collect(),
            Self::Whitespace => line.split_whitespace().collect(),
        }
    }
}

/// A raw table: header names plus rows of string cells
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in file order
    pub header: Vec<String>,

    /// Data rows; every row has exactly `header.len()` cells
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Find a column by name (case-insensitive, ignoring a leading `#`)
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = canonical_header(name);
        self.header
            .iter()
            .position(|h| canonical_header(h) == wanted)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Header comparison key: trimmed, lower-cased, without a leading `#`
pub fn canonical_header(name: &str) -> String {
    name.trim().trim_start_matches('#').trim().to_lowercase()
}

/// Read a delimited table from a file (plain or gzip)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::InvalidFormat`
/// if it has no header, or `ParseError::TooManyRows` if the limit is exceeded.
pub fn read_table(path: &Path) -> Result<RawTable, ParseError> {
    read_table_from(open_text(path)?)
}

/// Read a reference panel or rsID table, which may hold far more rows than
/// a summary-statistics file
///
/// # Errors
///
/// See [`read_table`].
pub fn read_reference_table(path: &Path) -> Result<RawTable, ParseError> {
    read_table_with_limit(open_text(path)?, MAX_REFERENCE_ROWS)
}

/// Parse a delimited table from text
///
/// # Errors
///
/// See [`read_table_from`].
pub fn parse_table_text(text: &str) -> Result<RawTable, ParseError> {
    read_table_from(text.as_bytes())
}

/// Read a delimited table from any buffered reader.
///
/// Lines starting with `##` are treated as metadata and skipped, as are blank
/// lines. The first remaining line is the header; its delimiter is used for
/// every row. Short rows are padded with empty cells and long rows truncated,
/// so a malformed row becomes a record with missing fields instead of
/// aborting the whole file.
///
/// # Errors
///
/// Returns `ParseError::Io` on read failure, `ParseError::InvalidFormat` if no
/// header is found, or `ParseError::TooManyRows` if the limit is exceeded.
pub fn read_table_from<R: BufRead>(reader: R) -> Result<RawTable, ParseError> {
    read_table_with_limit(reader, MAX_ROWS)
}

/// [`read_table_from`] with an explicit row limit
///
/// # Errors
///
/// See [`read_table_from`].
pub fn read_table_with_limit<R: BufRead>(reader: R, max_rows: usize) -> Result<RawTable, ParseError> {
    let mut lines = reader.lines();

    let (header, delimiter) = loop {
        let Some(line) = lines.next() else {
            return Err(ParseError::InvalidFormat(
                "No header line found".to_string(),
            ));
        };
        let line = line?;
        if is_skipped(&line) {
            continue;
        }
        let delimiter = Delimiter::detect(&line);
        break (split_cells(delimiter, &line), delimiter);
    };

    let mut rows = Vec::new();
    let mut ragged = 0usize;

    for line in lines {
        let line = line?;
        if is_skipped(&line) {
            continue;
        }

        if check_row_limit(rows.len(), max_rows).is_some() {
            return Err(ParseError::TooManyRows(rows.len()));
        }

        let mut cells = split_cells(delimiter, &line);
        if cells.len() != header.len() {
            ragged += 1;
            cells.resize(header.len(), String::new());
        }
        rows.push(cells);
    }

    if ragged > 0 {
        debug!("{ragged} rows did not match the header width and were padded or truncated");
    }

    Ok(RawTable { header, rows })
}

fn is_skipped(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with("##")
}

fn split_cells(delimiter: Delimiter, line: &str) -> Vec<String> {
    delimiter
        .split(line.trim_end_matches('\r'))
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect()
}
