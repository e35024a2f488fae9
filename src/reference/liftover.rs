//! UCSC chain files for lifting positions between genome builds.
//!
//! A chain header reads
//! `chain score tName tSize tStrand tStart tEnd qName qSize qStrand qStart qEnd id`
//! and is followed by alignment blocks `size dt dq`, the last block having
//! only a size. Here "target" is the source build of the summary statistics
//! and "query" is the build we lift to.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::chrom::normalize_chrom;
use crate::parsing::{open_text, ParseError};
use crate::reference::ReferenceLoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Plus),
            "-" => Some(Self::Minus),
            _ => None,
        }
    }
}

/// Result of lifting a single 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiftedPosition {
    pub chrom: String,
    pub pos: u64,
    pub strand: Strand,
}

#[derive(Debug, Clone, Copy)]
struct ChainBlock {
    size: u64,
    target_gap: u64,
    query_gap: u64,
}

#[derive(Debug, Clone)]
struct Chain {
    score: u64,
    target_start: u64,
    target_end: u64,
    query_name: String,
    query_size: u64,
    query_strand: Strand,
    query_start: u64,
    blocks: Vec<ChainBlock>,
}

impl Chain {
    /// Lift a 0-based target position; `None` if it falls in a gap
    fn lift(&self, target_pos: u64) -> Option<u64> {
        if target_pos < self.target_start || target_pos >= self.target_end {
            return None;
        }

        let mut t_pos = self.target_start;
        let mut q_pos = self.query_start;

        for block in &self.blocks {
            let block_end = t_pos + block.size;
            if target_pos < block_end {
                let offset = target_pos - t_pos;
                return Some(match self.query_strand {
                    Strand::Plus => q_pos + offset,
                    // Minus-strand query coordinates count from the end of the sequence
                    Strand::Minus => self.query_size.checked_sub(q_pos + offset + 1)?,
                });
            }

            t_pos = block_end + block.target_gap;
            q_pos += block.size + block.query_gap;
            if target_pos < t_pos {
                return None;
            }
        }
        None
    }
}

/// Chains indexed by (normalized) source chromosome
#[derive(Debug, Clone, Default)]
pub struct ChainMap {
    chains: HashMap<String, Vec<Chain>>,
}

impl ChainMap {
    /// Load a chain file (plain or gzip)
    ///
    /// # Errors
    ///
    /// Returns `ReferenceLoadError::Parse` if the file is unreadable or malformed,
    /// or `ReferenceLoadError::Empty` if it contains no chains.
    pub fn load(path: &Path) -> Result<Self, ReferenceLoadError> {
        let map = open_text(path)
            .and_then(Self::parse)
            .map_err(|source| ReferenceLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if map.chain_count() == 0 {
            return Err(ReferenceLoadError::Empty {
                path: path.to_path_buf(),
            });
        }
        info!("Loaded {} chains from {}", map.chain_count(), path.display());
        Ok(map)
    }

    /// Parse chain text from a reader
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` on a malformed header or block line.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut map = Self::default();
        let mut current: Option<(String, Chain)> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let line_num = idx + 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("chain") {
                if let Some((name, chain)) = current.take() {
                    map.add(name, chain);
                }
                current = Some(parse_header(line, line_num)?);
            } else if let Some((_, chain)) = current.as_mut() {
                chain.blocks.push(parse_block(line, line_num)?);
            } else {
                return Err(ParseError::InvalidFormat(format!(
                    "Alignment block before any chain header at line {line_num}"
                )));
            }
        }

        if let Some((name, chain)) = current {
            map.add(name, chain);
        }
        Ok(map)
    }

    fn add(&mut self, target: String, chain: Chain) {
        self.chains.entry(target).or_default().push(chain);
    }

    /// Lift a 1-based position using the highest-scoring chain that covers it.
    ///
    /// Returns `None` when no chain covers the position or it falls in a gap.
    #[must_use]
    pub fn lift(&self, chrom: &str, pos: u64) -> Option<LiftedPosition> {
        let target_pos = pos.checked_sub(1)?;
        self.chains
            .get(chrom)?
            .iter()
            .filter(|c| target_pos >= c.target_start && target_pos < c.target_end)
            .max_by_key(|c| c.score)
            .and_then(|chain| {
                chain.lift(target_pos).map(|q| LiftedPosition {
                    chrom: chain.query_name.clone(),
                    pos: q + 1,
                    strand: chain.query_strand,
                })
            })
    }

    #[must_use]
    pub fn chain_count(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }
}

fn parse_header(line: &str, line_num: usize) -> Result<(String, Chain), ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 12 {
        return Err(ParseError::InvalidFormat(format!(
            "Invalid chain header at line {line_num}: expected 12+ fields, got {}",
            parts.len()
        )));
    }

    let number = |idx: usize, what: &str| -> Result<u64, ParseError> {
        parts[idx].parse::<u64>().map_err(|_| {
            ParseError::InvalidFormat(format!("Invalid {what} '{}' at line {line_num}", parts[idx]))
        })
    };
    let strand = |idx: usize| -> Result<Strand, ParseError> {
        Strand::parse(parts[idx]).ok_or_else(|| {
            ParseError::InvalidFormat(format!("Invalid strand '{}' at line {line_num}", parts[idx]))
        })
    };

    // Target strand is always + in UCSC chains; only the query strand matters
    strand(4)?;

    let chain = Chain {
        score: number(1, "score")?,
        target_start: number(5, "target start")?,
        target_end: number(6, "target end")?,
        query_name: normalize_chrom(parts[7]),
        query_size: number(8, "query size")?,
        query_strand: strand(9)?,
        query_start: number(10, "query start")?,
        blocks: Vec::new(),
    };
    Ok((normalize_chrom(parts[2]), chain))
}

fn parse_block(line: &str, line_num: usize) -> Result<ChainBlock, ParseError> {
    let values: Vec<u64> = line
        .split_whitespace()
        .map(str::parse::<u64>)
        .collect::<Result<_, _>>()
        .map_err(|_| ParseError::InvalidFormat(format!("Invalid alignment block at line {line_num}")))?;

    match values.as_slice() {
        [size] => Ok(ChainBlock {
            size: *size,
            target_gap: 0,
            query_gap: 0,
        }),
        [size, target_gap, query_gap] => Ok(ChainBlock {
            size: *size,
            target_gap: *target_gap,
            query_gap: *query_gap,
        }),
        _ => Err(ParseError::InvalidFormat(format!(
            "Alignment block at line {line_num} must have 1 or 3 fields"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAINS: &str = "\
chain 1000 chr1 1000 + 0 1000 chr1 1100 + 0 1100 1
100\t10\t20
200\t5\t5
500

chain 500 chr2 1000 + 0 100 chr2 1000 - 0 100 2
100
";

    fn map() -> ChainMap {
        ChainMap::parse(CHAINS.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_chains() {
        assert_eq!(map().chain_count(), 2);
    }

    #[test]
    fn test_lift_plus_strand() {
        let map = map();
        // First block: 1-based 1..=100 maps with no offset
        let lifted = map.lift("1", 1).unwrap();
        assert_eq!(lifted.chrom, "1");
        assert_eq!(lifted.pos, 1);
        assert_eq!(lifted.strand, Strand::Plus);
        assert_eq!(map.lift("1", 100).unwrap().pos, 100);

        // Target gap covers 0-based 100..110
        assert!(map.lift("1", 101).is_none());
        assert!(map.lift("1", 110).is_none());

        // Second block starts at 0-based target 110, query 120
        assert_eq!(map.lift("1", 111).unwrap().pos, 121);
    }

    #[test]
    fn test_lift_minus_strand() {
        let lifted = map().lift("2", 1).unwrap();
        assert_eq!(lifted.strand, Strand::Minus);
        // 0-based 0 maps to 1000 - 0 - 1 = 999, i.e. 1-based 1000
        assert_eq!(lifted.pos, 1000);
    }

    #[test]
    fn test_lift_off_chain() {
        let map = map();
        assert!(map.lift("1", 0).is_none());
        assert!(map.lift("2", 500).is_none());
        assert!(map.lift("3", 1).is_none());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ChainMap::parse("chain 1 chr1 10 +\n".as_bytes()).is_err());
        assert!(ChainMap::parse("100\t1\t1\n".as_bytes()).is_err());
        assert!(ChainMap::parse("chain 1 chr1 10 + 0 10 chr1 10 + 0 10 1\n1 2\n".as_bytes()).is_err());
    }
}
