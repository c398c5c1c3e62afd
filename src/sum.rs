//! Block-partitioned parallel sum of `1..=total`.
//!
//! Each rank sums a contiguous block and the partial sums are reduced to the
//! root. Ranks below `total % size` get one extra element, so blocks differ in
//! length by at most one.

use crate::error::{Error, Result};

/// Default number of terms.
pub const DEFAULT_TOTAL: u64 = 1_000_000;

/// Largest term count whose sum `N * (N + 1) / 2` fits in a `u64`.
///
/// The partial sums are reduced with `u64` addition, so the grand total must
/// fit as well.
pub const MAX_TOTAL: u64 = 6_074_000_999;

/// The contiguous block of terms owned by one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// First term (1-based). Equals `last + 1` when the block is empty.
    pub first: u64,
    /// Last term, inclusive.
    pub last: u64,
}

impl Block {
    /// Block owned by `rank` out of `size` ranks.
    pub fn for_rank(total: u64, rank: i32, size: i32) -> Result<Self> {
        check_total(total)?;
        if size < 1 {
            return Err(Error::InvalidCount(i64::from(size)));
        }
        if rank < 0 || rank >= size {
            return Err(Error::InvalidRank(rank));
        }
        let (rank, size) = (rank as u64, size as u64);
        let base = total / size;
        let remainder = total % size;
        let len = base + u64::from(rank < remainder);
        let start = rank * base + rank.min(remainder);
        Ok(Block {
            first: start + 1,
            last: start + len,
        })
    }

    /// Number of terms.
    pub fn len(&self) -> u64 {
        self.last + 1 - self.first
    }

    /// Whether the block holds no terms.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the terms in the block.
    ///
    /// Saturates at `u64::MAX`, which only a hand-built block beyond
    /// [`MAX_TOTAL`] can reach.
    pub fn sum(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let n = u128::from(self.len());
        let ends = u128::from(self.first) + u128::from(self.last);
        u64::try_from(n * ends / 2).unwrap_or(u64::MAX)
    }
}

/// `1 + 2 + ... + total`, or `None` when it does not fit in a `u64`.
pub fn expected_total(total: u64) -> Option<u64> {
    let n = u128::from(total);
    u64::try_from(n * (n + 1) / 2).ok()
}

fn check_total(total: u64) -> Result<()> {
    if total > MAX_TOTAL {
        return Err(Error::Config(format!(
            "term count {total} is too large; the sum of 1..={total} overflows u64 \
             (at most {MAX_TOTAL} terms)"
        )));
    }
    Ok(())
}

/// Parse the optional term count given on the command line.
pub fn parse_total(arg: Option<&str>) -> Result<u64> {
    match arg {
        None => Ok(DEFAULT_TOTAL),
        Some(raw) => {
            let total = raw.trim().parse().map_err(|_| {
                Error::Config(format!("term count is not a non-negative integer: {raw:?}"))
            })?;
            check_total(total)?;
            Ok(total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_cover_every_term_once() {
        for size in 1..=7 {
            let mut next = 1;
            let mut total = 0;
            for rank in 0..size {
                let block = Block::for_rank(100, rank, size).unwrap();
                assert_eq!(block.first, next, "gap before rank {rank} of {size}");
                next = block.last + 1;
                total += block.sum();
            }
            assert_eq!(next, 101);
            assert_eq!(Some(total), expected_total(100));
        }
    }

    #[test]
    fn remainder_goes_to_low_ranks() {
        let lens: Vec<u64> = (0..4)
            .map(|rank| Block::for_rank(10, rank, 4).unwrap().len())
            .collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
    }

    #[test]
    fn more_ranks_than_terms() {
        let block = Block::for_rank(2, 3, 4).unwrap();
        assert!(block.is_empty());
        assert_eq!(block.sum(), 0);
    }

    #[test]
    fn default_total_matches_closed_form() {
        assert_eq!(expected_total(DEFAULT_TOTAL), Some(500_000_500_000));
        let block = Block::for_rank(DEFAULT_TOTAL, 0, 1).unwrap();
        assert_eq!(block.sum(), 500_000_500_000);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(Block::for_rank(10, 4, 4), Err(Error::InvalidRank(4))));
        assert!(matches!(Block::for_rank(10, 0, 0), Err(Error::InvalidCount(0))));
        assert!(matches!(parse_total(Some("lots")), Err(Error::Config(_))));
        assert_eq!(parse_total(None).unwrap(), DEFAULT_TOTAL);
        assert_eq!(parse_total(Some("250")).unwrap(), 250);
    }

    #[test]
    fn oversized_totals_are_rejected() {
        assert!(matches!(parse_total(Some("10000000000")), Err(Error::Config(_))));
        assert!(matches!(
            Block::for_rank(MAX_TOTAL + 1, 0, 1),
            Err(Error::Config(_))
        ));
        assert_eq!(expected_total(10_000_000_000), None);
    }

    #[test]
    fn largest_total_still_sums() {
        assert_eq!(parse_total(Some("6074000999")).unwrap(), MAX_TOTAL);
        let expected = expected_total(MAX_TOTAL).unwrap();
        assert_eq!(expected, 18_446_744_070_963_499_500);

        let whole = Block::for_rank(MAX_TOTAL, 0, 1).unwrap();
        assert_eq!(whole.sum(), expected);

        let size = 7;
        let split: u64 = (0..size)
            .map(|rank| Block::for_rank(MAX_TOTAL, rank, size).unwrap().sum())
            .sum();
        assert_eq!(split, expected);
    }
}
