//! Monte Carlo estimate of pi.
//!
//! Each rank samples points uniformly in the square `[-1, 1] x [-1, 1]` and
//! counts those inside the unit circle; `4 * inside / samples` estimates pi.
//! Samples are split across ranks the same way as the terms of the parallel
//! sum, and the root combines the per-rank estimates into a mean and spread.

use crate::error::{Error, Result};
use crate::sum::Block;
use rand::Rng;

/// Default number of samples across the whole group.
pub const DEFAULT_SAMPLES: u64 = 100_000_000;

/// Parse the optional sample count given on the command line.
pub fn parse_samples(arg: Option<&str>) -> Result<u64> {
    let samples = match arg {
        None => return Ok(DEFAULT_SAMPLES),
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            Error::Config(format!("sample count is not a non-negative integer: {raw:?}"))
        })?,
    };
    if samples == 0 {
        return Err(Error::Config("sample count must be positive".into()));
    }
    Ok(samples)
}

/// Number of samples drawn by `rank` out of `size`.
///
/// Every rank needs at least one sample to produce an estimate.
pub fn samples_for_rank(total: u64, rank: i32, size: i32) -> Result<u64> {
    let samples = Block::for_rank(total, rank, size)?.len();
    if samples == 0 {
        return Err(Error::Config(format!(
            "{total} samples cannot give each of {size} processes at least one"
        )));
    }
    Ok(samples)
}

/// Draw `samples` points and count those inside the unit circle.
pub fn count_inside<R: Rng + ?Sized>(rng: &mut R, samples: u64) -> u64 {
    let mut inside = 0;
    for _ in 0..samples {
        let x = rng.gen::<f64>() * 2.0 - 1.0;
        let y = rng.gen::<f64>() * 2.0 - 1.0;
        if x * x + y * y <= 1.0 {
            inside += 1;
        }
    }
    inside
}

/// Pi estimated from `inside` hits out of `samples` draws.
pub fn estimate(inside: u64, samples: u64) -> f64 {
    4.0 * inside as f64 / samples as f64
}

/// Seed of the generator used by `rank`, so ranks draw distinct streams.
pub fn rank_seed(base: u64, rank: i32) -> u64 {
    base.wrapping_add(rank as u64)
}

/// Standard error expected from `samples` draws in total.
pub fn theoretical_error(samples: u64) -> f64 {
    1.0 / (samples as f64).sqrt()
}

/// Mean and standard deviation of the per-rank estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    /// Mean of the estimates.
    pub mean: f64,
    /// Population standard deviation of the estimates.
    pub std_dev: f64,
}

impl Spread {
    /// Build from the sum and the sum of squares of `count` estimates, as
    /// produced by two `Sum` reductions.
    pub fn from_sums(sum: f64, sum_of_squares: f64, count: i32) -> Self {
        let n = f64::from(count.max(1));
        let mean = sum / n;
        // Rounding can push a zero variance slightly negative
        let variance = (sum_of_squares / n - mean * mean).max(0.0);
        Spread {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Standard deviation relative to the mean, in percent.
    pub fn coefficient_of_variation(&self) -> f64 {
        self.std_dev / self.mean * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::PI;

    #[test]
    fn estimate_is_close_to_pi() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = 200_000;
        let pi = estimate(count_inside(&mut rng, samples), samples);
        // About ten standard errors for this sample size
        assert!((pi - PI).abs() < 0.04, "estimate {pi}");
    }

    #[test]
    fn same_seed_same_count() {
        let a = count_inside(&mut StdRng::seed_from_u64(rank_seed(42, 3)), 10_000);
        let b = count_inside(&mut StdRng::seed_from_u64(rank_seed(42, 3)), 10_000);
        assert_eq!(a, b);
        assert!(a <= 10_000);
    }

    #[test]
    fn ranks_get_distinct_seeds() {
        let seeds: Vec<u64> = (0..4).map(|rank| rank_seed(u64::MAX - 1, rank)).collect();
        assert_eq!(seeds, vec![u64::MAX - 1, u64::MAX, 0, 1]);
    }

    #[test]
    fn samples_are_split_without_loss() {
        let split: u64 = (0..3)
            .map(|rank| samples_for_rank(10, rank, 3).unwrap())
            .sum();
        assert_eq!(split, 10);
        assert_eq!(samples_for_rank(10, 0, 3).unwrap(), 4);
    }

    #[test]
    fn every_rank_needs_a_sample() {
        assert!(matches!(samples_for_rank(2, 2, 3), Err(Error::Config(_))));
        assert!(matches!(samples_for_rank(2, 3, 3), Err(Error::InvalidRank(3))));
    }

    #[test]
    fn parses_sample_count() {
        assert_eq!(parse_samples(None).unwrap(), DEFAULT_SAMPLES);
        assert_eq!(parse_samples(Some(" 5000 ")).unwrap(), 5000);
        assert!(matches!(parse_samples(Some("0")), Err(Error::Config(_))));
        assert!(matches!(parse_samples(Some("-3")), Err(Error::Config(_))));
    }

    #[test]
    fn spread_of_estimates() {
        let estimates = [3.0, 3.2, 3.1, 3.3];
        let sum: f64 = estimates.iter().sum();
        let sum_sq: f64 = estimates.iter().map(|e| e * e).sum();
        let spread = Spread::from_sums(sum, sum_sq, 4);
        assert!((spread.mean - 3.15).abs() < 1e-12);
        assert!((spread.std_dev - 0.0125f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn identical_estimates_have_no_spread() {
        let spread = Spread::from_sums(2.5 * 3.0, 2.5 * 2.5 * 3.0, 3);
        assert_eq!(spread.std_dev, 0.0);
        assert_eq!(spread.coefficient_of_variation(), 0.0);
    }

    #[test]
    fn theoretical_error_shrinks_with_samples() {
        assert_eq!(theoretical_error(10_000), 0.01);
        assert!(theoretical_error(1_000_000) < theoretical_error(10_000));
    }
}
