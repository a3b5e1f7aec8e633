//! Mann-Whitney U rank-sum test with normal approximation.

use crate::error::{QcError, Result};
use crate::stats::descriptive::finite_values;
use crate::stats::normal::normal_cdf;
use serde::{Deserialize, Serialize};

/// Smallest p-value reported by the normal approximation.
pub const MIN_P_VALUE: f64 = 0.001;

/// Options for the Mann-Whitney U test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyConfig {
    /// Shrink |U - mean| by 0.5 before standardizing.
    pub continuity_correction: bool,
}

/// Result of a two-sided Mann-Whitney U test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyResult {
    /// Test statistic, min(U1, U2).
    pub u: f64,
    /// U statistic of the first sample.
    pub u1: f64,
    /// U statistic of the second sample.
    pub u2: f64,
    /// Standardized statistic (signed, U1 relative to its mean).
    pub z: f64,
    /// Two-sided p-value, floored at [`MIN_P_VALUE`].
    pub p: f64,
    /// Rank sum of the first sample.
    pub r1: f64,
    /// Rank sum of the second sample.
    pub r2: f64,
}

impl MannWhitneyResult {
    /// Check significance at a given alpha.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.p < alpha
    }
}

/// Mann-Whitney U test with default options.
///
/// The default applies no continuity correction. With the correction,
/// `[1, 2, 3]` vs `[10, 11, 12]` gives p ≈ 0.081 and completely separated
/// samples of three no longer reach p < 0.05. Use [`mann_whitney_u_with`]
/// to enable it.
///
/// Fails with [`QcError::EmptyData`] if either sample has no finite values.
pub fn mann_whitney_u(sample1: &[f64], sample2: &[f64]) -> Result<MannWhitneyResult> {
    mann_whitney_u_with(sample1, sample2, MannWhitneyConfig::default())
}

/// Mann-Whitney U test.
///
/// Ties receive mid-ranks and the variance is reduced by the tie term
/// `sum(t^3 - t) / (N (N - 1))`.
pub fn mann_whitney_u_with(
    sample1: &[f64],
    sample2: &[f64],
    config: MannWhitneyConfig,
) -> Result<MannWhitneyResult> {
    let a = finite_values(sample1);
    let b = finite_values(sample2);
    if a.is_empty() || b.is_empty() {
        return Err(QcError::EmptyData(
            "Mann-Whitney U requires two non-empty samples".to_string(),
        ));
    }

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;

    // (value, from_first_sample)
    let mut pooled: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut r1 = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i;
        while j + 1 < pooled.len() && pooled[j + 1].0 == pooled[i].0 {
            j += 1;
        }
        // Ranks are 1-based; tied block i..=j shares the average rank.
        let mid_rank = (i + j) as f64 / 2.0 + 1.0;
        let t = (j - i + 1) as f64;
        tie_term += t * t * t - t;
        r1 += pooled[i..=j].iter().filter(|(_, first)| *first).count() as f64 * mid_rank;
        i = j + 1;
    }
    let r2 = n * (n + 1.0) / 2.0 - r1;

    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;
    let u = u1.min(u2);

    let mean_u = n1 * n2 / 2.0;
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    let sd = if variance > f64::EPSILON { variance.sqrt() } else { 0.0 };

    // All observations tied: no evidence either way.
    let (z, p) = if sd > 0.0 {
        let diff = u1 - mean_u;
        let magnitude = if config.continuity_correction {
            (diff.abs() - 0.5).max(0.0)
        } else {
            diff.abs()
        };
        let z = diff.signum() * magnitude / sd;
        let p = (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(MIN_P_VALUE, 1.0);
        (z, p)
    } else {
        (0.0, 1.0)
    };

    Ok(MannWhitneyResult {
        u,
        u1,
        u2,
        z,
        p,
        r1,
        r2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_separated_samples_are_significant() {
        let result = mann_whitney_u(&[1.0, 2.0, 3.0], &[10.0, 11.0, 12.0]).unwrap();
        assert_eq!(result.u, 0.0);
        assert_eq!(result.u1, 0.0);
        assert_eq!(result.u2, 9.0);
        assert_eq!(result.r1, 6.0);
        assert_eq!(result.r2, 15.0);
        assert!(result.z < 0.0);
        assert!(result.p < 0.05);
    }

    #[test]
    fn test_continuity_correction_is_more_conservative() {
        let plain = mann_whitney_u(&[1.0, 2.0, 3.0], &[10.0, 11.0, 12.0]).unwrap();
        let corrected = mann_whitney_u_with(
            &[1.0, 2.0, 3.0],
            &[10.0, 11.0, 12.0],
            MannWhitneyConfig {
                continuity_correction: true,
            },
        )
        .unwrap();
        assert!(corrected.z.abs() < plain.z.abs());
        assert!(corrected.p > plain.p);
    }

    #[test]
    fn test_identical_samples() {
        let result = mann_whitney_u(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(result.u1, 4.5, epsilon = 1e-12);
        assert_relative_eq!(result.u, 4.5, epsilon = 1e-12);
        assert_relative_eq!(result.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.p, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_partial_ties_reduce_variance() {
        // Tie groups: 2 (x3), 3 (x2), 4 (x2) give sum(t^3 - t) = 36
        let result = mann_whitney_u(&[1.0, 2.0, 2.0, 3.0], &[2.0, 3.0, 4.0, 4.0, 5.0]).unwrap();
        assert_relative_eq!(result.r1, 12.5, epsilon = 1e-12);
        assert_relative_eq!(result.u1, 2.5, epsilon = 1e-12);
        assert_relative_eq!(result.u2, 17.5, epsilon = 1e-12);
        assert_relative_eq!(result.z, -1.8848425873, epsilon = 1e-6);
    }

    #[test]
    fn test_all_values_tied() {
        let result = mann_whitney_u(&[5.0, 5.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(result.z, 0.0);
        assert_eq!(result.p, 1.0);
    }

    #[test]
    fn test_p_value_floor() {
        let a: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let b: Vec<f64> = (100..130).map(|i| i as f64).collect();
        let result = mann_whitney_u(&a, &b).unwrap();
        assert_eq!(result.p, MIN_P_VALUE);
    }

    #[test]
    fn test_empty_sample_is_error() {
        assert!(mann_whitney_u(&[], &[1.0]).is_err());
        assert!(mann_whitney_u(&[1.0], &[f64::NAN]).is_err());
    }
}
