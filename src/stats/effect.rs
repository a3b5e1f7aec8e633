//! Standardized effect sizes.

use crate::stats::descriptive::{finite_values, mean, sample_variance};
use serde::{Deserialize, Serialize};

/// Conventional magnitude buckets for Cohen's d.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectMagnitude {
    /// Either sample had one point or fewer.
    InsufficientData,
    /// Pooled standard deviation was zero.
    None,
    /// |d| < 0.2
    Negligible,
    /// 0.2 <= |d| < 0.5
    Small,
    /// 0.5 <= |d| < 0.8
    Medium,
    /// |d| >= 0.8
    Large,
}

impl EffectMagnitude {
    /// Classify an effect size by its absolute value.
    pub fn from_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            Self::Negligible
        } else if d < 0.5 {
            Self::Small
        } else if d < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InsufficientData => "Insufficient data",
            Self::None => "None",
            Self::Negligible => "Negligible",
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

impl std::fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Cohen's d with its magnitude bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohensD {
    /// Signed effect size, (mean1 - mean2) / pooled SD.
    pub value: f64,
    /// Magnitude bucket.
    pub description: EffectMagnitude,
}

/// Cohen's d between two samples.
///
/// The pooled standard deviation is the square root of the unweighted mean of
/// the two sample variances, so unequal group sizes do not shift the weighting.
pub fn cohens_d(data1: &[f64], data2: &[f64]) -> CohensD {
    let a = finite_values(data1);
    let b = finite_values(data2);
    if a.len() <= 1 || b.len() <= 1 {
        return CohensD {
            value: 0.0,
            description: EffectMagnitude::InsufficientData,
        };
    }

    let pooled_sd = ((sample_variance(&a) + sample_variance(&b)) / 2.0).sqrt();
    if pooled_sd < f64::EPSILON {
        return CohensD {
            value: 0.0,
            description: EffectMagnitude::None,
        };
    }

    let value = (mean(&a) - mean(&b)) / pooled_sd;
    CohensD {
        value,
        description: EffectMagnitude::from_d(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cohens_d_large_effect() {
        // Both variances are 1, means differ by 2.
        let d = cohens_d(&[4.0, 5.0, 6.0], &[2.0, 3.0, 4.0]);
        assert_relative_eq!(d.value, 2.0, epsilon = 1e-12);
        assert_eq!(d.description, EffectMagnitude::Large);
    }

    #[test]
    fn test_cohens_d_unweighted_pooling() {
        // var1 = 1 (n = 3), var2 = 9 (n = 2): pooled = sqrt(5) regardless of n.
        let d = cohens_d(&[1.0, 2.0, 3.0], &[0.0, 4.242640687119285]);
        let expected_sd = ((1.0 + 9.0) / 2.0f64).sqrt();
        let expected = (2.0 - 4.242640687119285 / 2.0) / expected_sd;
        assert_relative_eq!(d.value, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_cohens_d_degenerate() {
        let d = cohens_d(&[1.0], &[1.0, 2.0]);
        assert_eq!(d.value, 0.0);
        assert_eq!(d.description.name(), "Insufficient data");

        let d = cohens_d(&[3.0, 3.0], &[3.0, 3.0, 3.0]);
        assert_eq!(d.value, 0.0);
        assert_eq!(d.description.name(), "None");
    }

    #[test]
    fn test_magnitude_buckets() {
        assert_eq!(EffectMagnitude::from_d(0.1), EffectMagnitude::Negligible);
        assert_eq!(EffectMagnitude::from_d(-0.3), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::from_d(0.5), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::from_d(0.8), EffectMagnitude::Large);
    }
}
