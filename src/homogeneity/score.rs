//! CV thresholds, quality labels and the homogeneity score.

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};

/// Coefficient-of-variation thresholds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomogeneityThresholds {
    /// CV at or below this is excellent.
    pub excellent: f64,
    /// CV at or below this (and above excellent) is good.
    pub good: f64,
    /// CV above this is poor; between good and poor is fair.
    pub poor: f64,
}

impl Default for HomogeneityThresholds {
    fn default() -> Self {
        Self {
            excellent: 15.0,
            good: 25.0,
            poor: 35.0,
        }
    }
}

impl HomogeneityThresholds {
    /// Check that thresholds are positive and strictly increasing.
    pub fn validate(&self) -> Result<()> {
        if !(self.excellent.is_finite() && self.good.is_finite() && self.poor.is_finite()) {
            return Err(QcError::InvalidParameter(
                "homogeneity thresholds must be finite".to_string(),
            ));
        }
        if !(0.0 < self.excellent && self.excellent < self.good && self.good < self.poor) {
            return Err(QcError::InvalidParameter(format!(
                "homogeneity thresholds must satisfy 0 < excellent < good < poor, got {} / {} / {}",
                self.excellent, self.good, self.poor
            )));
        }
        Ok(())
    }

    /// Quality label for a CV.
    pub fn quality(&self, cv: f64) -> Quality {
        if cv > self.poor {
            Quality::Poor
        } else if cv > self.good {
            Quality::Fair
        } else if cv > self.excellent {
            Quality::Good
        } else {
            Quality::Excellent
        }
    }
}

/// Baseline homogeneity of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    Poor,
    /// No valid baseline measurements.
    Insufficient,
}

impl Quality {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Insufficient => "insufficient",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Groups smaller than this have their score reduced.
pub const SMALL_GROUP: usize = 5;
/// Groups smaller than this have their score reduced again.
pub const VERY_SMALL_GROUP: usize = 3;

/// Homogeneity score in [0, 100] for a group of `n` baselines with the given CV.
///
/// Above `excellent` the score starts at 95 and loses one point per CV
/// percent; above `poor` it loses two points per percent. The score is
/// continuous at `poor` and non-increasing in `cv`. Groups under 5 animals
/// are scaled by 0.8, and groups under 3 by a further 0.6.
pub fn homogeneity_score(cv: f64, n: usize, thresholds: &HomogeneityThresholds) -> f64 {
    let mut score = if cv > thresholds.poor {
        95.0 - (thresholds.poor - thresholds.excellent) - (cv - thresholds.poor) * 2.0
    } else if cv > thresholds.excellent {
        95.0 - (cv - thresholds.excellent)
    } else {
        100.0
    };
    if n < SMALL_GROUP {
        score *= 0.8;
    }
    if n < VERY_SMALL_GROUP {
        score *= 0.6;
    }
    score.max(0.0)
}
