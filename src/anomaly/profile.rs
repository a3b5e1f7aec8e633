//! Sensitivity profiles controlling anomaly detection thresholds.

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Thresholds used by the anomaly scans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityProfile {
    /// Largest tolerated growth rate between consecutive points (ln units/day).
    pub max_growth_rate: f64,
    /// Largest tolerated decline rate between consecutive points (ln units/day).
    pub max_decline_rate: f64,
    /// IQR multiplier for the log-space outlier fences.
    pub iqr_sensitivity: f64,
    /// Informational: whether reviewers should require corroborating flags.
    pub require_multiple_flags: bool,
    /// Groups smaller than this are not scanned for group outliers.
    pub min_group_size_for_iqr: usize,
    /// Informational: fractional change considered biologically meaningful.
    pub biological_change_threshold: f64,
}

impl SensitivityProfile {
    /// Check that all thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_growth_rate", self.max_growth_rate),
            ("max_decline_rate", self.max_decline_rate),
            ("iqr_sensitivity", self.iqr_sensitivity),
            ("biological_change_threshold", self.biological_change_threshold),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(QcError::InvalidParameter(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.min_group_size_for_iqr < 3 {
            return Err(QcError::InvalidParameter(
                "min_group_size_for_iqr must be at least 3".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SensitivityProfile {
    fn default() -> Self {
        ProfileName::Balanced.profile()
    }
}

/// Built-in profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileName {
    /// Flags only gross anomalies.
    Conservative,
    /// General-purpose defaults.
    #[default]
    Balanced,
    /// Flags subtle deviations; expect more manual review.
    Sensitive,
}

impl ProfileName {
    /// All built-in profiles.
    pub const ALL: [ProfileName; 3] = [Self::Conservative, Self::Balanced, Self::Sensitive];

    /// Thresholds of this profile.
    pub fn profile(&self) -> SensitivityProfile {
        match self {
            Self::Conservative => SensitivityProfile {
                max_growth_rate: 0.8,
                max_decline_rate: 0.6,
                iqr_sensitivity: 3.0,
                require_multiple_flags: true,
                min_group_size_for_iqr: 6,
                biological_change_threshold: 1.0,
            },
            Self::Balanced => SensitivityProfile {
                max_growth_rate: 0.5,
                max_decline_rate: 0.4,
                iqr_sensitivity: 2.0,
                require_multiple_flags: false,
                min_group_size_for_iqr: 4,
                biological_change_threshold: 0.5,
            },
            Self::Sensitive => SensitivityProfile {
                max_growth_rate: 0.35,
                max_decline_rate: 0.25,
                iqr_sensitivity: 1.5,
                require_multiple_flags: false,
                min_group_size_for_iqr: 3,
                biological_change_threshold: 0.3,
            },
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Sensitive => "sensitive",
        }
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Conservative => "Flags only gross measurement errors; minimal exclusions",
            Self::Balanced => "Recommended defaults for routine xenograft studies",
            Self::Sensitive => "Flags subtle deviations; suited to small, tightly controlled cohorts",
        }
    }
}

impl FromStr for ProfileName {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "balanced" => Ok(Self::Balanced),
            "sensitive" => Ok(Self::Sensitive),
            _ => Err(QcError::UnknownProfile(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProfileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A built-in profile by name, or custom thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileSelection {
    Named(ProfileName),
    Custom(SensitivityProfile),
}

impl Default for ProfileSelection {
    fn default() -> Self {
        Self::Named(ProfileName::default())
    }
}

impl ProfileSelection {
    /// Thresholds of the selected profile.
    pub fn resolve(&self) -> SensitivityProfile {
        match self {
            Self::Named(name) => name.profile(),
            Self::Custom(profile) => *profile,
        }
    }

    /// Profile name for reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Named(name) => name.name(),
            Self::Custom(_) => "custom",
        }
    }
}
