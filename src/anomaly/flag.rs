//! Anomaly flags and their static metadata.

use serde::{Deserialize, Serialize};

/// Severity of a flag. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of anomaly detected at one (animal, day) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagType {
    /// Zero or negative measurement.
    ImpossibleValue,
    /// Growth between consecutive measurements faster than the profile allows.
    ExtremeGrowth,
    /// Decline between consecutive measurements faster than the profile allows.
    ExtremeDecline,
    /// Outside the animal's own log-space IQR fences.
    IntraAnimalOutlier,
    /// Outside the group's log-space IQR fences on that day.
    GroupOutlier,
    /// Final measurement below half of the previous one.
    LastDayDrop,
}

impl FlagType {
    /// All flag types in reporting order.
    pub const ALL: [FlagType; 6] = [
        Self::ImpossibleValue,
        Self::ExtremeGrowth,
        Self::ExtremeDecline,
        Self::IntraAnimalOutlier,
        Self::GroupOutlier,
        Self::LastDayDrop,
    ];

    /// Severity assigned to this flag type.
    pub fn severity(&self) -> Severity {
        match self {
            Self::ImpossibleValue | Self::ExtremeGrowth | Self::ExtremeDecline => {
                Severity::Critical
            }
            Self::IntraAnimalOutlier => Severity::High,
            Self::GroupOutlier | Self::LastDayDrop => Severity::Medium,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ImpossibleValue => "Impossible Value",
            Self::ExtremeGrowth => "Extreme Growth",
            Self::ExtremeDecline => "Extreme Decline",
            Self::IntraAnimalOutlier => "Intra-Animal Outlier",
            Self::GroupOutlier => "Group Outlier",
            Self::LastDayDrop => "Last Day Drop",
        }
    }

    /// Display color for charts and tables.
    pub fn color(&self) -> &'static str {
        match self {
            Self::ImpossibleValue => "#8b0000",
            Self::ExtremeGrowth => "#dc3545",
            Self::ExtremeDecline => "#e83e8c",
            Self::IntraAnimalOutlier => "#fd7e14",
            Self::GroupOutlier => "#ffc107",
            Self::LastDayDrop => "#6f42c1",
        }
    }

    /// Whether the flag marks a statistical or trajectory outlier. Baseline
    /// (day 0) measurements never receive one.
    pub fn is_outlier_type(&self) -> bool {
        !matches!(self, Self::ImpossibleValue)
    }
}

impl std::fmt::Display for FlagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single detected anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    /// Kind of anomaly.
    pub flag_type: FlagType,
    /// Severity of the kind, denormalized for reporting.
    pub severity: Severity,
    /// Animal the flag refers to.
    pub animal_id: String,
    /// Group of that animal.
    pub group: String,
    /// Day of the flagged measurement.
    pub day: f64,
    /// Flagged measurement.
    pub value: f64,
    /// Explanation.
    pub message: String,
}

impl Flag {
    /// Create a flag; severity is taken from the flag type.
    pub fn new(
        flag_type: FlagType,
        animal_id: impl Into<String>,
        group: impl Into<String>,
        day: f64,
        value: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            flag_type,
            severity: flag_type.severity(),
            animal_id: animal_id.into(),
            group: group.into(),
            day,
            value,
            message: message.into(),
        }
    }
}
