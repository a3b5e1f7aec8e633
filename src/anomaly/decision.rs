//! Include/exclude decisions derived from flags under a filtering strictness.
//!
//! Derivation depends only on the flags and the strictness, so changing the
//! strictness never requires re-scanning the animals.

use crate::anomaly::flag::{Flag, FlagType, Severity};
use crate::data::is_baseline_day;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which severities lead to exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilteringStrictness {
    /// Exclude critical flags only.
    Critical,
    /// Exclude critical and high flags.
    #[default]
    CriticalAndHigh,
    /// Exclude every flag.
    All,
}

impl FilteringStrictness {
    /// Whether a flag of this severity leads to exclusion.
    pub fn admits(&self, severity: Severity) -> bool {
        match self {
            Self::Critical => severity == Severity::Critical,
            Self::CriticalAndHigh => severity >= Severity::High,
            Self::All => true,
        }
    }

    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::CriticalAndHigh => "critical_and_high",
            Self::All => "all",
        }
    }
}

impl std::str::FromStr for FilteringStrictness {
    type Err = crate::error::QcError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "critical" => Ok(Self::Critical),
            "critical_and_high" | "criticalandhigh" => Ok(Self::CriticalAndHigh),
            "all" => Ok(Self::All),
            _ => Err(crate::error::QcError::InvalidParameter(format!(
                "Unknown filtering strictness '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for FilteringStrictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Verdict for a flagged point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Include,
    Exclude,
}

/// Decision for one flagged (animal, day) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Animal the decision applies to.
    pub animal_id: String,
    /// Day of the flagged measurement.
    pub day: f64,
    /// Flagged measurement.
    pub value: f64,
    /// Verdict.
    pub decision: DecisionKind,
    /// Explanation.
    pub reason: String,
    /// Always true: decisions are derived by rule, not by a reviewer.
    pub automatic: bool,
    /// Flag types raised at this point.
    pub flag_types: Vec<FlagType>,
    /// Most severe flag at this point.
    pub severity: Severity,
}

impl Decision {
    /// Check if the point is excluded.
    pub fn is_excluded(&self) -> bool {
        self.decision == DecisionKind::Exclude
    }
}

/// Normalized key for a measurement day (folds -0.0 into 0.0).
fn day_key(day: f64) -> u64 {
    if day == 0.0 {
        0.0f64.to_bits()
    } else {
        day.to_bits()
    }
}

/// Derive one decision per flagged (animal, day) pair.
///
/// A pair is excluded iff it is not day 0 and its most severe flag is
/// admitted by `strictness`. Decisions appear in order of each pair's first
/// flag.
pub fn derive_decisions(flags: &[Flag], strictness: FilteringStrictness) -> Vec<Decision> {
    let mut index: HashMap<(&str, u64), usize> = HashMap::new();
    let mut decisions: Vec<Decision> = Vec::new();

    for flag in flags {
        let key = (flag.animal_id.as_str(), day_key(flag.day));
        match index.get(&key) {
            Some(&i) => {
                let decision = &mut decisions[i];
                if !decision.flag_types.contains(&flag.flag_type) {
                    decision.flag_types.push(flag.flag_type);
                }
                decision.severity = decision.severity.max(flag.severity);
            }
            None => {
                index.insert(key, decisions.len());
                decisions.push(Decision {
                    animal_id: flag.animal_id.clone(),
                    day: flag.day,
                    value: flag.value,
                    decision: DecisionKind::Include,
                    reason: String::new(),
                    automatic: true,
                    flag_types: vec![flag.flag_type],
                    severity: flag.severity,
                });
            }
        }
    }

    for decision in &mut decisions {
        let (kind, reason) = if is_baseline_day(decision.day) {
            (DecisionKind::Include, "Day 0 always preserved".to_string())
        } else if strictness.admits(decision.severity) {
            let names: Vec<&str> = decision.flag_types.iter().map(|t| t.name()).collect();
            (
                DecisionKind::Exclude,
                format!(
                    "{} ({} severity) excluded under {} filtering",
                    names.join(", "),
                    decision.severity,
                    strictness
                ),
            )
        } else {
            (
                DecisionKind::Include,
                format!(
                    "{} severity is below the {} filtering threshold",
                    decision.severity, strictness
                ),
            )
        };
        decision.decision = kind;
        decision.reason = reason;
    }

    decisions
}

/// Counts of include and exclude decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub include: usize,
    pub exclude: usize,
}

impl DecisionCounts {
    /// Tally a set of decisions.
    pub fn from_decisions(decisions: &[Decision]) -> Self {
        let exclude = decisions.iter().filter(|d| d.is_excluded()).count();
        Self {
            include: decisions.len() - exclude,
            exclude,
        }
    }
}
