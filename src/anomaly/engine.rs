//! Full anomaly analysis of a dataset.

use crate::anomaly::decision::{derive_decisions, Decision, DecisionCounts, FilteringStrictness};
use crate::anomaly::detect::detect_flags;
use crate::anomaly::flag::{Flag, FlagType, Severity};
use crate::anomaly::profile::SensitivityProfile;
use crate::anomaly::recommend::{dataset_recommendations, specific_recommendations};
use crate::anomaly::views::{dual_analysis, point_filtered_view, DualAnalysis};
use crate::config::AnalysisConfig;
use crate::data::{AnimalRecord, MeasurementKind, PointFilteredView, Recommendation};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// An input animal with its flags and filtering outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedAnimal {
    /// Unmodified input record.
    #[serde(flatten)]
    pub record: AnimalRecord,
    /// Flags raised on this animal.
    pub flags: Vec<Flag>,
    /// Days with an exclude decision.
    pub excluded_days: Vec<f64>,
    /// Whether the animal is absent from the animal-filtered view.
    pub excluded: bool,
}

/// Settings a result was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigUsed {
    /// Profile name ("custom" for custom thresholds).
    pub profile_name: String,
    /// Resolved thresholds.
    pub profile: SensitivityProfile,
    /// Filtering strictness for decisions.
    pub strictness: FilteringStrictness,
    /// What the measurements record.
    pub measurement_kind: MeasurementKind,
}

/// Flag and decision totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_flags: usize,
    /// Flags per type; types without flags are omitted.
    pub flag_counts: BTreeMap<FlagType, usize>,
    /// Flags per severity; severities without flags are omitted.
    pub severity_counts: BTreeMap<Severity, usize>,
    pub decision_counts: DecisionCounts,
    pub config_used: ConfigUsed,
}

impl AnalysisSummary {
    fn new(flags: &[Flag], decisions: &[Decision], config_used: ConfigUsed) -> Self {
        let mut flag_counts = BTreeMap::new();
        let mut severity_counts = BTreeMap::new();
        for flag in flags {
            *flag_counts.entry(flag.flag_type).or_insert(0) += 1;
            *severity_counts.entry(flag.severity).or_insert(0) += 1;
        }
        Self {
            total_flags: flags.len(),
            flag_counts,
            severity_counts,
            decision_counts: DecisionCounts::from_decisions(decisions),
            config_used,
        }
    }
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub animals: Vec<AnnotatedAnimal>,
    pub flags: Vec<Flag>,
    pub decisions: Vec<Decision>,
    pub dual_analysis: DualAnalysis,
    pub point_filtering: PointFilteredView,
    pub summary: AnalysisSummary,
    /// Dataset-level recommendations.
    pub recommendations: Vec<Recommendation>,
    /// Recommendations for recurring flag patterns.
    pub specific_recommendations: Vec<Recommendation>,
}

impl AnalysisResult {
    /// Re-derive decisions, views and recommendations under a different
    /// strictness, reusing the stored flags.
    ///
    /// `animals` must be the dataset the flags were detected on.
    pub fn with_strictness(
        &self,
        animals: &[AnimalRecord],
        strictness: FilteringStrictness,
    ) -> AnalysisResult {
        let used = &self.summary.config_used;
        assemble(
            animals,
            self.flags.clone(),
            ConfigUsed {
                strictness,
                ..used.clone()
            },
        )
    }

    /// Get the annotation of an animal by ID.
    pub fn get_animal(&self, animal_id: &str) -> Option<&AnnotatedAnimal> {
        self.animals.iter().find(|a| a.record.id == animal_id)
    }

    /// Flags raised on one animal.
    pub fn flags_for(&self, animal_id: &str) -> Vec<&Flag> {
        self.flags
            .iter()
            .filter(|f| f.animal_id == animal_id)
            .collect()
    }

    /// All recommendations, pattern-specific first.
    pub fn all_recommendations(&self) -> Vec<&Recommendation> {
        self.specific_recommendations
            .iter()
            .chain(self.recommendations.iter())
            .collect()
    }
}

impl std::fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = &self.summary.config_used;
        writeln!(f, "Anomaly Analysis")?;
        writeln!(f, "================")?;
        writeln!(
            f,
            "Profile: {}  Strictness: {}  Data: {}",
            used.profile_name, used.strictness, used.measurement_kind
        )?;
        writeln!(f, "Animals: {}", self.animals.len())?;
        writeln!(f, "Flags: {}", self.summary.total_flags)?;
        for (flag_type, count) in &self.summary.flag_counts {
            writeln!(f, "  {:<22} {}", flag_type.name(), count)?;
        }
        writeln!(
            f,
            "Decisions: {} include, {} exclude",
            self.summary.decision_counts.include, self.summary.decision_counts.exclude
        )?;
        writeln!(f)?;
        write!(f, "{}", self.dual_analysis)?;
        writeln!(
            f,
            "Point filtering: {} points removed, {} animals retained, {} dropped",
            self.point_filtering.points_excluded,
            self.point_filtering.count,
            self.point_filtering.animals_dropped.len()
        )?;
        let recommendations = self.all_recommendations();
        if !recommendations.is_empty() {
            writeln!(f)?;
            writeln!(f, "Recommendations:")?;
            for rec in recommendations {
                writeln!(f, "  {}", rec)?;
            }
        }
        Ok(())
    }
}

/// Run the full anomaly analysis.
///
/// Flags are detected with the configured profile, then decisions, views
/// and recommendations are derived under the configured strictness. Empty
/// input yields an empty result. Fails only if the configuration is invalid.
pub fn analyze_dataset(
    animals: &[AnimalRecord],
    kind: MeasurementKind,
    config: &AnalysisConfig,
) -> Result<AnalysisResult> {
    config.validate()?;
    let start = Instant::now();
    let profile = config.profile.resolve();

    let flags = detect_flags(animals, &profile, kind);
    let result = assemble(
        animals,
        flags,
        ConfigUsed {
            profile_name: config.profile.name().to_string(),
            profile,
            strictness: config.strictness,
            measurement_kind: kind,
        },
    );

    info!(
        animals = animals.len(),
        flags = result.summary.total_flags,
        excluded_animals = result.dual_analysis.impact.animals_excluded,
        excluded_points = result.point_filtering.points_excluded,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "anomaly analysis complete"
    );
    Ok(result)
}

fn assemble(animals: &[AnimalRecord], flags: Vec<Flag>, config_used: ConfigUsed) -> AnalysisResult {
    let strictness = config_used.strictness;
    let decisions = derive_decisions(&flags, strictness);
    let dual = dual_analysis(animals, &decisions, strictness);
    let point_filtering = point_filtered_view(animals, &decisions);

    let annotated = animals
        .iter()
        .map(|animal| AnnotatedAnimal {
            record: animal.clone(),
            flags: flags
                .iter()
                .filter(|f| f.animal_id == animal.id)
                .cloned()
                .collect(),
            excluded_days: decisions
                .iter()
                .filter(|d| d.animal_id == animal.id && d.is_excluded())
                .map(|d| d.day)
                .collect(),
            excluded: dual
                .impact
                .excluded_animal_ids
                .iter()
                .any(|id| *id == animal.id),
        })
        .collect();

    let recommendations = dataset_recommendations(&flags, &dual.impact);
    let specific = specific_recommendations(&flags);
    let summary = AnalysisSummary::new(&flags, &decisions, config_used);

    AnalysisResult {
        animals: annotated,
        flags,
        decisions,
        dual_analysis: dual,
        point_filtering,
        summary,
        recommendations,
        specific_recommendations: specific,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::profile::{ProfileName, ProfileSelection};

    fn dataset() -> Vec<AnimalRecord> {
        let days = vec![0.0, 7.0, 14.0, 21.0];
        vec![
            AnimalRecord::new("M1", "Control", days.clone(), vec![100.0, 140.0, 190.0, 260.0]),
            AnimalRecord::new("M2", "Control", days.clone(), vec![105.0, 150.0, 200.0, 270.0]),
            AnimalRecord::new("M3", "Control", days.clone(), vec![95.0, 135.0, 185.0, 250.0]),
            AnimalRecord::new("M4", "Control", days.clone(), vec![110.0, 0.0, 210.0, 280.0]),
            AnimalRecord::new("M5", "Treated", days.clone(), vec![100.0, 120.0, 130.0, 140.0]),
        ]
    }

    #[test]
    fn test_empty_dataset() {
        let result =
            analyze_dataset(&[], MeasurementKind::Volume, &AnalysisConfig::default()).unwrap();
        assert!(result.flags.is_empty());
        assert!(result.decisions.is_empty());
        assert_eq!(result.summary.total_flags, 0);
        assert!(result.summary.flag_counts.is_empty());
        assert_eq!(result.dual_analysis.complete.count, 0);
        assert_eq!(result.point_filtering.count, 0);
    }

    #[test]
    fn test_impossible_value_excludes_animal() {
        let animals = dataset();
        let result =
            analyze_dataset(&animals, MeasurementKind::Volume, &AnalysisConfig::default()).unwrap();

        assert_eq!(
            result.summary.flag_counts.get(&FlagType::ImpossibleValue),
            Some(&1)
        );
        let m4 = result.get_animal("M4").unwrap();
        assert!(m4.excluded);
        assert_eq!(m4.excluded_days, vec![7.0]);
        assert!(!result.dual_analysis.filtered.contains("M4"));
        assert_eq!(
            result.dual_analysis.complete.count - result.dual_analysis.filtered.count,
            result.dual_analysis.impact.animals_excluded
        );
        assert_eq!(result.summary.config_used.profile_name, "balanced");

        // M4 keeps three points in the point-filtered view.
        let m4_points = result.point_filtering.get_animal("M4").unwrap();
        assert_eq!(m4_points.record.time_points, vec![0.0, 14.0, 21.0]);
        assert_eq!(m4_points.excluded_points[0].value, 0.0);
    }

    #[test]
    fn test_with_strictness_reuses_flags() {
        let animals = dataset();
        let config = AnalysisConfig {
            profile: ProfileSelection::Named(ProfileName::Sensitive),
            strictness: FilteringStrictness::All,
            ..AnalysisConfig::default()
        };
        let strict = analyze_dataset(&animals, MeasurementKind::Volume, &config).unwrap();
        let lenient = strict.with_strictness(&animals, FilteringStrictness::Critical);

        assert_eq!(strict.flags, lenient.flags);
        assert_eq!(strict.decisions.len(), lenient.decisions.len());
        assert!(
            lenient.dual_analysis.impact.animals_excluded
                <= strict.dual_analysis.impact.animals_excluded
        );
        assert_eq!(
            lenient.summary.config_used.strictness,
            FilteringStrictness::Critical
        );

        let fresh = analyze_dataset(
            &animals,
            MeasurementKind::Volume,
            &AnalysisConfig {
                strictness: FilteringStrictness::Critical,
                ..config
            },
        )
        .unwrap();
        assert_eq!(fresh, lenient);
    }

    #[test]
    fn test_invalid_custom_profile_is_rejected() {
        let mut profile = SensitivityProfile::default();
        profile.iqr_sensitivity = 0.0;
        let config = AnalysisConfig {
            profile: ProfileSelection::Custom(profile),
            ..AnalysisConfig::default()
        };
        assert!(analyze_dataset(&dataset(), MeasurementKind::Volume, &config).is_err());
    }

    #[test]
    fn test_malformed_records_do_not_fail() {
        let animals = vec![
            AnimalRecord::new("M1", "A", vec![0.0, 7.0, 14.0], vec![100.0]),
            AnimalRecord::new("M2", "A", vec![], vec![]),
            AnimalRecord::new("M3", "A", vec![0.0, 7.0], vec![f64::NAN, 120.0]),
        ];
        let result =
            analyze_dataset(&animals, MeasurementKind::Weight, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.animals.len(), 3);
        assert_eq!(result.summary.config_used.measurement_kind, MeasurementKind::Weight);
    }
}
