//! Advisory recommendations derived from flags and filtering impact.
//!
//! Thresholds here are heuristics for surfacing patterns to a reviewer. They
//! never affect flags or decisions.

use crate::anomaly::flag::{Flag, FlagType, Severity};
use crate::anomaly::views::FilteringImpact;
use crate::data::{Recommendation, RecommendationLevel};

/// Last-day drops needed before a temporal pattern is reported.
pub const LAST_DAY_DROP_PATTERN: usize = 3;
/// Extreme growth flags needed before calibration review is suggested.
pub const EXTREME_GROWTH_PATTERN: usize = 2;
/// Extreme decline flags needed before a decline pattern is reported.
pub const EXTREME_DECLINE_PATTERN: usize = 2;
/// Excluded measurements above which the data loss is reported.
pub const EXCLUDED_MEASUREMENTS_NOTICE: usize = 5;

/// Distinct animals carrying flags of one type, in flag order.
fn animals_with(flags: &[Flag], flag_type: FlagType) -> Vec<String> {
    let mut animals: Vec<String> = Vec::new();
    for flag in flags.iter().filter(|f| f.flag_type == flag_type) {
        if !animals.contains(&flag.animal_id) {
            animals.push(flag.animal_id.clone());
        }
    }
    animals
}

/// Recommendations for recurring flag patterns.
pub fn specific_recommendations(flags: &[Flag]) -> Vec<Recommendation> {
    let count = |t: FlagType| flags.iter().filter(|f| f.flag_type == t).count();
    let mut recommendations = Vec::new();

    let drops = count(FlagType::LastDayDrop);
    if drops >= LAST_DAY_DROP_PATTERN {
        let animals = animals_with(flags, FlagType::LastDayDrop);
        recommendations.push(
            Recommendation::new(
                RecommendationLevel::Warning,
                "temporal",
                "Last-Day Measurement Drops",
                format!(
                    "{} animals show a final measurement below half of the previous one ({}). \
                     Check end-of-study handling such as necropsy timing or tumor ulceration.",
                    animals.len(),
                    animals.join(", ")
                ),
            )
            .with_animals(animals),
        );
    }

    let growth = count(FlagType::ExtremeGrowth);
    if growth >= EXTREME_GROWTH_PATTERN {
        let animals = animals_with(flags, FlagType::ExtremeGrowth);
        recommendations.push(
            Recommendation::new(
                RecommendationLevel::Info,
                "biological",
                "Rapid Growth Events",
                format!(
                    "{} extreme growth events detected. Review caliper or instrument \
                     calibration for the affected measurement days.",
                    growth
                ),
            )
            .with_animals(animals),
        );
    }

    let declines = count(FlagType::ExtremeDecline);
    if declines >= EXTREME_DECLINE_PATTERN {
        let animals = animals_with(flags, FlagType::ExtremeDecline);
        let (category, message) = if animals.len() == 1 {
            (
                "individual",
                format!(
                    "Animal {} shows {} extreme declines. Inspect this animal's records \
                     for measurement or transcription errors.",
                    animals[0], declines
                ),
            )
        } else {
            (
                "systematic",
                format!(
                    "{} extreme declines across {} animals. A shared cause such as \
                     treatment response or a protocol change is likely.",
                    declines,
                    animals.len()
                ),
            )
        };
        recommendations.push(
            Recommendation::new(
                RecommendationLevel::Warning,
                category,
                "Extreme Declines",
                message,
            )
            .with_animals(animals),
        );
    }

    recommendations
}

/// Dataset-level recommendations.
pub fn dataset_recommendations(flags: &[Flag], impact: &FilteringImpact) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if impact.animals_excluded > 0 {
        recommendations.push(
            Recommendation::new(
                RecommendationLevel::Warning,
                "dataset",
                "Animals Excluded",
                format!(
                    "{} animals ({:.1}%) were excluded by automatic filtering. \
                     Review the exclusions before reporting results.",
                    impact.animals_excluded, impact.percent_animals_excluded
                ),
            )
            .with_animals(impact.excluded_animal_ids.clone()),
        );
    }

    if impact.measurements_excluded > EXCLUDED_MEASUREMENTS_NOTICE {
        recommendations.push(Recommendation::new(
            RecommendationLevel::Info,
            "dataset",
            "Measurement Loss",
            format!(
                "{} measurements were removed with excluded animals. Consider the \
                 point-filtered view to retain unaffected measurements.",
                impact.measurements_excluded
            ),
        ));
    }

    if !flags.iter().any(|f| f.severity == Severity::Critical) {
        recommendations.push(Recommendation::new(
            RecommendationLevel::Success,
            "dataset",
            "No Critical Issues",
            "No critical anomalies were detected in this dataset.",
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(flag_type: FlagType, animal: &str, day: f64) -> Flag {
        Flag::new(flag_type, animal, "A", day, 100.0, "")
    }

    #[test]
    fn test_last_day_drop_pattern() {
        let flags: Vec<Flag> = ["M1", "M2", "M3"]
            .iter()
            .map(|id| flag(FlagType::LastDayDrop, id, 21.0))
            .collect();
        let recs = specific_recommendations(&flags);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, "temporal");
        assert_eq!(recs[0].level, RecommendationLevel::Warning);
        assert_eq!(recs[0].animals, vec!["M1", "M2", "M3"]);

        assert!(specific_recommendations(&flags[..2]).is_empty());
    }

    #[test]
    fn test_extreme_decline_category() {
        let single = vec![
            flag(FlagType::ExtremeDecline, "M1", 7.0),
            flag(FlagType::ExtremeDecline, "M1", 14.0),
        ];
        assert_eq!(specific_recommendations(&single)[0].category, "individual");

        let spread = vec![
            flag(FlagType::ExtremeDecline, "M1", 7.0),
            flag(FlagType::ExtremeDecline, "M2", 14.0),
        ];
        assert_eq!(specific_recommendations(&spread)[0].category, "systematic");
    }

    #[test]
    fn test_growth_pattern_is_informational() {
        let flags = vec![
            flag(FlagType::ExtremeGrowth, "M1", 7.0),
            flag(FlagType::ExtremeGrowth, "M2", 7.0),
        ];
        let recs = specific_recommendations(&flags);
        assert_eq!(recs[0].category, "biological");
        assert_eq!(recs[0].level, RecommendationLevel::Info);
    }

    #[test]
    fn test_dataset_recommendations() {
        let clean = dataset_recommendations(&[], &FilteringImpact::default());
        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].level, RecommendationLevel::Success);

        let flags = vec![flag(FlagType::ImpossibleValue, "M1", 7.0)];
        let impact = FilteringImpact {
            animals_excluded: 1,
            measurements_excluded: 6,
            excluded_animal_ids: vec!["M1".to_string()],
            percent_animals_excluded: 10.0,
        };
        let recs = dataset_recommendations(&flags, &impact);
        let levels: Vec<_> = recs.iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![RecommendationLevel::Warning, RecommendationLevel::Info]
        );
    }
}
