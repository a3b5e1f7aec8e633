//! Complete, animal-filtered and point-filtered dataset views.

use crate::anomaly::decision::{Decision, FilteringStrictness};
use crate::data::{
    is_baseline_day, same_day, AnimalRecord, DatasetView, ExcludedPoint, PointFilteredAnimal,
    PointFilteredView,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Animals with fewer remaining points are dropped from the point-filtered view.
pub const MIN_POINTS_AFTER_FILTERING: usize = 3;

/// Reason recorded on points removed by point filtering.
pub const POINT_FILTER_REASON: &str = "Automatic filtering";

/// What whole-animal filtering removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteringImpact {
    /// Number of animals removed.
    pub animals_excluded: usize,
    /// Number of finite measurements removed with those animals.
    pub measurements_excluded: usize,
    /// Identifiers of removed animals, in dataset order.
    pub excluded_animal_ids: Vec<String>,
    /// Percent of animals removed.
    pub percent_animals_excluded: f64,
}

/// The complete dataset next to the animal-filtered dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DualAnalysis {
    /// Every animal, unfiltered.
    pub complete: DatasetView,
    /// Animals without any effective exclusion.
    pub filtered: DatasetView,
    /// Difference between the two.
    pub impact: FilteringImpact,
}

impl std::fmt::Display for DualAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dual Analysis")?;
        writeln!(
            f,
            "  Complete: {} animals, {} measurements",
            self.complete.count, self.complete.total_measurements
        )?;
        writeln!(
            f,
            "  Filtered: {} animals, {} measurements",
            self.filtered.count, self.filtered.total_measurements
        )?;
        writeln!(
            f,
            "  Excluded: {} animals ({:.1}%)",
            self.impact.animals_excluded, self.impact.percent_animals_excluded
        )?;
        Ok(())
    }
}

/// Split the dataset into complete and animal-filtered views.
///
/// An animal is removed iff it has an exclude decision whose severity is
/// still admitted by `strictness`. Decisions derived under the same
/// strictness always pass this check; it guards against decisions carried
/// over from a different strictness.
pub fn dual_analysis(
    animals: &[AnimalRecord],
    decisions: &[Decision],
    strictness: FilteringStrictness,
) -> DualAnalysis {
    let excluded: HashSet<&str> = decisions
        .iter()
        .filter(|d| d.is_excluded() && strictness.admits(d.severity))
        .map(|d| d.animal_id.as_str())
        .collect();

    let complete = DatasetView::new(animals.to_vec());
    let filtered = DatasetView::new(
        animals
            .iter()
            .filter(|a| !excluded.contains(a.id.as_str()))
            .cloned()
            .collect(),
    );

    let excluded_animal_ids: Vec<String> = animals
        .iter()
        .filter(|a| excluded.contains(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect();
    let animals_excluded = complete.count - filtered.count;
    let percent_animals_excluded = if complete.count > 0 {
        animals_excluded as f64 / complete.count as f64 * 100.0
    } else {
        0.0
    };

    DualAnalysis {
        impact: FilteringImpact {
            animals_excluded,
            measurements_excluded: complete.total_measurements - filtered.total_measurements,
            excluded_animal_ids,
            percent_animals_excluded,
        },
        complete,
        filtered,
    }
}

/// Remove individually excluded points, keeping the rest of each series.
///
/// Independent of whole-animal filtering. Day-0 points are never removed.
/// Animals left with fewer than [`MIN_POINTS_AFTER_FILTERING`] points are
/// dropped from the view.
pub fn point_filtered_view(animals: &[AnimalRecord], decisions: &[Decision]) -> PointFilteredView {
    let mut view = PointFilteredView::default();

    for animal in animals {
        let excluded_days: Vec<f64> = decisions
            .iter()
            .filter(|d| d.animal_id == animal.id && d.is_excluded() && !is_baseline_day(d.day))
            .map(|d| d.day)
            .collect();

        let mut time_points = Vec::with_capacity(animal.len());
        let mut measurements = Vec::with_capacity(animal.len());
        let mut excluded_points = Vec::new();
        for (day, value) in animal.points() {
            if excluded_days.iter().any(|d| same_day(*d, day)) {
                excluded_points.push(ExcludedPoint {
                    day,
                    value,
                    reason: POINT_FILTER_REASON.to_string(),
                });
            } else {
                time_points.push(day);
                measurements.push(value);
            }
        }
        view.points_excluded += excluded_points.len();

        if time_points.len() < MIN_POINTS_AFTER_FILTERING {
            view.animals_dropped.push(animal.id.clone());
            continue;
        }

        view.animals.push(PointFilteredAnimal {
            record: AnimalRecord::new(&animal.id, &animal.group, time_points, measurements),
            excluded_points,
        });
    }

    view.count = view.animals.len();
    view.total_measurements = view
        .animals
        .iter()
        .map(|a| a.record.measurement_count())
        .sum();
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::decision::derive_decisions;
    use crate::anomaly::flag::{Flag, FlagType};

    fn animals() -> Vec<AnimalRecord> {
        vec![
            AnimalRecord::new("M1", "A", vec![0.0, 7.0, 14.0, 21.0], vec![100.0, 150.0, 900.0, 300.0]),
            AnimalRecord::new("M2", "A", vec![0.0, 7.0, 14.0], vec![100.0, 160.0, 230.0]),
            AnimalRecord::new("M3", "A", vec![0.0, 7.0, 14.0], vec![110.0, -1.0, 250.0]),
        ]
    }

    fn flags() -> Vec<Flag> {
        vec![
            Flag::new(FlagType::ExtremeGrowth, "M1", "A", 14.0, 900.0, ""),
            Flag::new(FlagType::GroupOutlier, "M2", "A", 14.0, 230.0, ""),
            Flag::new(FlagType::ImpossibleValue, "M3", "A", 7.0, -1.0, ""),
        ]
    }

    #[test]
    fn test_dual_analysis_counts() {
        let animals = animals();
        let decisions = derive_decisions(&flags(), FilteringStrictness::CriticalAndHigh);
        let dual = dual_analysis(&animals, &decisions, FilteringStrictness::CriticalAndHigh);

        assert_eq!(dual.complete.count, 3);
        assert_eq!(dual.filtered.count, 1);
        assert_eq!(dual.complete.count - dual.filtered.count, dual.impact.animals_excluded);
        assert_eq!(dual.impact.excluded_animal_ids, vec!["M1", "M3"]);
        assert_eq!(dual.impact.measurements_excluded, 7);
        assert!(dual.filtered.contains("M2"));
    }

    #[test]
    fn test_stale_decisions_are_rechecked() {
        let animals = animals();
        let decisions = derive_decisions(&flags(), FilteringStrictness::All);
        let dual = dual_analysis(&animals, &decisions, FilteringStrictness::Critical);
        // The medium-severity exclusion for M2 no longer applies.
        assert_eq!(dual.impact.excluded_animal_ids, vec!["M1", "M3"]);
    }

    #[test]
    fn test_point_filtered_view() {
        let animals = animals();
        let decisions = derive_decisions(&flags(), FilteringStrictness::CriticalAndHigh);
        let view = point_filtered_view(&animals, &decisions);

        // M1 keeps 3 points, M2 untouched, M3 drops to 2 points.
        assert_eq!(view.count, 2);
        assert_eq!(view.animals_dropped, vec!["M3"]);
        assert_eq!(view.points_excluded, 2);

        let m1 = view.get_animal("M1").unwrap();
        assert_eq!(m1.record.time_points, vec![0.0, 7.0, 21.0]);
        assert_eq!(m1.record.measurements, vec![100.0, 150.0, 300.0]);
        assert_eq!(m1.excluded_points.len(), 1);
        assert_eq!(m1.excluded_points[0].day, 14.0);
        assert_eq!(m1.excluded_points[0].value, 900.0);
        assert_eq!(m1.excluded_points[0].reason, POINT_FILTER_REASON);

        for animal in &view.animals {
            assert_eq!(animal.record.time_points.len(), animal.record.measurements.len());
            assert!(animal.record.len() >= MIN_POINTS_AFTER_FILTERING);
        }
    }
}
