//! Point, trajectory and group-level anomaly scans.
//!
//! Detection is a pure function of the animals and the profile. Malformed
//! records never raise: non-finite values are skipped and only the paired
//! prefix of mismatched sequences is read.

use crate::anomaly::flag::{Flag, FlagType};
use crate::anomaly::profile::SensitivityProfile;
use crate::data::{is_baseline_day, AnimalRecord, MeasurementKind};
use crate::stats::{group_by, iqr_bounds, is_outlier};
use tracing::debug;

/// Minimum positive measurements before an animal is checked against its own
/// IQR fences.
pub const MIN_POINTS_FOR_INTRA_IQR: usize = 4;

/// Minimum positive values on a day before group fences are computed.
pub const MIN_VALUES_FOR_GROUP_IQR: usize = 3;

/// Final value below this fraction of the previous one is a last-day drop.
pub const LAST_DAY_DROP_RATIO: f64 = 0.5;

/// Run every scan over the dataset.
///
/// Flags are ordered by animal (per-animal scans) followed by group outliers
/// in group, day and animal order.
pub fn detect_flags(
    animals: &[AnimalRecord],
    profile: &SensitivityProfile,
    kind: MeasurementKind,
) -> Vec<Flag> {
    let mut flags = Vec::new();
    for animal in animals {
        flags.extend(scan_animal(animal, profile, kind));
    }
    flags.extend(scan_groups(animals, profile, kind));
    debug!(
        animals = animals.len(),
        flags = flags.len(),
        "anomaly scan complete"
    );
    flags
}

/// Point-level and trajectory checks within one animal.
pub fn scan_animal(
    animal: &AnimalRecord,
    profile: &SensitivityProfile,
    kind: MeasurementKind,
) -> Vec<Flag> {
    let mut flags = Vec::new();
    let unit = kind.unit();
    // Missing values are dropped before neighbours are paired.
    let points: Vec<(f64, f64)> = animal
        .points()
        .filter(|(day, value)| day.is_finite() && value.is_finite())
        .collect();
    let last = points.len().saturating_sub(1);

    for (i, &(day, value)) in points.iter().enumerate() {
        let flag = |flag_type: FlagType, message: String| {
            Flag::new(flag_type, &animal.id, &animal.group, day, value, message)
        };

        if value <= 0.0 {
            flags.push(flag(
                FlagType::ImpossibleValue,
                format!(
                    "Non-positive {} of {:.2} {} at day {}",
                    kind, value, unit, day
                ),
            ));
        }

        if i == 0 || is_baseline_day(day) {
            continue;
        }
        let (prev_day, prev) = points[i - 1];
        if prev <= 0.0 {
            continue;
        }

        let gap = day - prev_day;
        if value > 0.0 && gap > 0.0 {
            let rate = (value / prev).ln().abs() / gap;
            if value > prev && rate > profile.max_growth_rate {
                flags.push(flag(
                    FlagType::ExtremeGrowth,
                    format!(
                        "Growth of {:.3}/day from {:.1} to {:.1} {} exceeds the {:.3}/day limit",
                        rate, prev, value, unit, profile.max_growth_rate
                    ),
                ));
            } else if value < prev && rate > profile.max_decline_rate {
                flags.push(flag(
                    FlagType::ExtremeDecline,
                    format!(
                        "Decline of {:.3}/day from {:.1} to {:.1} {} exceeds the {:.3}/day limit",
                        rate, prev, value, unit, profile.max_decline_rate
                    ),
                ));
            }
        }

        if i == last && value < LAST_DAY_DROP_RATIO * prev {
            flags.push(flag(
                FlagType::LastDayDrop,
                format!(
                    "Final {} of {:.1} {} is below half of the previous {:.1} {}",
                    kind, value, unit, prev, unit
                ),
            ));
        }
    }

    flags.extend(scan_intra_animal(animal, profile, kind));
    flags
}

fn scan_intra_animal(
    animal: &AnimalRecord,
    profile: &SensitivityProfile,
    kind: MeasurementKind,
) -> Vec<Flag> {
    let positive: Vec<(f64, f64)> = animal.positive_points().collect();
    if positive.len() < MIN_POINTS_FOR_INTRA_IQR {
        return Vec::new();
    }

    let logs: Vec<f64> = positive.iter().map(|(_, v)| v.ln()).collect();
    let bounds = iqr_bounds(&logs, profile.iqr_sensitivity);

    positive
        .iter()
        .zip(&logs)
        .filter(|((day, _), log_value)| !is_baseline_day(*day) && is_outlier(**log_value, &bounds))
        .map(|(&(day, value), _)| {
            Flag::new(
                FlagType::IntraAnimalOutlier,
                &animal.id,
                &animal.group,
                day,
                value,
                format!(
                    "{:.1} {} lies outside this animal's log-{} range [{:.1}, {:.1}]",
                    value,
                    kind.unit(),
                    kind,
                    bounds.lower.exp(),
                    bounds.upper.exp()
                ),
            )
        })
        .collect()
}

/// Cross-animal checks within each group, day by day.
pub fn scan_groups(
    animals: &[AnimalRecord],
    profile: &SensitivityProfile,
    kind: MeasurementKind,
) -> Vec<Flag> {
    let mut flags = Vec::new();

    for (group, members) in group_by(animals.iter(), |a| a.group.clone()) {
        if members.len() < profile.min_group_size_for_iqr {
            debug!(
                group = %group,
                size = members.len(),
                required = profile.min_group_size_for_iqr,
                "group too small for IQR scan, skipping"
            );
            continue;
        }

        for day in distinct_days(&members) {
            if is_baseline_day(day) {
                continue;
            }
            let entries: Vec<(&AnimalRecord, f64)> = members
                .iter()
                .filter_map(|a| {
                    a.value_at(day)
                        .filter(|v| v.is_finite() && *v > 0.0)
                        .map(|v| (*a, v))
                })
                .collect();
            if entries.len() < MIN_VALUES_FOR_GROUP_IQR {
                continue;
            }

            let logs: Vec<f64> = entries.iter().map(|(_, v)| v.ln()).collect();
            let bounds = iqr_bounds(&logs, profile.iqr_sensitivity);

            for ((animal, value), log_value) in entries.iter().zip(&logs) {
                if is_outlier(*log_value, &bounds) {
                    flags.push(Flag::new(
                        FlagType::GroupOutlier,
                        &animal.id,
                        &animal.group,
                        day,
                        *value,
                        format!(
                            "{:.1} {} is outside group {} range [{:.1}, {:.1}] on day {}",
                            value,
                            kind.unit(),
                            group,
                            bounds.lower.exp(),
                            bounds.upper.exp(),
                            day
                        ),
                    ));
                }
            }
        }
    }

    flags
}

/// Sorted distinct finite days across a set of animals.
fn distinct_days(animals: &[&AnimalRecord]) -> Vec<f64> {
    let mut days: Vec<f64> = animals
        .iter()
        .flat_map(|a| a.points().map(|(t, _)| t))
        .filter(|t| t.is_finite())
        .collect();
    days.sort_by(|a, b| a.total_cmp(b));
    days.dedup_by(|a, b| crate::data::same_day(*a, *b));
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::profile::ProfileName;

    fn balanced() -> SensitivityProfile {
        ProfileName::Balanced.profile()
    }

    fn types(flags: &[Flag]) -> Vec<(FlagType, f64)> {
        flags.iter().map(|f| (f.flag_type, f.day)).collect()
    }

    #[test]
    fn test_impossible_value() {
        let animal = AnimalRecord::new("M1", "A", vec![0.0, 3.0, 7.0], vec![100.0, 0.0, 120.0]);
        let flags = scan_animal(&animal, &balanced(), MeasurementKind::Volume);
        assert_eq!(types(&flags), vec![(FlagType::ImpossibleValue, 3.0)]);
    }

    #[test]
    fn test_extreme_growth_and_decline() {
        let animal = AnimalRecord::new(
            "M1",
            "A",
            vec![0.0, 3.0, 6.0, 9.0],
            // ln(4)/3 = 0.46 (ok), ln(8)/3 = 0.69 (growth), ln(5)/3 = 0.54 (decline)
            vec![50.0, 200.0, 1600.0, 320.0],
        );
        let flags = scan_animal(&animal, &balanced(), MeasurementKind::Volume);
        assert_eq!(
            types(&flags),
            vec![
                (FlagType::ExtremeGrowth, 6.0),
                (FlagType::ExtremeDecline, 9.0),
                (FlagType::LastDayDrop, 9.0),
            ]
        );
    }

    #[test]
    fn test_baseline_never_gets_outlier_flags() {
        let animal = AnimalRecord::new("M1", "A", vec![0.0, 7.0, 14.0], vec![5.0, 500.0, 6.0]);
        for name in ProfileName::ALL {
            let flags = scan_animal(&animal, &name.profile(), MeasurementKind::Volume);
            assert!(flags.iter().all(|f| f.day != 0.0));
        }
        let flags = scan_animal(&animal, &balanced(), MeasurementKind::Volume);
        assert!(flags
            .iter()
            .any(|f| f.flag_type == FlagType::ExtremeGrowth && f.day == 7.0));
    }

    #[test]
    fn test_intra_animal_outlier() {
        let animal = AnimalRecord::new(
            "M1",
            "A",
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0],
            vec![100.0, 105.0, 110.0, 900.0, 115.0, 120.0],
        );
        let flags = scan_animal(&animal, &balanced(), MeasurementKind::Volume);
        let intra: Vec<_> = flags
            .iter()
            .filter(|f| f.flag_type == FlagType::IntraAnimalOutlier)
            .collect();
        assert_eq!(intra.len(), 1);
        assert_eq!(intra[0].day, 6.0);
        assert_eq!(intra[0].value, 900.0);
    }

    #[test]
    fn test_intra_animal_requires_four_points() {
        let animal = AnimalRecord::new("M1", "A", vec![0.0, 2.0, 4.0], vec![100.0, 105.0, 400.0]);
        let flags = scan_animal(&animal, &balanced(), MeasurementKind::Volume);
        assert!(flags.iter().all(|f| f.flag_type != FlagType::IntraAnimalOutlier));
    }

    #[test]
    fn test_malformed_records_do_not_panic() {
        let animals = vec![
            AnimalRecord::new("M1", "A", vec![0.0, 3.0, 7.0], vec![100.0]),
            AnimalRecord::new("M2", "A", vec![], vec![100.0, 200.0]),
            AnimalRecord::new("M3", "A", vec![0.0, f64::NAN, 7.0], vec![f64::NAN, 100.0, 110.0]),
            AnimalRecord::default(),
        ];
        let flags = detect_flags(&animals, &balanced(), MeasurementKind::Volume);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_trailing_missing_value_keeps_last_day_drop() {
        let animal = AnimalRecord::new(
            "M1",
            "A",
            vec![0.0, 7.0, 14.0, 21.0, 28.0],
            vec![100.0, 150.0, 300.0, 60.0, f64::NAN],
        );
        let flags = scan_animal(&animal, &balanced(), MeasurementKind::Volume);
        assert_eq!(types(&flags), vec![(FlagType::LastDayDrop, 21.0)]);
    }

    #[test]
    fn test_missing_value_between_points_is_skipped() {
        // 150 -> 1500 over two days once day 8 is dropped: ln(10)/2 = 1.15/day
        let animal = AnimalRecord::new(
            "M1",
            "A",
            vec![0.0, 7.0, 8.0, 9.0],
            vec![100.0, 150.0, f64::NAN, 1500.0],
        );
        let flags = scan_animal(&animal, &balanced(), MeasurementKind::Volume);
        assert_eq!(types(&flags), vec![(FlagType::ExtremeGrowth, 9.0)]);
    }

    #[test]
    fn test_group_outlier() {
        let mut animals: Vec<AnimalRecord> = (0..6)
            .map(|i| {
                AnimalRecord::new(
                    format!("M{}", i),
                    "vehicle",
                    vec![0.0, 7.0],
                    vec![100.0, 150.0 + i as f64 * 5.0],
                )
            })
            .collect();
        animals[3].measurements[1] = 2000.0;
        // Day-0 outlier must be ignored.
        animals[4].measurements[0] = 5000.0;

        let flags = scan_groups(&animals, &balanced(), MeasurementKind::Volume);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::GroupOutlier);
        assert_eq!(flags[0].animal_id, "M3");
        assert_eq!(flags[0].day, 7.0);
    }

    #[test]
    fn test_small_groups_are_skipped() {
        let animals: Vec<AnimalRecord> = [150.0, 155.0, 160.0, 2000.0]
            .iter()
            .enumerate()
            .map(|(i, v)| AnimalRecord::new(format!("M{}", i), "A", vec![0.0, 7.0], vec![100.0, *v]))
            .collect();
        let conservative = ProfileName::Conservative.profile();
        assert!(scan_groups(&animals, &conservative, MeasurementKind::Volume).is_empty());
        assert_eq!(scan_groups(&animals, &balanced(), MeasurementKind::Volume).len(), 1);
    }

    #[test]
    fn test_empty_dataset() {
        assert!(detect_flags(&[], &balanced(), MeasurementKind::Volume).is_empty());
    }
}
