//! Between-group comparison of fitted growth rates.

use crate::error::{QcError, Result};
use crate::model::batch::BatchFit;
use crate::stats::{cohens_d, mann_whitney_u, mean, median, CohensD, MannWhitneyResult};
use serde::{Deserialize, Serialize};

/// Growth-rate comparison of one group against the control group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupComparison {
    /// Group being compared.
    pub group: String,
    /// Reference group.
    pub control: String,
    /// Valid models in the compared group.
    pub n_group: usize,
    /// Valid models in the control group.
    pub n_control: usize,
    /// Median growth rate of the compared group.
    pub median_rate: f64,
    /// Median growth rate of the control group.
    pub median_rate_control: f64,
    /// Rank-sum test; absent when either group has no valid model.
    pub mann_whitney: Option<MannWhitneyResult>,
    /// Standardized difference, group minus control.
    pub effect_size: CohensD,
    /// Percent reduction in mean growth rate relative to control.
    pub rate_inhibition: Option<f64>,
}

impl GroupComparison {
    /// Check significance at a given alpha.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.mann_whitney.is_some_and(|mw| mw.p < alpha)
    }
}

/// Compare growth rates of every group against `control_group`.
///
/// Only animals with a valid model contribute. Groups are reported in order
/// of first appearance in the batch.
///
/// # Errors
/// [`QcError::InvalidParameter`] if the control group is not in the batch.
pub fn compare_growth_rates(batch: &BatchFit, control_group: &str) -> Result<Vec<GroupComparison>> {
    let rates_for = |group: &str| -> Vec<f64> {
        batch
            .animals
            .iter()
            .filter(|a| a.group == group)
            .filter_map(|a| a.growth_rate())
            .collect()
    };

    if !batch.animals.iter().any(|a| a.group == control_group) {
        return Err(QcError::InvalidParameter(format!(
            "Control group '{}' not found",
            control_group
        )));
    }
    let control_rates = rates_for(control_group);
    let control_mean = mean(&control_rates);

    let mut groups: Vec<&str> = Vec::new();
    for animal in &batch.animals {
        if animal.group != control_group && !groups.contains(&animal.group.as_str()) {
            groups.push(&animal.group);
        }
    }

    Ok(groups
        .into_iter()
        .map(|group| {
            let rates = rates_for(group);
            let rate_inhibition = if control_mean > 0.0 && !rates.is_empty() {
                Some((1.0 - mean(&rates) / control_mean) * 100.0)
            } else {
                None
            };
            GroupComparison {
                group: group.to_string(),
                control: control_group.to_string(),
                n_group: rates.len(),
                n_control: control_rates.len(),
                median_rate: median(&rates),
                median_rate_control: median(&control_rates),
                mann_whitney: mann_whitney_u(&rates, &control_rates).ok(),
                effect_size: cohens_d(&rates, &control_rates),
                rate_inhibition,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AnimalRecord;
    use crate::model::batch::{fit_growth_model_batch, BatchOptions};
    use crate::stats::EffectMagnitude;

    fn animal(id: &str, group: &str, rate: f64) -> AnimalRecord {
        let days = vec![0.0, 3.0, 7.0, 10.0, 14.0];
        let values = days.iter().map(|t| 120.0 * (rate * t).exp()).collect();
        AnimalRecord::new(id, group, days, values)
    }

    #[test]
    fn test_treated_group_grows_slower() {
        let mut animals = Vec::new();
        for (i, r) in [0.15, 0.16, 0.14, 0.17, 0.15, 0.16].iter().enumerate() {
            animals.push(animal(&format!("C{}", i), "vehicle", *r));
        }
        for (i, r) in [0.03, 0.05, 0.04, 0.02, 0.04, 0.05].iter().enumerate() {
            animals.push(animal(&format!("T{}", i), "drug", *r));
        }
        let batch = fit_growth_model_batch(&animals, &BatchOptions::default()).unwrap();
        let comparisons = compare_growth_rates(&batch, "vehicle").unwrap();

        assert_eq!(comparisons.len(), 1);
        let drug = &comparisons[0];
        assert_eq!(drug.group, "drug");
        assert_eq!(drug.n_group, 6);
        assert_eq!(drug.n_control, 6);
        assert!(drug.median_rate < drug.median_rate_control);
        assert!(drug.is_significant_at(0.05));
        assert_eq!(drug.effect_size.description, EffectMagnitude::Large);
        assert!(drug.rate_inhibition.unwrap() > 60.0);
    }

    #[test]
    fn test_missing_control_is_error() {
        let batch =
            fit_growth_model_batch(&[animal("M1", "drug", 0.1)], &BatchOptions::default()).unwrap();
        assert!(compare_growth_rates(&batch, "vehicle").is_err());
    }
}
