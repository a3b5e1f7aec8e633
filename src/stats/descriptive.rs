//! Descriptive statistics, percentiles and IQR-based outlier bounds.

use serde::{Deserialize, Serialize};

/// Summary statistics over the finite values of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Median value.
    pub median: f64,
    /// Number of finite values used.
    pub count: usize,
}

impl std::fmt::Display for BasicStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Basic Statistics")?;
        writeln!(f, "  Count:   {}", self.count)?;
        writeln!(f, "  Mean:    {:.4}", self.mean)?;
        writeln!(f, "  Std Dev: {:.4}", self.std)?;
        writeln!(f, "  Median:  {:.4}", self.median)?;
        writeln!(f, "  Min:     {:.4}", self.min)?;
        writeln!(f, "  Max:     {:.4}", self.max)?;
        Ok(())
    }
}

/// Quartiles and fences of an IQR outlier rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    /// First quartile (25th percentile).
    pub q1: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
    /// Interquartile range (q3 - q1).
    pub iqr: f64,
    /// Lower fence: q1 - k * iqr.
    pub lower: f64,
    /// Upper fence: q3 + k * iqr.
    pub upper: f64,
}

/// Keep only finite values, preserving order.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Mean of the finite values, 0 for an empty sample.
pub fn mean(values: &[f64]) -> f64 {
    let valid = finite_values(values);
    if valid.is_empty() {
        return 0.0;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

/// Sample variance (n - 1 denominator) of the finite values.
///
/// Returns 0 when fewer than two finite values are present.
pub fn sample_variance(values: &[f64]) -> f64 {
    let valid = finite_values(values);
    let n = valid.len();
    if n <= 1 {
        return 0.0;
    }
    let m = valid.iter().sum::<f64>() / n as f64;
    valid.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Median of the finite values, 0 for an empty sample.
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted_finite(values);
    median_sorted(&sorted)
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        0.0
    } else if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted = finite_values(values);
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Compute mean, sample standard deviation, range and median.
///
/// Non-finite values are ignored. An empty sample yields an all-zero result.
pub fn basic_stats(values: &[f64]) -> BasicStats {
    let sorted = sorted_finite(values);
    let count = sorted.len();
    if count == 0 {
        return BasicStats::default();
    }

    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    BasicStats {
        mean,
        std,
        min: sorted[0],
        max: sorted[count - 1],
        median: median_sorted(&sorted),
        count,
    }
}

/// Coefficient of variation in percent (std / mean * 100).
///
/// Returns 0 when the mean is not positive.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let stats = basic_stats(values);
    if stats.mean > 0.0 {
        stats.std / stats.mean * 100.0
    } else {
        0.0
    }
}

/// Percentile by linear interpolation between order statistics.
///
/// `p` is clamped to [0, 100]. Only finite values participate; an empty
/// sample yields 0.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let sorted = sorted_finite(values);
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) };
    let rank = p / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// IQR fences `[q1 - k*iqr, q3 + k*iqr]` over the finite values.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> IqrBounds {
    let sorted = sorted_finite(values);
    let q1 = percentile_sorted(&sorted, 25.0);
    let q3 = percentile_sorted(&sorted, 75.0);
    let iqr = q3 - q1;
    IqrBounds {
        q1,
        q3,
        iqr,
        lower: q1 - multiplier * iqr,
        upper: q3 + multiplier * iqr,
    }
}

/// IQR fences with the conventional 1.5 multiplier.
pub fn iqr_bounds_default(values: &[f64]) -> IqrBounds {
    iqr_bounds(values, 1.5)
}

/// Whether a value lies strictly outside the fences.
pub fn is_outlier(value: f64, bounds: &IqrBounds) -> bool {
    value < bounds.lower || value > bounds.upper
}

/// Group items by key, preserving first-seen group order and the original
/// order of items within each group.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key_fn: F) -> Vec<(K, Vec<T>)>
where
    K: PartialEq,
    F: FnMut(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let key = key_fn(&item);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(item),
            None => groups.push((key, vec![item])),
        }
    }
    groups
}

/// Instantaneous exponential growth rate between two measurements.
///
/// `ln(v_y / v_x) / (t_y - t_x)`; NaN unless both volumes are strictly
/// positive and `t_y > t_x`.
pub fn tumor_growth_rate(v_x: f64, v_y: f64, t_x: f64, t_y: f64) -> f64 {
    if v_x > 0.0 && v_y > 0.0 && t_y > t_x {
        (v_y / v_x).ln() / (t_y - t_x)
    } else {
        f64::NAN
    }
}

/// Time for a positive exponential rate to double the volume.
pub fn doubling_time(rate: f64) -> Option<f64> {
    if rate > 0.0 && rate.is_finite() {
        Some(std::f64::consts::LN_2 / rate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_basic_stats() {
        let stats = basic_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert_relative_eq!(stats.mean, 5.0, epsilon = 1e-12);
        assert_relative_eq!(stats.std, (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.median, 4.5, epsilon = 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
    }

    #[test]
    fn test_basic_stats_ignores_non_finite() {
        let stats = basic_stats(&[1.0, f64::NAN, 3.0, f64::INFINITY]);
        assert_eq!(stats.count, 2);
        assert_relative_eq!(stats.mean, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_basic_stats_degenerate() {
        assert_eq!(basic_stats(&[]), BasicStats::default());
        let single = basic_stats(&[3.5]);
        assert_eq!(single.count, 1);
        assert_eq!(single.std, 0.0);
        assert_eq!(single.median, 3.5);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [10.0, 20.0, 30.0, 40.0];
        assert_relative_eq!(percentile(&values, 50.0), 25.0, epsilon = 1e-12);
        assert_relative_eq!(percentile(&values, 25.0), 17.5, epsilon = 1e-12);
        assert_eq!(percentile(&values, 0.0), 10.0);
        assert_eq!(percentile(&values, 100.0), 40.0);
        assert_eq!(percentile(&values, 150.0), 40.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_percentile_extremes_match_range() {
        let values = [3.2, -1.0, 8.5, 0.4, 2.2, f64::NAN];
        assert_eq!(percentile(&values, 0.0), -1.0);
        assert_eq!(percentile(&values, 100.0), 8.5);
    }

    #[test]
    fn test_iqr_bounds() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let bounds = iqr_bounds_default(&values);
        assert_relative_eq!(bounds.q1, 2.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.q3, 4.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.lower, -1.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.upper, 7.0, epsilon = 1e-12);
        assert!(is_outlier(7.5, &bounds));
        assert!(!is_outlier(7.0, &bounds));
    }

    #[test]
    fn test_group_by_is_stable() {
        let items = vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)];
        let groups = group_by(items, |(k, _)| *k);
        let keys: Vec<_> = groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(groups[0].1, vec![("b", 1), ("b", 3)]);
        assert_eq!(groups[1].1, vec![("a", 2), ("a", 5)]);
    }

    #[test]
    fn test_tumor_growth_rate() {
        let r = tumor_growth_rate(100.0, 200.0, 0.0, 7.0);
        assert_relative_eq!(r, std::f64::consts::LN_2 / 7.0, epsilon = 1e-12);
        assert!(tumor_growth_rate(0.0, 200.0, 0.0, 7.0).is_nan());
        assert!(tumor_growth_rate(100.0, 200.0, 7.0, 7.0).is_nan());
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_relative_eq!(
            coefficient_of_variation(&[90.0, 100.0, 110.0]),
            10.0,
            epsilon = 1e-12
        );
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }

    #[test]
    fn test_doubling_time() {
        assert_relative_eq!(doubling_time(0.1).unwrap(), 6.931471805599453, epsilon = 1e-12);
        assert!(doubling_time(0.0).is_none());
        assert!(doubling_time(-0.2).is_none());
    }
}
