//! Statistical primitives shared by the growth fitter, the anomaly engine and
//! the homogeneity evaluator.
//!
//! Every function here is pure. Descriptive helpers silently drop non-finite
//! values; the only fallible entry point is the two-sample rank test, which
//! rejects empty samples.

mod descriptive;
mod effect;
mod normal;
mod rank;

pub use descriptive::{
    basic_stats, coefficient_of_variation, doubling_time, finite_values, group_by, iqr_bounds,
    iqr_bounds_default, is_outlier, mean, median, percentile, sample_variance, tumor_growth_rate,
    BasicStats, IqrBounds,
};
pub use effect::{cohens_d, CohensD, EffectMagnitude};
pub use normal::{erf, normal_cdf};
pub use rank::{
    mann_whitney_u, mann_whitney_u_with, MannWhitneyConfig, MannWhitneyResult, MIN_P_VALUE,
};
