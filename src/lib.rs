//! Quality Control for Longitudinal Tumor Measurements
//!
//! This library turns noisy, small-cohort tumor time series from in vivo
//! oncology studies into auditable inclusion/exclusion decisions, fitted
//! exponential growth models and baseline homogeneity scores.
//!
//! # Overview
//!
//! The library is organized into modules:
//!
//! - **data**: Animal records, dataset views and recommendations
//! - **stats**: Statistical primitives (descriptive stats, IQR, Mann-Whitney U, Cohen's d)
//! - **anomaly**: Profile-driven anomaly flags, filtering decisions and dataset views
//! - **model**: Exponential growth model fitting, single and batched
//! - **homogeneity**: Baseline variability scoring per group
//! - **config**: YAML/JSON analysis configuration
//!
//! # Example
//!
//! ```
//! use tumor_qc::prelude::*;
//!
//! let animals = vec![
//!     AnimalRecord::new("M1", "Control", vec![0.0, 7.0, 14.0], vec![100.0, 160.0, 250.0]),
//!     AnimalRecord::new("M2", "Control", vec![0.0, 7.0, 14.0], vec![110.0, 170.0, 260.0]),
//! ];
//!
//! let config = AnalysisConfig::default();
//! let analysis = analyze_dataset(&animals, MeasurementKind::Volume, &config)?;
//! let growth = fit_growth_model(&animals[0].time_points, &animals[0].measurements)?;
//! let baseline = evaluate_homogeneity(&animals, &config.homogeneity)?;
//!
//! assert!(analysis.flags.is_empty());
//! assert!(growth.r > 0.0);
//! assert_eq!(baseline.total_groups, 1);
//! # Ok::<(), QcError>(())
//! ```

pub mod anomaly;
pub mod config;
pub mod data;
pub mod error;
pub mod homogeneity;
pub mod model;
pub mod stats;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::anomaly::{
        analyze_dataset, derive_decisions, detect_flags, dual_analysis, point_filtered_view,
        AnalysisResult, Decision, DecisionKind, DualAnalysis, FilteringStrictness, Flag, FlagType,
        ProfileName, ProfileSelection, SensitivityProfile, Severity,
    };
    pub use crate::config::AnalysisConfig;
    pub use crate::data::{
        AnimalRecord, DatasetView, MeasurementKind, PointFilteredView, Recommendation,
        RecommendationLevel,
    };
    pub use crate::error::{QcError, Result};
    pub use crate::homogeneity::{
        evaluate_homogeneity, HomogeneityReport, HomogeneityThresholds, Quality,
        StudyRecommendation,
    };
    pub use crate::model::{
        compare_growth_rates, fit_growth_model, fit_growth_model_batch,
        fit_growth_model_batch_with_progress, AnimalGrowth, BatchFit, BatchOptions, BatchProgress,
        GroupComparison, GrowthModel,
    };
    pub use crate::stats::{
        basic_stats, cohens_d, iqr_bounds, mann_whitney_u, normal_cdf, percentile, BasicStats,
        CohensD, IqrBounds, MannWhitneyResult,
    };
}
