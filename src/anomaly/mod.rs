//! Multi-level anomaly detection for tumor time series.
//!
//! Analysis runs in two separable phases. Flag detection depends only on the
//! animals and a [`SensitivityProfile`]; decision derivation depends only on
//! the flags and a [`FilteringStrictness`]. Changing the strictness therefore
//! never re-scans the animals (see [`AnalysisResult::with_strictness`]).
//!
//! # Example
//!
//! ```
//! use tumor_qc::anomaly::analyze_dataset;
//! use tumor_qc::config::AnalysisConfig;
//! use tumor_qc::data::{AnimalRecord, MeasurementKind};
//!
//! let animals = vec![
//!     AnimalRecord::new("M1", "Control", vec![0.0, 7.0, 14.0], vec![100.0, 150.0, 210.0]),
//!     AnimalRecord::new("M2", "Control", vec![0.0, 7.0, 14.0], vec![110.0, -5.0, 230.0]),
//! ];
//! let result = analyze_dataset(&animals, MeasurementKind::Volume, &AnalysisConfig::default())?;
//! assert!(result.dual_analysis.impact.excluded_animal_ids.contains(&"M2".to_string()));
//! # Ok::<(), tumor_qc::error::QcError>(())
//! ```

pub mod decision;
pub mod detect;
pub mod engine;
pub mod flag;
pub mod profile;
pub mod recommend;
pub mod views;

pub use decision::{
    derive_decisions, Decision, DecisionCounts, DecisionKind, FilteringStrictness,
};
pub use detect::{detect_flags, scan_animal, scan_groups};
pub use engine::{analyze_dataset, AnalysisResult, AnalysisSummary, AnnotatedAnimal, ConfigUsed};
pub use flag::{Flag, FlagType, Severity};
pub use profile::{ProfileName, ProfileSelection, SensitivityProfile};
pub use recommend::{dataset_recommendations, specific_recommendations};
pub use views::{dual_analysis, point_filtered_view, DualAnalysis, FilteringImpact};
