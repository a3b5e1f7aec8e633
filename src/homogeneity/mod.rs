//! Baseline homogeneity of experimental groups.
//!
//! Groups whose starting tumor sizes vary widely make growth comparisons
//! unreliable. Each group is scored from the coefficient of variation of its
//! baselines, and the study receives a PROCEED, CAUTION or REVIEW verdict.

mod evaluate;
mod score;

pub use evaluate::{
    evaluate_homogeneity, GroupHomogeneityResult, HomogeneityReport, OverallAssessment,
    StudyRecommendation,
};
pub use score::{homogeneity_score, HomogeneityThresholds, Quality, SMALL_GROUP, VERY_SMALL_GROUP};
