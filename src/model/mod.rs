//! Exponential growth models for tumor time series.

pub mod batch;
pub mod compare;
pub mod growth;

pub use batch::{
    fit_growth_model_batch, fit_growth_model_batch_with_progress, AnimalGrowth, BatchFit,
    BatchOptions, BatchProgress, BatchStats, PROGRESS_INTERVAL,
};
pub use compare::{compare_growth_rates, GroupComparison};
pub use growth::{fit_growth_model, GrowthModel, MIN_VALID_POINTS};
