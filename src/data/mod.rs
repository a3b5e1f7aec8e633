//! Data structures shared across the analysis modules.

mod animal;
mod recommendation;
mod view;

pub use animal::{is_baseline_day, same_day, AnimalRecord, MeasurementKind};
pub use recommendation::{Recommendation, RecommendationLevel};
pub use view::{DatasetView, ExcludedPoint, PointFilteredAnimal, PointFilteredView};
