//! Dataset views derived from an analysis run.

use crate::data::AnimalRecord;
use serde::{Deserialize, Serialize};

/// A set of animals with simple size accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetView {
    /// Animals in this view.
    pub animals: Vec<AnimalRecord>,
    /// Number of animals.
    pub count: usize,
    /// Number of finite measurements across all animals.
    pub total_measurements: usize,
}

impl DatasetView {
    /// Build a view, computing counts from the animals.
    pub fn new(animals: Vec<AnimalRecord>) -> Self {
        let count = animals.len();
        let total_measurements = animals.iter().map(|a| a.measurement_count()).sum();
        Self {
            animals,
            count,
            total_measurements,
        }
    }

    /// Identifiers of the animals in this view.
    pub fn animal_ids(&self) -> Vec<&str> {
        self.animals.iter().map(|a| a.id.as_str()).collect()
    }

    /// Check if the view contains an animal.
    pub fn contains(&self, animal_id: &str) -> bool {
        self.animals.iter().any(|a| a.id == animal_id)
    }
}

/// A measurement removed by point-level filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedPoint {
    /// Original day.
    pub day: f64,
    /// Original value.
    pub value: f64,
    /// Why the point was removed.
    pub reason: String,
}

/// An animal after point-level filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFilteredAnimal {
    /// Remaining series.
    #[serde(flatten)]
    pub record: AnimalRecord,
    /// Points relocated out of the series.
    pub excluded_points: Vec<ExcludedPoint>,
}

/// Dataset with individual flagged points removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointFilteredView {
    /// Retained animals (each with at least three remaining points).
    pub animals: Vec<PointFilteredAnimal>,
    /// Number of retained animals.
    pub count: usize,
    /// Finite measurements remaining across retained animals.
    pub total_measurements: usize,
    /// Points removed across all animals, including dropped ones.
    pub points_excluded: usize,
    /// Animals dropped for having fewer than three remaining points.
    pub animals_dropped: Vec<String>,
}

impl PointFilteredView {
    /// Retained animals as plain records.
    pub fn records(&self) -> Vec<AnimalRecord> {
        self.animals.iter().map(|a| a.record.clone()).collect()
    }

    /// Get a retained animal by ID.
    pub fn get_animal(&self, animal_id: &str) -> Option<&PointFilteredAnimal> {
        self.animals.iter().find(|a| a.record.id == animal_id)
    }
}
