//! Longitudinal measurement series for a single animal.

use serde::{Deserialize, Deserializer, Serialize};

/// What the measurement series records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Tumor volume (mm³).
    #[default]
    Volume,
    /// Tumor or body weight (g).
    Weight,
}

impl MeasurementKind {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Weight => "weight",
        }
    }

    /// Unit label used in messages.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Volume => "mm³",
            Self::Weight => "g",
        }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One animal's time series.
///
/// `time_points` and `measurements` are parallel sequences. The invariant
/// `time_points.len() == measurements.len()` is expected but not enforced;
/// consumers only read the paired prefix. Missing measurements are stored as
/// NaN (`null` in JSON) and treated as absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimalRecord {
    /// Identifier, unique within a dataset.
    #[serde(default)]
    pub id: String,
    /// Experimental group label.
    #[serde(default)]
    pub group: String,
    /// Measurement days, non-decreasing.
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    pub time_points: Vec<f64>,
    /// One measurement per time point.
    #[serde(default, deserialize_with = "nullable_f64_vec")]
    pub measurements: Vec<f64>,
}

impl AnimalRecord {
    /// Create a new record.
    pub fn new(
        id: impl Into<String>,
        group: impl Into<String>,
        time_points: Vec<f64>,
        measurements: Vec<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            time_points,
            measurements,
        }
    }

    /// Number of paired (day, value) entries.
    pub fn len(&self) -> usize {
        self.time_points.len().min(self.measurements.len())
    }

    /// Check if the record has no paired entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both sequences have the same length.
    pub fn is_well_formed(&self) -> bool {
        self.time_points.len() == self.measurements.len()
    }

    /// Iterate over paired (day, value) entries.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time_points
            .iter()
            .copied()
            .zip(self.measurements.iter().copied())
    }

    /// Paired entries with a finite day and a finite, strictly positive value.
    pub fn positive_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points()
            .filter(|(t, v)| t.is_finite() && v.is_finite() && *v > 0.0)
    }

    /// Number of finite measurements.
    pub fn measurement_count(&self) -> usize {
        self.points().filter(|(_, v)| v.is_finite()).count()
    }

    /// Measurement recorded on a given day, if any.
    pub fn value_at(&self, day: f64) -> Option<f64> {
        self.points()
            .find(|(t, _)| same_day(*t, day))
            .map(|(_, v)| v)
    }

    /// Baseline measurement: the day-0 value if present, otherwise the first
    /// recorded value.
    pub fn baseline(&self) -> Option<f64> {
        self.value_at(0.0)
            .or_else(|| self.points().next().map(|(_, v)| v))
    }
}

/// Day equality for measurement days.
pub fn same_day(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Whether a day is the protected baseline day.
pub fn is_baseline_day(day: f64) -> bool {
    same_day(day, 0.0)
}

fn nullable_f64_vec<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}
