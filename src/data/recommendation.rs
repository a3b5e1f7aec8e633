//! Advisory messages attached to analysis reports.

use serde::{Deserialize, Serialize};

/// How strongly a recommendation should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl RecommendationLevel {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A human-readable recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Severity of the message.
    pub level: RecommendationLevel,
    /// Free-form category ("temporal", "biological", "dataset", ...).
    pub category: String,
    /// Short title.
    pub title: String,
    /// Full message.
    pub message: String,
    /// Animals the message refers to, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animals: Vec<String>,
}

impl Recommendation {
    /// Create a recommendation that names no animals.
    pub fn new(
        level: RecommendationLevel,
        category: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category: category.into(),
            title: title.into(),
            message: message.into(),
            animals: Vec::new(),
        }
    }

    /// Attach affected animal identifiers.
    pub fn with_animals(mut self, animals: Vec<String>) -> Self {
        self.animals = animals;
        self
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.level.name().to_uppercase(),
            self.title,
            self.message
        )
    }
}
