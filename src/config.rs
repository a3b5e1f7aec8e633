//! Analysis configuration, loadable from YAML or JSON.

use crate::anomaly::{FilteringStrictness, ProfileSelection};
use crate::error::{QcError, Result};
use crate::homogeneity::HomogeneityThresholds;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one analysis run.
///
/// Every field has a default, so a partial file such as
/// `strictness: all` is a complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Named (`conservative`, `balanced`, `sensitive`) or custom thresholds.
    pub profile: ProfileSelection,
    /// Which flag severities lead to exclusion.
    pub strictness: FilteringStrictness,
    /// Baseline CV thresholds.
    pub homogeneity: HomogeneityThresholds,
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(QcError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(QcError::from)
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(QcError::from)
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Check the profile and thresholds.
    pub fn validate(&self) -> Result<()> {
        self.profile.resolve().validate()?;
        self.homogeneity.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::ProfileName;
    use std::io::Write;

    #[test]
    fn test_config_yaml() {
        let config = AnalysisConfig {
            profile: ProfileSelection::Named(ProfileName::Conservative),
            strictness: FilteringStrictness::Critical,
            ..AnalysisConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("conservative"));

        let parsed = AnalysisConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = AnalysisConfig::from_yaml("strictness: all\n").unwrap();
        assert_eq!(config.strictness, FilteringStrictness::All);
        assert_eq!(config.profile, ProfileSelection::Named(ProfileName::Balanced));
        assert_eq!(config.homogeneity, HomogeneityThresholds::default());
    }

    #[test]
    fn test_custom_profile_from_yaml() {
        let yaml = "\
profile:
  max_growth_rate: 0.6
  max_decline_rate: 0.5
  iqr_sensitivity: 2.5
  require_multiple_flags: false
  min_group_size_for_iqr: 5
  biological_change_threshold: 0.4
homogeneity:
  excellent: 10
  good: 20
  poor: 30
";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.profile.name(), "custom");
        assert_eq!(config.profile.resolve().min_group_size_for_iqr, 5);
        assert_eq!(config.homogeneity.poor, 30.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "profile: sensitive").unwrap();
        let config = AnalysisConfig::from_file(yaml.path()).unwrap();
        assert_eq!(config.profile, ProfileSelection::Named(ProfileName::Sensitive));

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"strictness": "critical_and_high"}}"#).unwrap();
        let config = AnalysisConfig::from_file(json.path()).unwrap();
        assert_eq!(config.strictness, FilteringStrictness::CriticalAndHigh);

        assert!(matches!(
            AnalysisConfig::from_file("/nonexistent/config.yaml"),
            Err(QcError::Io(_))
        ));
    }

    #[test]
    fn test_invalid_thresholds() {
        let config = AnalysisConfig::from_yaml("homogeneity:\n  excellent: 40\n").unwrap();
        assert!(config.validate().is_err());
    }
}
