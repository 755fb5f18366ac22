//! Analysis configuration shared by every engine operation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compare::ComparisonConfig;
use crate::occupancy::OccupancyConfig;
use crate::strategy::StrategyParam;
use crate::timeseries::TIME_BASE_TOLERANCE;

/// Errors raised when analysis configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidTolerance { field: &'static str, value: f64 },
    #[error("{field} must be a finite number (got {value})")]
    NonFiniteParameter { field: &'static str, value: f64 },
    #[error("baseline and candidate are both {value}; nothing to compare")]
    IdenticalParameters { value: StrategyParam },
    #[error("occupancy parameter set is empty")]
    EmptyParameterSet,
    #[error("occupancy parameter {value} is listed more than once")]
    DuplicateParameter { value: StrategyParam },
}

pub(crate) fn ensure_tolerance(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTolerance { field, value })
    }
}

pub(crate) fn ensure_finite(field: &'static str, param: StrategyParam) -> Result<(), ConfigError> {
    if param.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteParameter {
            field,
            value: param.value(),
        })
    }
}

/// Top-level analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub occupancy: OccupancyConfig,
    #[serde(default = "AnalysisConfig::default_time_base_tolerance")]
    pub time_base_tolerance: f64,
}

impl AnalysisConfig {
    const fn default_time_base_tolerance() -> f64 {
        TIME_BASE_TOLERANCE
    }

    /// Load configuration from a JSON string; omitted fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.comparison.validate()?;
        self.occupancy.validate()?;
        ensure_tolerance("time_base_tolerance", self.time_base_tolerance)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            comparison: ComparisonConfig::default(),
            occupancy: OccupancyConfig::default(),
            time_base_tolerance: Self::default_time_base_tolerance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategySet;

    #[test]
    fn empty_json_yields_defaults() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!((config.comparison.tolerance - 1e-4).abs() < f64::EPSILON);
        assert_eq!(config.occupancy.max_iteration, 50);
        assert_eq!(config.occupancy.parameters.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{"comparison": {"tolerance": 0.5}, "occupancy": {"max_iteration": 10}}"#)
                .unwrap();
        assert!((config.comparison.tolerance - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.comparison.candidate, StrategyParam::new(1.0));
        assert_eq!(config.occupancy.max_iteration, 10);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.comparison.tolerance = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTolerance { field: "tolerance", .. })
        ));

        let mut config = AnalysisConfig::default();
        config.comparison.candidate = config.comparison.baseline;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IdenticalParameters { .. })
        ));

        let mut config = AnalysisConfig::default();
        config.occupancy.parameters = StrategySet::new([0.0, 0.0]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateParameter { .. })
        ));

        let mut config = AnalysisConfig::default();
        config.time_base_tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }
}
