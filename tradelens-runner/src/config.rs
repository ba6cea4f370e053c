//! Serializable analysis configuration.
//!
//! Every section and field is optional in the TOML file; missing values fall
//! back to the defaults below.
//!
//! ```toml
//! [thresholds]
//! calibration_tolerance = 0.15
//! min_adherence = 0.70
//!
//! [columns]
//! size = "tamanio"
//! controls = ["regla_riesgo_ok", "proceso_seguido"]
//!
//! [distribution]
//! histogram_bins = 15
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelens_core::ColumnConfig;

use crate::alerts::AlertThresholds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: AlertThresholds,
    pub columns: ColumnConfig,
    pub distribution: DistributionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Number of equal-width histogram bins.
    pub histogram_bins: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self { histogram_bins: 15 }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.calibration_tolerance) {
            return Err(ConfigError::Invalid(format!(
                "thresholds.calibration_tolerance must be within [0, 1], got {}",
                t.calibration_tolerance
            )));
        }
        if !(0.0..=1.0).contains(&t.min_adherence) {
            return Err(ConfigError::Invalid(format!(
                "thresholds.min_adherence must be within [0, 1], got {}",
                t.min_adherence
            )));
        }
        if self.distribution.histogram_bins == 0 {
            return Err(ConfigError::Invalid(
                "distribution.histogram_bins must be at least 1".into(),
            ));
        }

        let c = &self.columns;
        for (field, name) in [
            ("columns.size", &c.size),
            ("columns.estimated_slippage", &c.estimated_slippage),
            ("columns.actual_slippage", &c.actual_slippage),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }
        if c.controls.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "columns.controls must not contain empty names".into(),
            ));
        }
        Ok(())
    }
}
