//! Tunables for terrain sampling and clamping.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building or loading a clamp configuration
#[derive(Error, Debug)]
pub enum ClampConfigError {
    #[error("Invalid argument: {0}")]
    ArgumentError(String),

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for the ground clamper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampConfig {
    /// Distance in metres between consecutive samples along each tangent axis
    pub sample_step: usize,
    /// Height above a sample point from which the downward pick ray starts (metres)
    pub ray_origin_height: f64,
    /// Clearance pulled off the lowest sampled height (metres)
    pub clearance_bias: f64,
}

impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            sample_step: 2,
            ray_origin_height: 1000.0,
            clearance_bias: 0.2,
        }
    }
}

impl ClampConfig {
    /// Check that every parameter is usable.
    ///
    /// # Errors
    /// * `ClampConfigError::ArgumentError` - zero step, non-positive or
    ///   non-finite ray height, negative or non-finite bias
    pub fn validate(&self) -> Result<(), ClampConfigError> {
        if self.sample_step == 0 {
            return Err(ClampConfigError::ArgumentError(
                "sample_step must be at least 1".to_string(),
            ));
        }

        if !self.ray_origin_height.is_finite() || self.ray_origin_height <= 0.0 {
            return Err(ClampConfigError::ArgumentError(format!(
                "ray_origin_height must be positive, got {}",
                self.ray_origin_height
            )));
        }

        if !self.clearance_bias.is_finite() || self.clearance_bias < 0.0 {
            return Err(ClampConfigError::ArgumentError(format!(
                "clearance_bias must be non-negative, got {}",
                self.clearance_bias
            )));
        }

        Ok(())
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ClampConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file and validate.
    ///
    /// Missing fields take their default values.
    pub fn load_from_file(path: &Path) -> Result<Self, ClampConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
