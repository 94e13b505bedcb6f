//! TOML configuration file.

use super::{ConfigError, DeviceConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Device geometry, formats and calibration.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Synthetic device settings.
    #[serde(default)]
    pub mock: MockSettings,
    /// Consumer loop settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Synthetic device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    /// Interval between emitted frames, in milliseconds.
    pub frame_interval_ms: u64,
    /// Fraction of depth samples reported as "no return" (0.0 to 1.0).
    pub no_return_ratio: f64,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33,
            no_return_ratio: 0.1,
        }
    }
}

/// Consumer loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of poll iterations to run.
    pub poll_count: u32,
    /// Delay between polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Tilt angle to request after start, in degrees.
    pub tilt_angle: Option<f32>,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            poll_count: 100,
            poll_interval_ms: 20,
            tilt_angle: None,
            metrics_port: 9090,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.device.validate()?;
        Ok(config)
    }
}
