//! Device configuration.
//!
//! Channel dimensions and payload formats are fixed before capture starts;
//! incoming payloads are checked against them.

use super::{DepthModel, IntrinsicParameters};
use crate::capture::{ColorFormat, DepthFormat};
use serde::{Deserialize, Serialize};

/// Width and height of one channel, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Creates a new dimension pair.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// Per-device configuration: channel geometry, payload layouts, depth
/// calibration and both cameras' intrinsics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Color channel size.
    pub color: Dimensions,
    /// Depth channel size.
    pub depth: Dimensions,
    /// Layout of color payloads.
    pub color_format: ColorFormat,
    /// Layout of depth payloads.
    pub depth_format: DepthFormat,
    /// Raw disparity to metric distance mapping.
    pub depth_model: DepthModel,
    /// Intrinsics of the IR (depth) camera.
    pub ir_camera: IntrinsicParameters,
    /// Intrinsics of the RGB camera.
    pub rgb_camera: IntrinsicParameters,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            color: Dimensions::default(),
            depth: Dimensions::default(),
            color_format: ColorFormat::Rgb24,
            depth_format: DepthFormat::Unpacked11Bit,
            depth_model: DepthModel::default(),
            ir_camera: IntrinsicParameters::kinect_ir(),
            rgb_camera: IntrinsicParameters::kinect_rgb(),
        }
    }
}

impl DeviceConfig {
    /// Creates a configuration with the same dimensions on both channels.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            color: Dimensions::new(width, height),
            depth: Dimensions::new(width, height),
            ..Default::default()
        }
    }

    /// Returns the IR camera intrinsics.
    pub fn ir_camera_parameters(&self) -> IntrinsicParameters {
        self.ir_camera
    }

    /// Returns the RGB camera intrinsics.
    pub fn rgb_camera_parameters(&self) -> IntrinsicParameters {
        self.rgb_camera
    }

    /// Replaces the IR camera intrinsics.
    pub fn set_ir_camera_parameters(&mut self, cam: IntrinsicParameters) {
        self.ir_camera = cam;
    }

    /// Replaces the RGB camera intrinsics.
    pub fn set_rgb_camera_parameters(&mut self, cam: IntrinsicParameters) {
        self.rgb_camera = cam;
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.color.pixel_count() == 0 || self.depth.pixel_count() == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !self.depth_model.is_valid() {
            return Err(ConfigError::InvalidDepthModel);
        }
        if !self.ir_camera.is_valid() {
            return Err(ConfigError::InvalidIntrinsics("ir"));
        }
        if !self.rgb_camera.is_valid() {
            return Err(ConfigError::InvalidIntrinsics("rgb"));
        }
        if !self.color_format.supports(self.color) {
            return Err(ConfigError::UnsupportedColorGeometry(self.color_format));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A channel has zero width or height.
    #[error("invalid channel dimensions")]
    InvalidDimensions,
    /// The depth model has non-finite or degenerate constants.
    #[error("invalid depth model constants")]
    InvalidDepthModel,
    /// A camera has non-positive focal lengths or non-finite parameters.
    #[error("invalid {0} camera intrinsics")]
    InvalidIntrinsics(&'static str),
    /// The color format needs even dimensions.
    #[error("{0:?} requires even color dimensions")]
    UnsupportedColorGeometry(ColorFormat),
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
