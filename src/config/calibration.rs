//! Disparity-to-distance models for raw 11-bit depth samples.

use serde::{Deserialize, Serialize};

/// Maps a raw disparity sample to a metric distance in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum DepthModel {
    /// `scale * tan(raw / divisor + phase) + bias`
    Tangent {
        /// Output scale in metres.
        scale: f64,
        /// Raw-unit divisor.
        divisor: f64,
        /// Phase offset in radians.
        phase: f64,
        /// Output offset in metres.
        bias: f64,
    },
    /// `1 / (raw * a + b)`
    InverseLinear {
        /// Slope per raw unit.
        a: f64,
        /// Intercept.
        b: f64,
    },
}

impl Default for DepthModel {
    fn default() -> Self {
        Self::Tangent {
            scale: 0.1236,
            divisor: 2842.5,
            phase: 1.1863,
            bias: -0.037,
        }
    }
}

impl DepthModel {
    /// Linear inverse model with commonly used Kinect coefficients.
    pub fn inverse_linear() -> Self {
        Self::InverseLinear {
            a: -0.003_071_1,
            b: 3.330_949_5,
        }
    }

    /// Evaluates the model. The result may be non-finite or negative for
    /// raw values past the sensor's usable range.
    pub fn distance(&self, raw: u16) -> f64 {
        let raw = f64::from(raw);
        match *self {
            Self::Tangent {
                scale,
                divisor,
                phase,
                bias,
            } => scale * (raw / divisor + phase).tan() + bias,
            Self::InverseLinear { a, b } => 1.0 / (raw * a + b),
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        match *self {
            Self::Tangent {
                scale,
                divisor,
                phase,
                bias,
            } => {
                [scale, divisor, phase, bias].iter().all(|v| v.is_finite()) && divisor != 0.0
            }
            Self::InverseLinear { a, b } => a.is_finite() && b.is_finite(),
        }
    }
}
