//! Camera intrinsic parameters.

use serde::{Deserialize, Serialize};

/// Perspective projection parameters for one camera.
///
/// `px`/`py` are the focal length expressed in pixels, `u0`/`v0` the
/// principal point. `kud` maps undistorted to distorted coordinates and
/// `kdu` the reverse; both are zero for a distortion-free model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicParameters {
    /// Focal length along x, in pixels.
    pub px: f64,
    /// Focal length along y, in pixels.
    pub py: f64,
    /// Principal point column.
    pub u0: f64,
    /// Principal point row.
    pub v0: f64,
    /// Radial distortion, undistorted to distorted.
    #[serde(default)]
    pub kud: f64,
    /// Radial distortion, distorted to undistorted.
    #[serde(default)]
    pub kdu: f64,
}

impl IntrinsicParameters {
    /// Projection model without distortion.
    pub fn without_distortion(px: f64, py: f64, u0: f64, v0: f64) -> Self {
        Self::with_distortion(px, py, u0, v0, 0.0, 0.0)
    }

    /// Projection model with radial distortion.
    pub fn with_distortion(px: f64, py: f64, u0: f64, v0: f64, kud: f64, kdu: f64) -> Self {
        Self {
            px,
            py,
            u0,
            v0,
            kud,
            kdu,
        }
    }

    /// Typical IR (depth) camera parameters at 640x480.
    pub fn kinect_ir() -> Self {
        Self::without_distortion(594.21, 591.04, 339.5, 242.7)
    }

    /// Typical RGB camera parameters at 640x480.
    pub fn kinect_rgb() -> Self {
        Self::without_distortion(529.22, 525.56, 328.94, 267.48)
    }

    /// Returns true if the model carries a distortion term.
    pub fn has_distortion(&self) -> bool {
        self.kud != 0.0 || self.kdu != 0.0
    }

    /// Back-projects pixel `(u, v)` at distance `z` into camera coordinates.
    ///
    /// Pixel coordinates are taken as distorted and corrected with `kdu`.
    pub fn deproject(&self, u: f64, v: f64, z: f64) -> [f64; 3] {
        let du = (u - self.u0) / self.px;
        let dv = (v - self.v0) / self.py;
        let r2 = du * du + dv * dv;
        let scale = 1.0 + self.kdu * r2;
        [du * scale * z, dv * scale * z, z]
    }

    pub(crate) fn is_valid(&self) -> bool {
        [self.px, self.py, self.u0, self.v0, self.kud, self.kdu]
            .iter()
            .all(|v| v.is_finite())
            && self.px > 0.0
            && self.py > 0.0
    }
}
