//! Device configuration and calibration.
//!
//! Everything here is plain data: set it up before starting a session and
//! treat it as read-only while frames are flowing.

mod calibration;
mod device;
mod file;
mod intrinsics;

pub use calibration::DepthModel;
pub use device::{ConfigError, DeviceConfig, Dimensions};
pub use file::{FileConfig, MockSettings, OutputConfig};
pub use intrinsics::IntrinsicParameters;
