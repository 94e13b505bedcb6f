//! Device driver seam.
//!
//! The driver owns the capture thread and everything hardware-specific
//! (transport, motor, accelerometer). This crate only talks to it through
//! [`DeviceDriver`] and receives payloads through a registered
//! [`FrameSink`](crate::capture::FrameSink).

mod driver;
mod mock;

pub use driver::{
    DeviceDriver, DeviceError, DeviceState, TiltStatus, TILT_MAX_DEGREES, TILT_MIN_DEGREES,
};
pub use mock::{MockDevice, MockHandle};
