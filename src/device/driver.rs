//! Driver abstraction for depth/color sensor devices.
//!
//! This module provides a trait-based abstraction over the device driver
//! that owns the capture thread, allowing for both real hardware and mock
//! implementations for testing.

use crate::capture::FrameSink;
use std::sync::Arc;
use thiserror::Error;

/// Lowest tilt angle the motor accepts, in degrees.
pub const TILT_MIN_DEGREES: f32 = -27.0;
/// Highest tilt angle the motor accepts, in degrees.
pub const TILT_MAX_DEGREES: f32 = 27.0;

/// Errors that can occur during driver operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device answered at the requested index.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    /// The capture thread could not be started.
    #[error("failed to start capture: {0}")]
    StartFailed(String),
    /// The capture thread did not shut down cleanly.
    #[error("failed to stop capture: {0}")]
    StopFailed(String),
    /// A motor or state request failed.
    #[error("device control failed: {0}")]
    ControlFailed(String),
    /// The request needs an active capture session.
    #[error("capture not started")]
    NotStarted,
}

/// Motor status reported with the tilt state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiltStatus {
    /// Motor is idle.
    #[default]
    Stopped,
    /// Motor hit an end stop.
    AtLimit,
    /// Motor is moving toward its target.
    Moving,
}

/// Device state refreshed by [`DeviceDriver::update_state`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceState {
    /// Current tilt angle in degrees.
    pub tilt_angle: f32,
    /// Motor status.
    pub tilt_status: TiltStatus,
    /// Accelerometer reading in m/s², device axes.
    pub accelerometer: [f64; 3],
}

/// Trait for device drivers.
///
/// The driver owns the capture thread. Between `start_capture` and the
/// return of `stop_capture` it may call the sink at any time from that
/// thread; outside that window it must not call it at all.
pub trait DeviceDriver: Send {
    /// Short human-readable device name.
    fn name(&self) -> &str;

    /// Starts the capture thread, delivering payloads to `sink`.
    fn start_capture(&mut self, sink: Arc<dyn FrameSink>) -> Result<(), DeviceError>;

    /// Stops the capture thread.
    ///
    /// Must block until no callback is running and none will follow.
    fn stop_capture(&mut self) -> Result<(), DeviceError>;

    /// Requests a tilt angle, in degrees.
    fn set_tilt_angle(&mut self, degrees: f32) -> Result<(), DeviceError>;

    /// Polls the device for fresh motor/accelerometer state.
    fn update_state(&mut self) -> Result<DeviceState, DeviceError>;
}
