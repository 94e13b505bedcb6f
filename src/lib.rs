//! Depth/Color Frame Acquisition Bridge
//!
//! Hands frames from a depth sensor driver's capture thread to a consumer
//! that polls at its own cadence. The driver calls back with raw payloads;
//! the consumer asks for "the latest frame, if there is a new one".
//!
//! # Architecture
//!
//! ```text
//! driver thread → capture (convert) → frame::DualChannelStore → acquisition → caller buffers
//!                                           ↑ one lock per channel
//! ```
//!
//! # Design Principles
//!
//! - **Never block the capture thread on the consumer**: locks are held for
//!   a move or a copy, conversions happen before locking
//! - **Last-write-wins**: an unread frame is replaced, not queued
//! - **No tearing**: every delivered frame is exactly one capture
//! - **Independent channels**: color and depth never share a lock
//!
//! # Example
//!
//! ```no_run
//! use depth_bridge::{
//!     acquisition::Acquisition,
//!     config::DeviceConfig,
//!     device::MockDevice,
//!     frame::{ColorImage, DistanceMap, ValidityMap},
//! };
//! use std::time::Duration;
//!
//! let config = DeviceConfig::default();
//! let device = MockDevice::new(&config).with_frame_interval(Duration::from_millis(33));
//! let acquisition = Acquisition::new(device, config).unwrap();
//!
//! acquisition.start().unwrap();
//! acquisition.set_tilt_angle(-5.0);
//!
//! let mut distance = DistanceMap::new(640, 480);
//! let mut validity = ValidityMap::new(640, 480);
//! let mut color = ColorImage::new(640, 480);
//!
//! for _ in 0..100 {
//!     acquisition.update_state().unwrap();
//!     if acquisition.get_depth_map(&mut distance, &mut validity) {
//!         // fresh depth
//!     }
//!     if acquisition.get_rgb(&mut color) {
//!         // fresh color
//!     }
//! }
//!
//! acquisition.stop();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod acquisition;
pub mod capture;
pub mod config;
pub mod device;
pub mod frame;
pub mod metrics;

// Re-export commonly used types at crate root
pub use acquisition::{Acquisition, AcquisitionError, AcquisitionStats, SessionState};
pub use capture::{CaptureCallbackHandler, ColorFormat, DepthConverter, DepthFormat, FrameSink};
pub use config::{DepthModel, DeviceConfig, Dimensions, FileConfig, IntrinsicParameters};
pub use device::{DeviceDriver, DeviceError, DeviceState, MockDevice};
pub use frame::{ColorFrame, DepthFrame, DualChannelStore, FrameBuffer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
