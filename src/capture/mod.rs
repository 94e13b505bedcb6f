//! Capture-side payload handling.
//!
//! This module turns the raw byte payloads handed over by a device driver
//! into frames: 11-bit disparity samples become a metric distance map plus
//! a validity map, packed color becomes 4-channel pixels.

mod color;
mod depth;
mod handler;

pub use color::ColorFormat;
pub use depth::{
    pack_11bit, unpack_11bit, DepthConverter, DepthFormat, DEPTH_RAW_NO_VALUE, INVALID, VALID,
};
pub use handler::{CaptureCallbackHandler, CaptureStats, FrameSink};
