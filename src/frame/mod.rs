//! Frame containers and the producer/consumer hand-off buffers.
//!
//! Frames are owned by exactly one buffer at a time. Writers move a fully
//! converted frame in; readers copy it out. A fresh flag per buffer makes
//! sure each frame is delivered at most once.

mod buffer;
mod image;
mod store;
mod types;

pub use buffer::{BufferStats, FrameBuffer};
pub use image::{ColorImage, DistanceMap, FrameError, Image, Rgba, ValidityMap};
pub use store::{DualChannelStore, StoreStats};
pub use types::{ColorFrame, DepthFrame};
