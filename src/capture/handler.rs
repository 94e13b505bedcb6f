//! Capture-thread entry points.
//!
//! The driver calls into a [`FrameSink`] from its own capture thread. The
//! handler converts each payload into a complete frame first and only then
//! takes the channel lock, for as long as it takes to swap the frame in.

use super::{ColorFormat, DepthConverter, DepthFormat};
use crate::config::{DeviceConfig, Dimensions};
use crate::frame::{ColorFrame, DepthFrame, DualChannelStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receiver of raw payloads, implemented by whoever consumes a driver's
/// capture thread.
///
/// Implementations must return quickly and must never wait on the consumer.
pub trait FrameSink: Send + Sync {
    /// A packed color image arrived.
    fn on_color_payload(&self, raw: &[u8], timestamp: u32);

    /// A packed depth image arrived.
    fn on_depth_payload(&self, raw: &[u8], timestamp: u32);
}

/// Counters kept by the capture side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Color payloads converted and published.
    pub color_frames: u64,
    /// Depth payloads converted and published.
    pub depth_frames: u64,
    /// Color payloads dropped for a size mismatch.
    pub color_rejected: u64,
    /// Depth payloads dropped for a size mismatch.
    pub depth_rejected: u64,
}

#[derive(Debug, Default)]
struct Counters {
    color_frames: AtomicU64,
    depth_frames: AtomicU64,
    color_rejected: AtomicU64,
    depth_rejected: AtomicU64,
}

/// Converts driver payloads and publishes them into a [`DualChannelStore`].
#[derive(Debug)]
pub struct CaptureCallbackHandler {
    store: Arc<DualChannelStore>,
    color_dims: Dimensions,
    depth_dims: Dimensions,
    color_format: ColorFormat,
    depth_format: DepthFormat,
    depth: DepthConverter,
    counters: Counters,
}

impl CaptureCallbackHandler {
    /// Creates a handler publishing into `store` with the geometry and
    /// formats fixed by `config`.
    pub fn new(store: Arc<DualChannelStore>, config: &DeviceConfig) -> Self {
        Self {
            store,
            color_dims: config.color,
            depth_dims: config.depth,
            color_format: config.color_format,
            depth_format: config.depth_format,
            depth: DepthConverter::new(config.depth_model),
            counters: Counters::default(),
        }
    }

    /// Returns the store this handler publishes into.
    pub fn store(&self) -> &Arc<DualChannelStore> {
        &self.store
    }

    /// Returns the capture-side counters.
    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            color_frames: self.counters.color_frames.load(Ordering::Relaxed),
            depth_frames: self.counters.depth_frames.load(Ordering::Relaxed),
            color_rejected: self.counters.color_rejected.load(Ordering::Relaxed),
            depth_rejected: self.counters.depth_rejected.load(Ordering::Relaxed),
        }
    }
}

impl FrameSink for CaptureCallbackHandler {
    fn on_color_payload(&self, raw: &[u8], timestamp: u32) {
        let expected = self.color_format.expected_len(self.color_dims);
        if raw.len() != expected {
            self.counters.color_rejected.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                channel = "color",
                got = raw.len(),
                expected,
                "Rejected payload with unexpected size"
            );
            return;
        }

        let image = match self.color_format.convert(raw, self.color_dims) {
            Ok(image) => image,
            Err(e) => {
                self.counters.color_rejected.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(channel = "color", error = %e, "Rejected undecodable payload");
                return;
            }
        };

        let frame = ColorFrame {
            image,
            timestamp,
            sequence: self.counters.color_frames.fetch_add(1, Ordering::Relaxed) + 1,
        };
        let sequence = frame.sequence;

        if self.store.write_color(frame) {
            tracing::trace!(channel = "color", sequence, "Overwrote unread frame");
        }
    }

    fn on_depth_payload(&self, raw: &[u8], timestamp: u32) {
        let expected = self.depth_format.expected_len(self.depth_dims);
        if raw.len() != expected {
            self.counters.depth_rejected.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                channel = "depth",
                got = raw.len(),
                expected,
                "Rejected payload with unexpected size"
            );
            return;
        }

        let samples = self.depth_format.decode(raw, self.depth_dims.pixel_count());
        let (distance, validity) = self.depth.convert_frame(&samples, self.depth_dims);
        let frame = DepthFrame {
            distance,
            validity,
            timestamp,
            sequence: self.counters.depth_frames.fetch_add(1, Ordering::Relaxed) + 1,
        };
        let sequence = frame.sequence;

        if self.store.write_depth(frame) {
            tracing::trace!(channel = "depth", sequence, "Overwrote unread frame");
        }
    }
}
