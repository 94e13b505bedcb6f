//! Color and depth buffers side by side.

use super::buffer::{BufferStats, FrameBuffer};
use super::types::{ColorFrame, DepthFrame};

/// Traffic counters for both channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Color channel counters.
    pub color: BufferStats,
    /// Depth channel counters.
    pub depth: BufferStats,
}

/// Two independently locked frame buffers.
///
/// Nothing couples the channels: a color write never waits on a depth read,
/// and a consumer may see depth and color frames from different capture
/// instants.
pub struct DualChannelStore {
    color: FrameBuffer<ColorFrame>,
    depth: FrameBuffer<DepthFrame>,
}

impl DualChannelStore {
    /// Creates a store whose buffers start blank (and not fresh).
    pub fn new(color_width: u32, color_height: u32, depth_width: u32, depth_height: u32) -> Self {
        Self {
            color: FrameBuffer::new(ColorFrame::blank(color_width, color_height)),
            depth: FrameBuffer::new(DepthFrame::blank(depth_width, depth_height)),
        }
    }

    /// Publishes a color frame. Returns `true` if an unread one was dropped.
    pub fn write_color(&self, frame: ColorFrame) -> bool {
        self.color.write(frame)
    }

    /// Publishes a depth frame. Returns `true` if an unread one was dropped.
    pub fn write_depth(&self, frame: DepthFrame) -> bool {
        self.depth.write(frame)
    }

    /// Copies a fresh color frame into `out`.
    pub fn read_color(&self, out: &mut ColorFrame) -> bool {
        self.color.try_read(out)
    }

    /// Copies a fresh depth frame into `out`.
    pub fn read_depth(&self, out: &mut DepthFrame) -> bool {
        self.depth.try_read(out)
    }

    /// Hands a fresh depth frame to `read` while the depth lock is held.
    pub fn read_depth_with(&self, read: impl FnOnce(&DepthFrame)) -> bool {
        self.depth.try_read_with(read)
    }

    /// Hands a fresh color frame to `read` while the color lock is held.
    pub fn read_color_with(&self, read: impl FnOnce(&ColorFrame)) -> bool {
        self.color.try_read_with(read)
    }

    /// Owned copy of a fresh color frame.
    pub fn latest_color(&self) -> Option<ColorFrame> {
        self.color.take_latest()
    }

    /// Owned copy of a fresh depth frame.
    pub fn latest_depth(&self) -> Option<DepthFrame> {
        self.depth.take_latest()
    }

    /// Returns counters for both channels.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            color: self.color.stats(),
            depth: self.depth.stats(),
        }
    }
}

impl std::fmt::Debug for DualChannelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualChannelStore")
            .field("color", &self.color)
            .field("depth", &self.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_independent() {
        let store = DualChannelStore::new(2, 2, 2, 2);

        let mut depth = DepthFrame::blank(2, 2);
        depth.sequence = 1;
        store.write_depth(depth);

        let mut color_out = ColorFrame::blank(2, 2);
        let mut depth_out = DepthFrame::blank(2, 2);
        assert!(!store.read_color(&mut color_out));
        assert!(store.read_depth(&mut depth_out));
        assert_eq!(depth_out.sequence, 1);

        let stats = store.stats();
        assert_eq!(stats.color.writes, 0);
        assert_eq!(stats.depth.reads, 1);
    }

    #[test]
    fn test_depth_pair_read_together() {
        let store = DualChannelStore::new(1, 1, 2, 1);
        let mut frame = DepthFrame::blank(2, 1);
        frame.distance.pixels_mut().copy_from_slice(&[0.0, 1.5]);
        frame.validity.pixels_mut().copy_from_slice(&[0, 255]);
        store.write_depth(frame);

        let mut seen = None;
        assert!(store.read_depth_with(|f| {
            seen = Some((f.distance.pixels().to_vec(), f.validity.pixels().to_vec()))
        }));
        assert_eq!(seen, Some((vec![0.0, 1.5], vec![0, 255])));
        assert!(store.latest_depth().is_none());
    }
}
