//! Per-channel frame deliveries.

use super::image::{ColorImage, DistanceMap, ValidityMap};

/// One color delivery from the capture thread.
#[derive(Debug)]
pub struct ColorFrame {
    /// Converted 4-channel pixels.
    pub image: ColorImage,
    /// Driver timestamp ticks passed to the callback.
    pub timestamp: u32,
    /// Per-channel capture counter, starting at 1.
    pub sequence: u64,
}

impl Clone for ColorFrame {
    fn clone(&self) -> Self {
        Self {
            image: self.image.clone(),
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.image.clone_from(&source.image);
        self.timestamp = source.timestamp;
        self.sequence = source.sequence;
    }
}

impl ColorFrame {
    /// Creates an empty (all-zero) frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            image: ColorImage::new(width, height),
            timestamp: 0,
            sequence: 0,
        }
    }
}

/// One depth delivery: the distance map and its validity map travel together.
#[derive(Debug)]
pub struct DepthFrame {
    /// Metric distance per pixel.
    pub distance: DistanceMap,
    /// 255 where `distance` holds a measurement, 0 where it is the sentinel.
    pub validity: ValidityMap,
    /// Driver timestamp ticks passed to the callback.
    pub timestamp: u32,
    /// Per-channel capture counter, starting at 1.
    pub sequence: u64,
}

impl Clone for DepthFrame {
    fn clone(&self) -> Self {
        Self {
            distance: self.distance.clone(),
            validity: self.validity.clone(),
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.distance.clone_from(&source.distance);
        self.validity.clone_from(&source.validity);
        self.timestamp = source.timestamp;
        self.sequence = source.sequence;
    }
}

impl DepthFrame {
    /// Creates an empty (all-sentinel) frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            distance: DistanceMap::new(width, height),
            validity: ValidityMap::new(width, height),
            timestamp: 0,
            sequence: 0,
        }
    }

    /// Number of pixels carrying a measurement.
    pub fn valid_count(&self) -> usize {
        self.validity.pixels().iter().filter(|&&v| v != 0).count()
    }
}
