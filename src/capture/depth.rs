//! Raw 11-bit depth decoding and disparity-to-distance conversion.

use crate::config::{DepthModel, Dimensions};
use crate::frame::{DistanceMap, ValidityMap};
use serde::{Deserialize, Serialize};

/// Raw sample value meaning "no return".
pub const DEPTH_RAW_NO_VALUE: u16 = 2047;

/// Mask selecting the 11 significant bits of a raw sample.
const RAW_MASK: u16 = 0x07FF;

/// Number of distinct raw sample values.
const RAW_RANGE: usize = 2048;

/// Validity value for a measured pixel.
pub const VALID: u8 = 255;

/// Validity value for a pixel without a return.
pub const INVALID: u8 = 0;

/// Layout of depth payloads delivered by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthFormat {
    /// One little-endian `u16` per sample, upper 5 bits ignored.
    #[default]
    #[serde(rename = "unpacked_11bit")]
    Unpacked11Bit,
    /// MSB-first bitstream, 11 bits per sample (8 samples per 11 bytes).
    #[serde(rename = "packed_11bit")]
    Packed11Bit,
}

impl DepthFormat {
    /// Payload size in bytes for a frame of `dims`.
    pub fn expected_len(&self, dims: Dimensions) -> usize {
        let samples = dims.pixel_count();
        match self {
            Self::Unpacked11Bit => samples * 2,
            Self::Packed11Bit => (samples * 11).div_ceil(8),
        }
    }

    /// Decodes `count` raw samples from `data`.
    pub fn decode(&self, data: &[u8], count: usize) -> Vec<u16> {
        match self {
            Self::Unpacked11Bit => data
                .chunks_exact(2)
                .take(count)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]) & RAW_MASK)
                .collect(),
            Self::Packed11Bit => unpack_11bit(data, count),
        }
    }

    /// Encodes raw samples into this layout.
    pub fn encode(&self, samples: &[u16]) -> Vec<u8> {
        match self {
            Self::Unpacked11Bit => samples
                .iter()
                .flat_map(|&s| (s & RAW_MASK).to_le_bytes())
                .collect(),
            Self::Packed11Bit => pack_11bit(samples),
        }
    }
}

/// Unpacks an MSB-first 11-bit bitstream.
///
/// Stops after `count` samples or when the input runs out.
pub fn unpack_11bit(data: &[u8], count: usize) -> Vec<u16> {
    let mut output = Vec::with_capacity(count);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        if bits >= 11 {
            bits -= 11;
            output.push(((acc >> bits) as u16) & RAW_MASK);
            acc &= (1 << bits) - 1;
            if output.len() == count {
                break;
            }
        }
    }

    output
}

/// Packs samples into an MSB-first 11-bit bitstream, zero-padding the tail.
pub fn pack_11bit(samples: &[u16]) -> Vec<u8> {
    let mut output = Vec::with_capacity((samples.len() * 11).div_ceil(8));
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &sample in samples {
        acc = (acc << 11) | u32::from(sample & RAW_MASK);
        bits += 11;
        while bits >= 8 {
            bits -= 8;
            output.push((acc >> bits) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        output.push((acc << (8 - bits)) as u8);
    }

    output
}

/// Converts raw disparity samples to metric distance plus validity.
///
/// All 2048 raw values are evaluated once up front, so per-frame work is a
/// table lookup per pixel.
#[derive(Clone)]
pub struct DepthConverter {
    model: DepthModel,
    /// Distance per raw value; 0.0 marks "no return".
    table: Vec<f32>,
}

impl DepthConverter {
    /// Builds the lookup table for `model`.
    pub fn new(model: DepthModel) -> Self {
        let table = (0..RAW_RANGE as u16)
            .map(|raw| {
                if raw == DEPTH_RAW_NO_VALUE {
                    return 0.0;
                }
                let d = model.distance(raw) as f32;
                // Past the model's usable range the formula folds over; report no return.
                if d.is_finite() && d > 0.0 {
                    d
                } else {
                    0.0
                }
            })
            .collect();

        Self { model, table }
    }

    /// Returns the model this converter was built from.
    pub fn model(&self) -> DepthModel {
        self.model
    }

    /// Converts one raw sample to `(distance, validity)`.
    #[inline]
    pub fn convert(&self, raw: u16) -> (f32, u8) {
        let distance = self.table[usize::from(raw & RAW_MASK)];
        if distance > 0.0 {
            (distance, VALID)
        } else {
            (0.0, INVALID)
        }
    }

    /// Converts a full frame of raw samples.
    ///
    /// `samples` must hold exactly `dims.pixel_count()` values.
    pub fn convert_frame(&self, samples: &[u16], dims: Dimensions) -> (DistanceMap, ValidityMap) {
        let mut distance = DistanceMap::new(dims.width, dims.height);
        let mut validity = ValidityMap::new(dims.width, dims.height);

        for ((&raw, d), v) in samples
            .iter()
            .zip(distance.pixels_mut())
            .zip(validity.pixels_mut())
        {
            (*d, *v) = self.convert(raw);
        }

        (distance, validity)
    }
}

impl Default for DepthConverter {
    fn default() -> Self {
        Self::new(DepthModel::default())
    }
}

impl std::fmt::Debug for DepthConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthConverter")
            .field("model", &self.model)
            .field(
                "valid_raw_values",
                &self.table.iter().filter(|&&d| d > 0.0).count(),
            )
            .finish()
    }
}
