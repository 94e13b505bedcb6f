//! Packed color payload decoding into 4-channel pixels.

use crate::config::Dimensions;
use crate::frame::{ColorImage, FrameError, Image, Rgba};
use serde::{Deserialize, Serialize};

/// Layout of color payloads delivered by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorFormat {
    /// 3 bytes per pixel, R G B.
    #[default]
    Rgb24,
    /// Raw Bayer mosaic, 1 byte per pixel, `G R / B G` tiles.
    BayerGrbg,
    /// YUV 4:2:2, `U Y0 V Y1` per pixel pair.
    Uyvy,
}

impl ColorFormat {
    /// Payload size in bytes for a frame of `dims`.
    pub fn expected_len(&self, dims: Dimensions) -> usize {
        let pixels = dims.pixel_count();
        match self {
            Self::Rgb24 => pixels * 3,
            Self::BayerGrbg => pixels,
            Self::Uyvy => pixels * 2,
        }
    }

    /// Returns false for geometries this layout cannot describe.
    pub fn supports(&self, dims: Dimensions) -> bool {
        match self {
            Self::Rgb24 => true,
            Self::BayerGrbg => dims.width % 2 == 0 && dims.height % 2 == 0,
            Self::Uyvy => dims.width % 2 == 0,
        }
    }

    /// Converts a payload of exactly `expected_len(dims)` bytes.
    ///
    /// Fails for geometries the layout cannot describe and for payloads of
    /// the wrong size; every pixel of a returned image is opaque.
    pub fn convert(&self, data: &[u8], dims: Dimensions) -> Result<ColorImage, FrameError> {
        if !self.supports(dims) {
            return Err(FrameError::UnsupportedGeometry {
                width: dims.width,
                height: dims.height,
            });
        }
        let expected = self.expected_len(dims);
        if data.len() != expected {
            return Err(FrameError::PayloadLength {
                expected,
                actual: data.len(),
            });
        }

        let pixels = match self {
            Self::Rgb24 => rgb24_to_rgba(data),
            Self::BayerGrbg => grbg_to_rgba(data, dims),
            Self::Uyvy => uyvy_to_rgba(data),
        };
        Image::from_vec(dims.width, dims.height, pixels)
    }
}

/// Adds an opaque alpha channel to packed RGB.
fn rgb24_to_rgba(data: &[u8]) -> Vec<Rgba> {
    data.chunks_exact(3)
        .map(|px| Rgba::opaque(px[0], px[1], px[2]))
        .collect()
}

/// Nearest-neighbour demosaic: every 2x2 tile becomes four equal pixels.
fn grbg_to_rgba(data: &[u8], dims: Dimensions) -> Vec<Rgba> {
    let w = dims.width as usize;
    let h = dims.height as usize;
    let mut rgba = vec![Rgba::default(); w * h];

    for y in (0..h.saturating_sub(1)).step_by(2) {
        for x in (0..w.saturating_sub(1)).step_by(2) {
            let g0 = u16::from(data[y * w + x]);
            let r = data[y * w + x + 1];
            let b = data[(y + 1) * w + x];
            let g1 = u16::from(data[(y + 1) * w + x + 1]);
            let pixel = Rgba::opaque(r, ((g0 + g1) / 2) as u8, b);

            for dy in 0..2 {
                rgba[(y + dy) * w + x] = pixel;
                rgba[(y + dy) * w + x + 1] = pixel;
            }
        }
    }

    rgba
}

/// BT.601 YUV 4:2:2 to RGB.
fn uyvy_to_rgba(data: &[u8]) -> Vec<Rgba> {
    let mut rgba = Vec::with_capacity(data.len() / 2);

    for chunk in data.chunks_exact(4) {
        let u = f32::from(chunk[0]) - 128.0;
        let v = f32::from(chunk[2]) - 128.0;

        for y in [f32::from(chunk[1]), f32::from(chunk[3])] {
            rgba.push(Rgba::opaque(
                (y + 1.402 * v).clamp(0.0, 255.0) as u8,
                (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8,
                (y + 1.772 * u).clamp(0.0, 255.0) as u8,
            ));
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb24_adds_alpha() {
        let image = ColorFormat::Rgb24
            .convert(&[255, 128, 64, 0, 0, 0], Dimensions::new(2, 1))
            .unwrap();
        assert_eq!(
            image.pixels(),
            &[Rgba::opaque(255, 128, 64), Rgba::opaque(0, 0, 0)]
        );
    }

    #[test]
    fn test_bayer_tile_fills_block() {
        // G R / B G
        let image = ColorFormat::BayerGrbg
            .convert(&[100, 200, 50, 110], Dimensions::new(2, 2))
            .unwrap();
        let expected = Rgba::opaque(200, 105, 50);
        assert!(image.pixels().iter().all(|&p| p == expected));
    }

    #[test]
    fn test_uyvy_white() {
        let image = ColorFormat::Uyvy
            .convert(&[128, 255, 128, 255], Dimensions::new(2, 1))
            .unwrap();
        for p in image.pixels() {
            assert!(p.r > 250 && p.g > 250 && p.b > 250);
            assert_eq!(p.a, 255);
        }
    }

    #[test]
    fn test_unsupported_geometry_rejected() {
        assert_eq!(
            ColorFormat::Uyvy.convert(&[128; 6], Dimensions::new(3, 1)),
            Err(FrameError::UnsupportedGeometry {
                width: 3,
                height: 1
            })
        );
        assert!(ColorFormat::BayerGrbg
            .convert(&[0; 9], Dimensions::new(3, 3))
            .is_err());
    }

    #[test]
    fn test_wrong_payload_length_rejected() {
        assert_eq!(
            ColorFormat::Rgb24.convert(&[0; 5], Dimensions::new(2, 1)),
            Err(FrameError::PayloadLength {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn test_expected_len() {
        let dims = Dimensions::new(640, 480);
        assert_eq!(ColorFormat::Rgb24.expected_len(dims), 921_600);
        assert_eq!(ColorFormat::BayerGrbg.expected_len(dims), 307_200);
        assert_eq!(ColorFormat::Uyvy.expected_len(dims), 614_400);
    }
}
