//! Plain 2D pixel containers.

use thiserror::Error;

/// Errors raised when building an image from existing storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The supplied buffer does not hold `width * height` pixels.
    #[error("buffer holds {actual} pixels, expected {expected} for {width}x{height}")]
    DimensionMismatch {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// A packed payload has the wrong number of bytes for its geometry.
    #[error("payload holds {actual} bytes, expected {expected}")]
    PayloadLength {
        /// Bytes required by the geometry and layout.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// The pixel layout cannot describe an image of this size.
    #[error("layout cannot encode a {width}x{height} image")]
    UnsupportedGeometry {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// A 4-channel, 8-bit color pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba {
    /// Creates an opaque pixel.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A rectangular, row-major pixel buffer.
#[derive(PartialEq)]
pub struct Image<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Clone> Clone for Image<T> {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }

    /// Copies into the existing storage; no allocation when sizes match.
    fn clone_from(&mut self, source: &Self) {
        self.width = source.width;
        self.height = source.height;
        self.data.clone_from(&source.data);
    }
}

/// Color image as delivered by `get_rgb`.
pub type ColorImage = Image<Rgba>;
/// Metric distance per pixel, 0.0 where the sensor had no return.
pub type DistanceMap = Image<f32>;
/// Per-pixel validity: 255 for a measured distance, 0 otherwise.
pub type ValidityMap = Image<u8>;

impl<T: Clone + Default> Image<T> {
    /// Creates an image filled with `T::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); (width as usize) * (height as usize)],
        }
    }
}

impl<T> Image<T> {
    /// Wraps existing row-major storage.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(FrameError::DimensionMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    /// Returns the pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.data
    }

    /// Returns the pixels in row-major order, mutably.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns the pixel at `row`, `col`, or `None` when out of bounds.
    pub fn get(&self, row: u32, col: u32) -> Option<&T> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get((row as usize) * (self.width as usize) + col as usize)
    }

    /// Consumes the image, returning its storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> std::fmt::Debug for Image<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_default_filled() {
        let image: DistanceMap = Image::new(4, 3);
        assert_eq!(image.pixel_count(), 12);
        assert!(image.pixels().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let result = Image::from_vec(2, 2, vec![0u8; 3]);
        assert_eq!(
            result.unwrap_err(),
            FrameError::DimensionMismatch {
                width: 2,
                height: 2,
                expected: 4,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_get_is_row_major() {
        let image = Image::from_vec(3, 2, vec![0u8, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(image.get(1, 0), Some(&3));
        assert_eq!(image.get(0, 2), Some(&2));
        assert_eq!(image.get(2, 0), None);
        assert_eq!(image.get(0, 3), None);
    }

    #[test]
    fn test_clone_from_reuses_storage() {
        let source = Image::from_vec(2, 2, vec![1u8, 2, 3, 4]).unwrap();
        let mut target: ValidityMap = Image::new(2, 2);
        let before = target.pixels().as_ptr();

        target.clone_from(&source);

        assert_eq!(target.pixels().as_ptr(), before);
        assert_eq!(target.pixels(), source.pixels());
    }
}
