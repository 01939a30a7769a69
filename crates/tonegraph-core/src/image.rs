//! Image tensor representation fed to transforms and graphs.

use crate::tensor::{IMAGE_CHANNELS, ShapeError, TensorSpec};

/// A `[1, height, width, 3]` float32 image tensor. Values are normalized RGB,
/// nominally in `[0, 1]`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
    /// Pixel data, `height * width` entries.
    pub pixels: Vec<[f32; 3]>,
}

impl ImageTensor {
    /// An image with every pixel set to `rgb`.
    pub fn filled(height: usize, width: usize, rgb: [f32; 3]) -> Self {
        Self {
            height,
            width,
            pixels: vec![rgb; height * width],
        }
    }

    /// Build an image by evaluating `f(y, x)` for every pixel.
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> [f32; 3]) -> Self {
        let mut pixels = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(y, x));
            }
        }
        Self {
            height,
            width,
            pixels,
        }
    }

    /// Wrap a flat NHWC float buffer.
    pub fn from_flat(height: usize, width: usize, data: &[f32]) -> Result<Self, ShapeError> {
        let expected = height * width * IMAGE_CHANNELS;
        if data.len() != expected {
            return Err(ShapeError::BufferLength {
                len: data.len(),
                expected,
            });
        }
        let pixels: &[[f32; 3]] = bytemuck::cast_slice(data);
        Ok(Self {
            height,
            width,
            pixels: pixels.to_vec(),
        })
    }

    /// Flat NHWC view of the pixel data.
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Tensor spec describing this image under `name`.
    pub fn spec(&self, name: impl Into<String>) -> TensorSpec {
        TensorSpec::image(name, self.height, self.width)
    }

    /// Pixel at row `y`, column `x`.
    pub fn pixel(&self, y: usize, x: usize) -> Option<[f32; 3]> {
        if y >= self.height || x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Apply `f` to every pixel, producing an image of the same shape.
    pub fn map_pixels(&self, f: impl Fn([f32; 3]) -> [f32; 3]) -> Self {
        Self {
            height: self.height,
            width: self.width,
            pixels: self.pixels.iter().map(|&px| f(px)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_view_is_nhwc() {
        let img = ImageTensor::from_fn(1, 2, |_, x| [x as f32, 0.5, 1.0]);
        assert_eq!(img.as_flat(), &[0.0, 0.5, 1.0, 1.0, 0.5, 1.0]);
    }

    #[test]
    fn test_from_flat_rejects_wrong_length() {
        let err = ImageTensor::from_flat(2, 2, &[0.0; 11]).unwrap_err();
        assert_eq!(err, ShapeError::BufferLength { len: 11, expected: 12 });
    }

    #[test]
    fn test_from_flat_matches_as_flat() {
        let data: Vec<f32> = (0..12).map(|i| i as f32 / 12.0).collect();
        let img = ImageTensor::from_flat(2, 2, &data).unwrap();
        assert_eq!(img.pixel(1, 0), Some([6.0 / 12.0, 7.0 / 12.0, 8.0 / 12.0]));
        assert_eq!(img.as_flat(), data.as_slice());
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let img = ImageTensor::filled(2, 3, [0.1, 0.2, 0.3]);
        assert_eq!(img.pixel(1, 2), Some([0.1, 0.2, 0.3]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.pixel(0, 3), None);
    }

    #[test]
    fn test_spec_reflects_dimensions() {
        let img = ImageTensor::filled(4, 5, [0.0; 3]);
        assert_eq!(img.spec("x").shape, vec![1, 4, 5, 3]);
    }
}
