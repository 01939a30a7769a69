//! Image loading and saving for `apply`.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tonegraph_core::{ImageTensor, ShapeError};

/// Load an image and convert it to a `height × width` tensor in `[0, 1]`.
///
/// Supports common formats via the `image` crate. Images of another size are
/// resized with a triangle filter; alpha is dropped.
pub fn load_image(path: &Path, height: usize, width: usize) -> Result<ImageTensor, ImageLoadError> {
    let (w, h) = (dim(width)?, dim(height)?);
    let rgb = image::open(path).map_err(ImageLoadError::Decode)?.to_rgb32f();
    let rgb = if rgb.dimensions() == (w, h) {
        rgb
    } else {
        tracing::debug!(
            from = ?rgb.dimensions(),
            to = ?(w, h),
            "resizing input image"
        );
        imageops::resize(&rgb, w, h, FilterType::Triangle)
    };

    let mut data = rgb.into_raw();
    for c in &mut data {
        *c = c.clamp(0.0, 1.0);
    }
    ImageTensor::from_flat(height, width, &data).map_err(ImageLoadError::Shape)
}

/// Save a tensor as an 8-bit RGB image. The format follows the extension.
pub fn save_image(tensor: &ImageTensor, path: &Path) -> Result<(), ImageLoadError> {
    let (w, h) = (dim(tensor.width)?, dim(tensor.height)?);
    let raw: Vec<u8> = tensor
        .as_flat()
        .iter()
        .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let len = raw.len();
    let buf = RgbImage::from_raw(w, h, raw).ok_or(ImageLoadError::Shape(
        ShapeError::BufferLength {
            len,
            expected: tensor.height * tensor.width * 3,
        },
    ))?;
    buf.save(path).map_err(ImageLoadError::Encode)
}

fn dim(v: usize) -> Result<u32, ImageLoadError> {
    u32::try_from(v).map_err(|_| ImageLoadError::Dimension(v))
}

/// Errors that can occur during image loading or saving.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("image dimension {0} does not fit in u32")]
    Dimension(usize),
    #[error("pixel buffer does not match image shape: {0}")]
    Shape(ShapeError),
}
