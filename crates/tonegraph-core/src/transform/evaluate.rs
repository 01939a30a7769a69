//! Reference evaluation of a variant on pixels and whole images.
//!
//! Every artifact graph must reproduce these results within quantization
//! tolerance.

use glam::Vec3;

use crate::image::ImageTensor;
use crate::transform::variant::StyleVariant;

/// Apply a variant to a single RGB pixel.
///
/// ```text
///   Input ──→ linear kernel ──→ clamp [0, 1] ──→ Output
/// ```
///
/// Total for finite input; purely per-pixel.
pub fn evaluate_pixel(rgb: [f32; 3], variant: StyleVariant) -> [f32; 3] {
    let out = variant.kernel().apply(Vec3::from_array(rgb));
    clamp_unit(out).to_array()
}

/// Apply a variant to every pixel of an image. Output shape equals input shape.
pub fn apply_transform(image: &ImageTensor, variant: StyleVariant) -> ImageTensor {
    tracing::debug!(
        variant = %variant,
        height = image.height,
        width = image.width,
        "applying reference transform"
    );
    let kernel = variant.kernel();
    image.map_pixels(|px| clamp_unit(kernel.apply(Vec3::from_array(px))).to_array())
}

fn clamp_unit(v: Vec3) -> Vec3 {
    v.clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    fn assert_close3(actual: [f32; 3], expected: [f32; 3], tol: f32) {
        for i in 0..3 {
            let diff = (actual[i] - expected[i]).abs();
            assert!(
                diff <= tol,
                "channel {i} mismatch: got {}, expected {}, diff {diff} > {tol}",
                actual[i],
                expected[i],
            );
        }
    }

    fn in_unit_range(rgb: [f32; 3]) -> bool {
        rgb.iter().all(|c| (0.0..=1.0).contains(c))
    }

    #[test]
    fn test_sepia_pure_red() {
        let out = evaluate_pixel([1.0, 0.0, 0.0], StyleVariant::SepiaMatrix);
        assert_close3(out, [0.393, 0.349, 0.272], TOLERANCE);
    }

    #[test]
    fn test_sepia_white_is_clamped() {
        // Row sums are 1.351, 1.203, 0.937: the first two saturate.
        let out = evaluate_pixel([1.0, 1.0, 1.0], StyleVariant::SepiaMatrix);
        assert_close3(out, [1.0, 1.0, 0.937], TOLERANCE);
    }

    #[test]
    fn test_gain_mid_gray() {
        let out = evaluate_pixel([0.5, 0.5, 0.5], StyleVariant::ChannelGain);
        assert_close3(out, [0.45, 0.5, 0.55], TOLERANCE);
    }

    #[test]
    fn test_gain_white_blue_is_clamped() {
        let out = evaluate_pixel([1.0, 1.0, 1.0], StyleVariant::ChannelGain);
        assert_close3(out, [0.9, 1.0, 1.0], TOLERANCE);
    }

    #[test]
    fn test_black_maps_to_black() {
        for v in StyleVariant::all() {
            assert_eq!(evaluate_pixel([0.0; 3], *v), [0.0; 3]);
        }
    }

    #[test]
    fn test_outputs_stay_in_unit_range() {
        let steps = [0.0_f32, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for v in StyleVariant::all() {
            for &r in &steps {
                for &g in &steps {
                    for &b in &steps {
                        let out = evaluate_pixel([r, g, b], *v);
                        assert!(in_unit_range(out), "{v} on ({r}, {g}, {b}) gave {out:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_apply_transform_matches_per_pixel() {
        let image = ImageTensor::from_fn(3, 4, |y, x| [x as f32 / 3.0, y as f32 / 2.0, 0.5]);
        for v in StyleVariant::all() {
            let out = apply_transform(&image, *v);
            assert_eq!(out.height, image.height);
            assert_eq!(out.width, image.width);
            for (src, dst) in image.pixels.iter().zip(&out.pixels) {
                assert_eq!(*dst, evaluate_pixel(*src, *v));
            }
        }
    }
}
