//! The fixed color transforms that stand in for a trained style network.
//!
//! Each variant is a closed-form, per-pixel mapping with hard-coded
//! coefficients. A variant is embedded into exactly one artifact at build time.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::contract;
use crate::tensor::TensorSpec;

/// Sepia tone matrix, row-major: `out[i] = Σ SEPIA_MATRIX[i][j] * in[j]`.
pub const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Per-channel gains: red reduced, green unchanged, blue enhanced.
pub const CHANNEL_GAIN: [f32; 3] = [0.9, 1.0, 1.1];

/// Which fixed transform an artifact embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleVariant {
    /// 3x3 sepia tone matrix followed by a `[0, 1]` clamp.
    SepiaMatrix,
    /// Per-channel linear gain followed by a `[0, 1]` clamp.
    ChannelGain,
}

impl StyleVariant {
    /// Short identifier used on the command line.
    pub const fn id(&self) -> &'static str {
        match self {
            Self::SepiaMatrix => "sepia",
            Self::ChannelGain => "gain",
        }
    }

    /// Human-readable description of the visual effect.
    pub const fn effect(&self) -> &'static str {
        match self {
            Self::SepiaMatrix => "Warm vintage/sepia style",
            Self::ChannelGain => "Cool tone (red reduced, blue enhanced)",
        }
    }

    /// File name the application expects for this variant's artifact.
    pub const fn default_file_name(&self) -> &'static str {
        match self {
            Self::SepiaMatrix => "style_transfer_quant.tflite",
            Self::ChannelGain => "simple_style.tflite",
        }
    }

    pub fn all() -> &'static [Self] {
        const ALL: [StyleVariant; 2] = [StyleVariant::SepiaMatrix, StyleVariant::ChannelGain];
        &ALL
    }

    /// Declared input of an artifact embedding this variant.
    pub fn input_spec(&self) -> TensorSpec {
        contract::content_input()
    }

    /// Declared output of an artifact embedding this variant.
    pub fn output_spec(&self) -> TensorSpec {
        contract::styled_output()
    }

    /// The linear part of the transform, applied before clamping.
    pub fn kernel(&self) -> ColorKernel {
        match self {
            Self::SepiaMatrix => {
                ColorKernel::Mix(Mat3::from_cols_array_2d(&SEPIA_MATRIX).transpose())
            }
            Self::ChannelGain => ColorKernel::Gain(Vec3::from_array(CHANNEL_GAIN)),
        }
    }
}

impl fmt::Display for StyleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StyleVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sepia" | "sepia_matrix" | "sepia-matrix" => Ok(Self::SepiaMatrix),
            "gain" | "channel_gain" | "channel-gain" => Ok(Self::ChannelGain),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Returned when parsing an unrecognized variant name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style variant `{0}` (expected `sepia` or `gain`)")]
pub struct UnknownVariant(pub String);

/// Linear coefficients of a variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorKernel {
    /// Full 3x3 channel mix.
    Mix(Mat3),
    /// Independent per-channel gain.
    Gain(Vec3),
}

impl ColorKernel {
    /// Apply the linear part to one pixel. No clamping.
    pub fn apply(&self, rgb: Vec3) -> Vec3 {
        match self {
            Self::Mix(m) => *m * rgb,
            Self::Gain(g) => *g * rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_ids_round_trip() {
        for v in StyleVariant::all() {
            assert_eq!(v.id().parse::<StyleVariant>(), Ok(*v));
        }
        assert!("arbitrary".parse::<StyleVariant>().is_err());
    }

    #[test]
    fn test_sepia_kernel_red_column() {
        let out = StyleVariant::SepiaMatrix
            .kernel()
            .apply(Vec3::new(1.0, 0.0, 0.0));
        let column = SEPIA_MATRIX.map(|row| row[0]);
        assert_eq!(out.to_array(), column);
    }

    #[test]
    fn test_sepia_kernel_multiplies_rows() {
        let out = StyleVariant::SepiaMatrix
            .kernel()
            .apply(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(out.to_array(), [0.769, 0.686, 0.534]);
    }

    #[test]
    fn test_variants_declare_content_contract() {
        for v in StyleVariant::all() {
            assert_eq!(v.input_spec().shape, vec![1, 384, 384, 3]);
            assert!(v.input_spec().same_layout(&v.output_spec()));
        }
    }
}
