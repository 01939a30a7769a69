//! Tensor shape and element-type descriptions.
//!
//! Every image tensor in this workspace is NHWC with a batch of one and three
//! color channels: `[1, height, width, 3]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rank of every image tensor (batch, height, width, channel).
pub const IMAGE_RANK: usize = 4;
/// Channel count of every image tensor.
pub const IMAGE_CHANNELS: usize = 3;

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE float.
    Float32,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
        }
    }
}

/// Shape and dtype contract for one named input or output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSpec {
    /// Tensor name as declared by the graph.
    pub name: String,
    /// Dimensions, outermost first.
    pub shape: Vec<usize>,
    /// Element type.
    pub dtype: DType,
}

impl TensorSpec {
    /// Spec for a `[1, height, width, 3]` float32 image tensor.
    pub fn image(name: impl Into<String>, height: usize, width: usize) -> Self {
        Self {
            name: name.into(),
            shape: vec![1, height, width, IMAGE_CHANNELS],
            dtype: DType::Float32,
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Height of an image tensor, `None` for other ranks.
    pub fn height(&self) -> Option<usize> {
        (self.rank() == IMAGE_RANK).then(|| self.shape[1])
    }

    /// Width of an image tensor, `None` for other ranks.
    pub fn width(&self) -> Option<usize> {
        (self.rank() == IMAGE_RANK).then(|| self.shape[2])
    }

    /// Whether shape and dtype match, ignoring the name.
    pub fn same_layout(&self, other: &TensorSpec) -> bool {
        self.shape == other.shape && self.dtype == other.dtype
    }

    /// Check the image-tensor invariants: rank 4, batch 1, channel 3, and
    /// every dimension positive.
    pub fn check_image(&self) -> Result<(), ShapeError> {
        if self.rank() != IMAGE_RANK {
            return Err(ShapeError::Rank {
                name: self.name.clone(),
                rank: self.rank(),
            });
        }
        if let Some(axis) = self.shape.iter().position(|&d| d == 0) {
            return Err(ShapeError::NonPositive {
                name: self.name.clone(),
                axis,
            });
        }
        if self.shape[0] != 1 {
            return Err(ShapeError::Batch {
                name: self.name.clone(),
                batch: self.shape[0],
            });
        }
        if self.shape[3] != IMAGE_CHANNELS {
            return Err(ShapeError::Channels {
                name: self.name.clone(),
                channels: self.shape[3],
            });
        }
        Ok(())
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [", self.name)?;
        for (i, d) in self.shape.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "] {}", self.dtype)
    }
}

/// Violations of the image-tensor shape contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("tensor `{name}` has rank {rank}, expected 4")]
    Rank { name: String, rank: usize },
    #[error("tensor `{name}` has a non-positive dimension on axis {axis}")]
    NonPositive { name: String, axis: usize },
    #[error("tensor `{name}` has batch {batch}, expected 1")]
    Batch { name: String, batch: usize },
    #[error("tensor `{name}` has {channels} channels, expected 3")]
    Channels { name: String, channels: usize },
    #[error("pixel buffer holds {len} floats, expected {expected}")]
    BufferLength { len: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_spec_layout() {
        let spec = TensorSpec::image("content", 384, 384);
        assert_eq!(spec.shape, vec![1, 384, 384, 3]);
        assert_eq!(spec.dtype, DType::Float32);
        assert_eq!(spec.height(), Some(384));
        assert!(spec.check_image().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let spec = TensorSpec::image("content", 0, 384);
        assert_eq!(
            spec.check_image(),
            Err(ShapeError::NonPositive {
                name: "content".into(),
                axis: 1
            })
        );
    }

    #[test]
    fn test_wrong_batch_and_channels_rejected() {
        let mut spec = TensorSpec::image("x", 8, 8);
        spec.shape[0] = 2;
        assert!(matches!(spec.check_image(), Err(ShapeError::Batch { batch: 2, .. })));

        let mut spec = TensorSpec::image("x", 8, 8);
        spec.shape[3] = 4;
        assert!(matches!(
            spec.check_image(),
            Err(ShapeError::Channels { channels: 4, .. })
        ));
    }

    #[test]
    fn test_rank_checked_before_dimensions() {
        let spec = TensorSpec {
            name: "flat".into(),
            shape: vec![0, 3],
            dtype: DType::Float32,
        };
        assert!(matches!(spec.check_image(), Err(ShapeError::Rank { rank: 2, .. })));
        assert_eq!(spec.height(), None);
    }

    #[test]
    fn test_display_matches_report_format() {
        let spec = TensorSpec::image("style", 256, 256);
        assert_eq!(spec.to_string(), "style: [1, 256, 256, 3] float32");
    }

    #[test]
    fn test_dtype_serializes_lowercase() {
        let json = serde_json::to_string(&DType::Float32).unwrap();
        assert_eq!(json, "\"float32\"");
    }
}
