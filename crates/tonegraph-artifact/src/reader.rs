//! Loading and executing artifacts written by this crate.
//!
//! Unlike the validator, the reader parses the whole graph: it exposes the
//! declared input/output specs and can run the graph on an image.

use std::fs;
use std::path::{Path, PathBuf};

use glam::{Mat3, Vec3};
use tonegraph_core::{ImageTensor, TensorSpec};

use crate::error::{ArtifactError, DecodeError};
use crate::format::Header;
use crate::graph::{Graph, Op};

/// Dequantized, ready-to-run form of one operator.
#[derive(Debug, Clone, Copy)]
enum Kernel {
    Mix(Mat3),
    Scale(Vec3),
    Clamp { min: Vec3, max: Vec3 },
}

impl Kernel {
    fn compile(op: &Op) -> Result<Self, DecodeError> {
        Ok(match op {
            Op::ChannelMix(w) => {
                let rows: [f32; 9] = w.to_f32().try_into().map_err(|_| DecodeError::InvalidOp {
                    op: "ChannelMix",
                    reason: "wrong number of weights",
                })?;
                Self::Mix(Mat3::from_cols_array(&rows).transpose())
            }
            Op::ChannelScale(w) => {
                let gains: [f32; 3] = w.to_f32().try_into().map_err(|_| DecodeError::InvalidOp {
                    op: "ChannelScale",
                    reason: "wrong number of weights",
                })?;
                Self::Scale(Vec3::from_array(gains))
            }
            Op::Clamp { min, max } => Self::Clamp {
                min: Vec3::splat(*min),
                max: Vec3::splat(*max),
            },
        })
    }

    fn apply(&self, rgb: Vec3) -> Vec3 {
        match self {
            Self::Mix(m) => *m * rgb,
            Self::Scale(g) => *g * rgb,
            Self::Clamp { min, max } => rgb.clamp(*min, *max),
        }
    }
}

/// A parsed artifact.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    path: PathBuf,
    byte_len: u64,
    header: Header,
    graph: Graph,
    kernels: Vec<Kernel>,
}

impl LoadedModel {
    /// Read and parse the artifact at `path`.
    pub fn open(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|e| ArtifactError::on_read(path, e))?;
        Self::from_bytes(path, &bytes).map_err(|source| ArtifactError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse artifact bytes already in memory. `path` is kept for reporting.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, DecodeError> {
        let (header, graph) = Graph::from_artifact_bytes(bytes)?;
        let kernels = graph
            .ops
            .iter()
            .map(Kernel::compile)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            path = %path.display(),
            inputs = graph.inputs.len(),
            outputs = graph.outputs.len(),
            ops = kernels.len(),
            "artifact loaded"
        );
        Ok(Self {
            path: path.to_path_buf(),
            byte_len: bytes.len() as u64,
            header,
            graph,
            kernels,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    pub fn inputs(&self) -> &[TensorSpec] {
        &self.graph.inputs
    }

    pub fn outputs(&self) -> &[TensorSpec] {
        &self.graph.outputs
    }

    pub fn is_quantized(&self) -> bool {
        self.header.int8_weights()
    }

    /// Names of the operators, in execution order.
    pub fn op_names(&self) -> Vec<&'static str> {
        self.graph.ops.iter().map(Op::name).collect()
    }

    /// Run the graph on a single content image.
    ///
    /// The image must match the declared input's shape exactly.
    pub fn run(&self, input: &ImageTensor) -> Result<ImageTensor, ArtifactError> {
        let [declared_in] = self.graph.inputs.as_slice() else {
            return Err(ArtifactError::Unsupported("graph must declare exactly one input"));
        };
        let [declared_out] = self.graph.outputs.as_slice() else {
            return Err(ArtifactError::Unsupported("graph must declare exactly one output"));
        };
        let found = input.spec(declared_in.name.clone());
        if !found.same_layout(declared_in) {
            return Err(ArtifactError::InputMismatch {
                expected: declared_in.clone(),
                found,
            });
        }
        if !declared_in.same_layout(declared_out) {
            return Err(ArtifactError::Unsupported(
                "elementwise graph output must match its input",
            ));
        }

        Ok(input.map_pixels(|px| {
            self.kernels
                .iter()
                .fold(Vec3::from_array(px), |v, k| k.apply(v))
                .to_array()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonegraph_core::{StyleVariant, evaluate_pixel};

    fn small_model(variant: StyleVariant, quantize: bool) -> LoadedModel {
        let mut graph = Graph::for_variant(
            variant,
            TensorSpec::image("content", 2, 2),
            TensorSpec::image("styled", 2, 2),
        );
        if quantize {
            graph = graph.quantized();
        }
        let bytes = graph.to_artifact_bytes().unwrap();
        LoadedModel::from_bytes(Path::new("mem.tflite"), &bytes).unwrap()
    }

    #[test]
    fn test_run_matches_reference() {
        let image = ImageTensor::from_fn(2, 2, |y, x| [0.2 + 0.3 * x as f32, 0.4 * y as f32, 0.9]);
        for v in StyleVariant::all() {
            let out = small_model(*v, false).run(&image).unwrap();
            for (src, dst) in image.pixels.iter().zip(&out.pixels) {
                let expected = evaluate_pixel(*src, *v);
                for c in 0..3 {
                    assert!((dst[c] - expected[c]).abs() < 1e-6, "{v}: {dst:?} vs {expected:?}");
                }
            }
        }
    }

    #[test]
    fn test_run_rejects_wrong_shape() {
        let model = small_model(StyleVariant::ChannelGain, false);
        let err = model.run(&ImageTensor::filled(3, 2, [0.5; 3])).unwrap_err();
        assert!(matches!(err, ArtifactError::InputMismatch { .. }));
    }

    #[test]
    fn test_quantized_flag_exposed() {
        assert!(small_model(StyleVariant::SepiaMatrix, true).is_quantized());
        let plain = small_model(StyleVariant::SepiaMatrix, false);
        assert!(!plain.is_quantized());
        assert_eq!(plain.path(), Path::new("mem.tflite"));
        assert_eq!(
            small_model(StyleVariant::SepiaMatrix, false).op_names(),
            vec!["ChannelMix", "Clamp"]
        );
    }
}
