//! Artifact builder: variant → fixed-shape graph → bytes → file.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tonegraph_core::{StyleVariant, TensorSpec};

use crate::error::{ArtifactError, BuildError};
use crate::graph::Graph;

/// Options controlling how an artifact is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Store weights as int8. Shrinks the file; results stay within 1e-2.
    pub optimize: bool,
    /// Override the declared `(height, width)`. `None` keeps 384×384.
    pub input_size: Option<(usize, usize)>,
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSummary {
    pub path: PathBuf,
    pub variant: StyleVariant,
    pub size_bytes: u64,
    pub quantized: bool,
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

/// Turns a single elementwise transform over a fixed shape into artifact bytes.
///
/// Keeps the reference transforms independent of any particular graph
/// serialization.
pub trait GraphEncoder {
    fn encode(
        &self,
        variant: StyleVariant,
        input: &TensorSpec,
        output: &TensorSpec,
        optimize: bool,
    ) -> Result<Vec<u8>, BuildError>;
}

/// Encoder producing this crate's `TFL3` container.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGraphEncoder;

impl GraphEncoder for FlatGraphEncoder {
    fn encode(
        &self,
        variant: StyleVariant,
        input: &TensorSpec,
        output: &TensorSpec,
        optimize: bool,
    ) -> Result<Vec<u8>, BuildError> {
        let mut graph = Graph::for_variant(variant, input.clone(), output.clone());
        if optimize {
            graph = graph.quantized();
        }
        graph.to_artifact_bytes()
    }
}

/// Build an artifact for `variant` at `path` with the default encoder.
///
/// The parent directory of `path` must already exist. An existing file is
/// replaced atomically; a failed build leaves it untouched.
pub fn build_artifact(
    variant: StyleVariant,
    path: &Path,
    options: &BuildOptions,
) -> Result<BuildSummary, ArtifactError> {
    build_artifact_with(&FlatGraphEncoder, variant, path, options)
}

/// Build an artifact using a caller-supplied encoder.
pub fn build_artifact_with<E: GraphEncoder + ?Sized>(
    encoder: &E,
    variant: StyleVariant,
    path: &Path,
    options: &BuildOptions,
) -> Result<BuildSummary, ArtifactError> {
    let (input, output) = declared_specs(variant, options.input_size).map_err(BuildError::from)?;
    tracing::debug!(%variant, input = %input, output = %output, "encoding graph");

    let bytes = encoder.encode(variant, &input, &output, options.optimize)?;
    write_artifact(path, &bytes)?;

    tracing::info!(
        %variant,
        path = %path.display(),
        size_bytes = bytes.len(),
        quantized = options.optimize,
        "artifact written"
    );

    Ok(BuildSummary {
        path: path.to_path_buf(),
        variant,
        size_bytes: bytes.len() as u64,
        quantized: options.optimize,
        inputs: vec![input],
        outputs: vec![output],
    })
}

fn declared_specs(
    variant: StyleVariant,
    size: Option<(usize, usize)>,
) -> Result<(TensorSpec, TensorSpec), tonegraph_core::ShapeError> {
    let mut input = variant.input_spec();
    let mut output = variant.output_spec();
    if let Some((height, width)) = size {
        input = TensorSpec::image(input.name, height, width);
        output = TensorSpec::image(output.name, height, width);
    }
    input.check_image()?;
    output.check_image()?;
    Ok((input, output))
}

/// Write to a sibling temp file, then rename it over `path`.
fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ArtifactError::io(path, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ArtifactError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| ArtifactError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingEncoder;

    impl GraphEncoder for RejectingEncoder {
        fn encode(
            &self,
            _: StyleVariant,
            _: &TensorSpec,
            _: &TensorSpec,
            _: bool,
        ) -> Result<Vec<u8>, BuildError> {
            Err(BuildError::SectionOverflow {
                section: "graph body",
                len: usize::MAX,
                max: u32::MAX as usize,
            })
        }
    }

    #[test]
    fn test_declared_specs_default_to_contract() {
        let (input, output) = declared_specs(StyleVariant::SepiaMatrix, None).unwrap();
        assert_eq!(input.shape, vec![1, 384, 384, 3]);
        assert_eq!(output.shape, vec![1, 384, 384, 3]);
    }

    #[test]
    fn test_declared_specs_reject_zero_size() {
        let err = declared_specs(StyleVariant::ChannelGain, Some((0, 384))).unwrap_err();
        assert!(matches!(err, tonegraph_core::ShapeError::NonPositive { axis: 1, .. }));
    }

    #[test]
    fn test_encoder_failure_propagates_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.tflite");
        let err = build_artifact_with(
            &RejectingEncoder,
            StyleVariant::SepiaMatrix,
            &path,
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ArtifactError::Build(BuildError::SectionOverflow { .. })));
        assert!(!path.exists());
    }

    fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("taken");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), b"x").unwrap();

        let err = write_artifact(&target, b"TFL3").unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }), "{err:?}");
        assert_eq!(dir_entries(dir.path()), vec![target]);
    }

    #[test]
    fn test_rebuild_replaces_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.tflite");
        std::fs::write(&path, b"stale contents").unwrap();

        build_artifact(StyleVariant::ChannelGain, &path, &BuildOptions::default()).unwrap();
        let first = std::fs::read(&path).unwrap();
        assert_eq!(&first[..4], b"TFL3");

        let opts = BuildOptions {
            optimize: true,
            ..Default::default()
        };
        build_artifact(StyleVariant::ChannelGain, &path, &opts).unwrap();
        assert_eq!(dir_entries(dir.path()), vec![path.clone()]);
        assert!(std::fs::read(&path).unwrap().len() < first.len());
    }
}
