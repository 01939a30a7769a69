use std::io;
use std::path::{Path, PathBuf};

use tonegraph_core::{ShapeError, TensorSpec};

/// Operation-level failures. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("build failed: {0}")]
    Build(#[from] BuildError),
    #[error("malformed artifact {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("input {found} does not match declared input {expected}")]
    InputMismatch {
        expected: TensorSpec,
        found: TensorSpec,
    },
    #[error("unsupported graph: {0}")]
    Unsupported(&'static str),
}

impl ArtifactError {
    /// Wrap an I/O error from a read, mapping a missing file to
    /// [`ArtifactError::NotFound`].
    pub(crate) fn on_read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return Self::NotFound(path.to_path_buf());
        }
        Self::io(path, source)
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Failures while turning a variant into artifact bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("invalid tensor shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("{section} length {len} exceeds the container limit of {max}")]
    SectionOverflow {
        section: &'static str,
        len: usize,
        max: usize,
    },
}

/// Structural problems found while parsing an artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated at byte {offset}: needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },
    #[error("bad magic bytes {0:?}")]
    BadMagic([u8; 4]),
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),
    #[error("unknown header flags {0:#06x}")]
    UnknownFlags(u16),
    #[error("body length {declared} does not match {actual} bytes present")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("unknown dtype code {0}")]
    UnknownDType(u8),
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("unknown weight encoding {0}")]
    UnknownEncoding(u8),
    #[error("tensor name is not valid UTF-8")]
    InvalidName,
    #[error("{scales} int8 scales do not divide {values} weights")]
    ScaleCount { values: usize, scales: usize },
    #[error("invalid {op} operator: {reason}")]
    InvalidOp {
        op: &'static str,
        reason: &'static str,
    },
}
