//! Advisory structural check of an artifact file.
//!
//! The validator never executes or parses the graph. It reports existence,
//! size, and whether the container magic is present, alongside the tensor
//! contract the application expects. Mismatches become
//! [`ValidationWarning`]s in the report; they never fail the check.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tonegraph_core::contract::{self, ExpectedSpec, TensorRole};
use tonegraph_core::{DType, TensorSpec};

use crate::error::ArtifactError;
use crate::format::MAGIC;

/// Non-fatal findings collected into a [`ValidationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// File is shorter than the magic tag.
    TruncatedHeader { size_bytes: u64 },
    /// First four bytes are not the expected tag.
    UnexpectedMagic { found: Vec<u8> },
    /// A required contract tensor is not declared.
    MissingTensor { role: TensorRole },
    ShapeMismatch {
        role: TensorRole,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    DTypeMismatch {
        role: TensorRole,
        expected: DType,
        found: DType,
    },
    /// A declared tensor beyond the contract.
    UnexpectedTensor { name: String, input: bool },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedHeader { size_bytes } => {
                write!(f, "file too short for magic bytes ({size_bytes} bytes)")
            }
            Self::UnexpectedMagic { found } => {
                write!(f, "Unexpected magic bytes: b'{}'", found.escape_ascii())
            }
            Self::MissingTensor { role } => write!(f, "{} is not declared", role.label()),
            Self::ShapeMismatch {
                role,
                expected,
                found,
            } => write!(
                f,
                "{} shape {found:?} differs from expected {expected:?}",
                role.label()
            ),
            Self::DTypeMismatch {
                role,
                expected,
                found,
            } => write!(
                f,
                "{} dtype {found} differs from expected {expected}",
                role.label()
            ),
            Self::UnexpectedTensor { name, input } => write!(
                f,
                "unexpected {} `{name}` beyond the expected contract",
                if *input { "input" } else { "output" }
            ),
        }
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub found: bool,
    pub size_bytes: u64,
    pub magic_ok: bool,
    pub warnings: Vec<ValidationWarning>,
    pub expected_specs: Vec<ExpectedSpec>,
}

impl ValidationReport {
    /// Report for a path that does not exist. No other field is computed.
    pub fn missing(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            found: false,
            size_bytes: 0,
            magic_ok: false,
            warnings: Vec::new(),
            expected_specs: Vec::new(),
        }
    }

    /// Convert a not-found report into [`ArtifactError::NotFound`].
    pub fn require_found(self) -> Result<Self, ArtifactError> {
        if self.found {
            Ok(self)
        } else {
            Err(ArtifactError::NotFound(self.path))
        }
    }

    /// Append warnings from reconciling declared tensors against the contract.
    pub fn reconcile_with(mut self, inputs: &[TensorSpec], outputs: &[TensorSpec]) -> Self {
        self.warnings.extend(reconcile(inputs, outputs));
        self
    }

    /// Found, magic present, and nothing to warn about.
    pub fn is_clean(&self) -> bool {
        self.found && self.magic_ok && self.warnings.is_empty()
    }
}

/// Check the file at `path`.
///
/// A missing path yields a report with `found = false`; any other I/O failure
/// is returned as [`ArtifactError::Io`]. Only the first four bytes are read.
pub fn validate(path: &Path) -> Result<ValidationReport, ArtifactError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "artifact not found");
            return Ok(ValidationReport::missing(path));
        }
        Err(e) => return Err(ArtifactError::io(path, e)),
    };
    let size_bytes = metadata.len();

    let mut head = Vec::with_capacity(MAGIC.len());
    File::open(path)
        .and_then(|f| f.take(MAGIC.len() as u64).read_to_end(&mut head))
        .map_err(|e| ArtifactError::io(path, e))?;

    let mut warnings = Vec::new();
    let magic_ok = head == MAGIC;
    if head.len() < MAGIC.len() {
        warnings.push(ValidationWarning::TruncatedHeader { size_bytes });
    } else if !magic_ok {
        warnings.push(ValidationWarning::UnexpectedMagic { found: head });
    }
    for w in &warnings {
        tracing::warn!(path = %path.display(), "{w}");
    }

    Ok(ValidationReport {
        path: path.to_path_buf(),
        found: true,
        size_bytes,
        magic_ok,
        warnings,
        expected_specs: contract::expected_specs(),
    })
}

/// Compare declared tensors with the expected contract, by position.
pub fn reconcile(inputs: &[TensorSpec], outputs: &[TensorSpec]) -> Vec<ValidationWarning> {
    let expected = contract::expected_specs();
    let mut warnings = Vec::new();

    for entry in &expected {
        let declared = if entry.role.is_input() {
            inputs.get(entry.role.index())
        } else {
            outputs.get(entry.role.index())
        };
        match declared {
            None if !entry.optional => {
                warnings.push(ValidationWarning::MissingTensor { role: entry.role })
            }
            None => {}
            Some(found) => {
                if found.shape != entry.spec.shape {
                    warnings.push(ValidationWarning::ShapeMismatch {
                        role: entry.role,
                        expected: entry.spec.shape.clone(),
                        found: found.shape.clone(),
                    });
                }
                if found.dtype != entry.spec.dtype {
                    warnings.push(ValidationWarning::DTypeMismatch {
                        role: entry.role,
                        expected: entry.spec.dtype,
                        found: found.dtype,
                    });
                }
            }
        }
    }

    let n_inputs = expected.iter().filter(|e| e.role.is_input()).count();
    let n_outputs = expected.len() - n_inputs;
    for spec in inputs.iter().skip(n_inputs) {
        warnings.push(ValidationWarning::UnexpectedTensor {
            name: spec.name.clone(),
            input: true,
        });
    }
    for spec in outputs.iter().skip(n_outputs) {
        warnings.push(ValidationWarning::UnexpectedTensor {
            name: spec.name.clone(),
            input: false,
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_single_input_artifact_is_clean() {
        let warnings = reconcile(&[contract::content_input()], &[contract::styled_output()]);
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_reconcile_dual_input_artifact_is_clean() {
        let warnings = reconcile(
            &[contract::content_input(), contract::style_input()],
            &[contract::styled_output()],
        );
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_reconcile_reports_shape_mismatch() {
        let small = TensorSpec::image("content", 256, 256);
        let warnings = reconcile(&[small], &[contract::styled_output()]);
        assert_eq!(
            warnings,
            vec![ValidationWarning::ShapeMismatch {
                role: TensorRole::ContentInput,
                expected: vec![1, 384, 384, 3],
                found: vec![1, 256, 256, 3],
            }]
        );
    }

    #[test]
    fn test_reconcile_reports_missing_and_extra() {
        let extra = TensorSpec::image("mask", 384, 384);
        let warnings = reconcile(&[], &[contract::styled_output(), extra]);
        assert_eq!(
            warnings,
            vec![
                ValidationWarning::MissingTensor {
                    role: TensorRole::ContentInput
                },
                ValidationWarning::UnexpectedTensor {
                    name: "mask".into(),
                    input: false
                },
            ]
        );
    }

    #[test]
    fn test_missing_report_has_no_computed_fields() {
        let report = ValidationReport::missing(Path::new("/nowhere/model.tflite"));
        assert!(!report.found);
        assert_eq!(report.size_bytes, 0);
        assert!(!report.magic_ok);
        assert!(report.expected_specs.is_empty());
        assert!(matches!(
            report.require_found(),
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[test]
    fn test_magic_warning_display() {
        let w = ValidationWarning::UnexpectedMagic {
            found: b"PK\x03\x04".to_vec(),
        };
        assert_eq!(w.to_string(), "Unexpected magic bytes: b'PK\\x03\\x04'");
    }
}
