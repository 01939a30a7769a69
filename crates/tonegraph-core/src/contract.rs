//! The tensor contract the downstream application is built against.
//!
//! The application feeds a content image (and, for the larger externally
//! supplied model, a style image) and reads back one styled image. Artifacts
//! built in this workspace only ever declare the single content input.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tensor::TensorSpec;

/// Edge length of content and output images.
pub const CONTENT_SIZE: usize = 384;
/// Edge length of the style image taken by the dual-input model.
pub const STYLE_SIZE: usize = 256;

/// Position of a tensor in the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorRole {
    /// Input 0: the image to be styled.
    ContentInput,
    /// Input 1: the style reference image.
    StyleInput,
    /// Output 0: the styled image.
    StyledOutput,
}

impl TensorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ContentInput => "Input 0 (Content)",
            Self::StyleInput => "Input 1 (Style)",
            Self::StyledOutput => "Output",
        }
    }

    /// Whether this is an input (as opposed to an output) slot.
    pub const fn is_input(self) -> bool {
        !matches!(self, Self::StyledOutput)
    }

    /// Positional index within the inputs or outputs list.
    pub const fn index(self) -> usize {
        match self {
            Self::ContentInput | Self::StyledOutput => 0,
            Self::StyleInput => 1,
        }
    }
}

/// One entry of the expected contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedSpec {
    pub role: TensorRole,
    pub spec: TensorSpec,
    /// Optional entries may be absent from an artifact without a warning.
    pub optional: bool,
}

impl fmt::Display for ExpectedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<18} {:?} {}", format!("{}:", self.role.label()), self.spec.shape, self.spec.dtype)?;
        if self.optional {
            write!(f, " (optional)")?;
        }
        Ok(())
    }
}

/// `[1, 384, 384, 3]` float32 content input.
pub fn content_input() -> TensorSpec {
    TensorSpec::image("content", CONTENT_SIZE, CONTENT_SIZE)
}

/// `[1, 256, 256, 3]` float32 style input.
pub fn style_input() -> TensorSpec {
    TensorSpec::image("style", STYLE_SIZE, STYLE_SIZE)
}

/// `[1, 384, 384, 3]` float32 styled output.
pub fn styled_output() -> TensorSpec {
    TensorSpec::image("styled", CONTENT_SIZE, CONTENT_SIZE)
}

/// The full expected contract, inputs first.
pub fn expected_specs() -> Vec<ExpectedSpec> {
    vec![
        ExpectedSpec {
            role: TensorRole::ContentInput,
            spec: content_input(),
            optional: false,
        },
        ExpectedSpec {
            role: TensorRole::StyleInput,
            spec: style_input(),
            optional: true,
        },
        ExpectedSpec {
            role: TensorRole::StyledOutput,
            spec: styled_output(),
            optional: false,
        },
    ]
}
