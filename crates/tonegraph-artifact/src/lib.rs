//! Model artifact crate for Tonegraph.
//!
//! Builds `TFL3` container files embedding one fixed color transform,
//! validates their structure without executing them, and reads them back for
//! inspection and execution.

pub mod builder;
mod error;
pub mod format;
pub mod graph;
pub mod reader;
pub mod validator;

pub use builder::{BuildOptions, BuildSummary, FlatGraphEncoder, GraphEncoder, build_artifact};
pub use error::{ArtifactError, BuildError, DecodeError};
pub use format::MAGIC;
pub use reader::LoadedModel;
pub use validator::{ValidationReport, ValidationWarning, reconcile, validate};
