//! Tonegraph Core — domain layer for placeholder style-transfer models.
//!
//! This crate defines the closed-form color transforms embedded into model
//! artifacts, the tensor shape contract the application loads against, and
//! the image tensor type the transforms operate on. No I/O.

pub mod contract;
pub mod image;
pub mod tensor;
pub mod transform;

// Re-exports for convenience.
pub use contract::{ExpectedSpec, TensorRole};
pub use image::ImageTensor;
pub use tensor::{DType, ShapeError, TensorSpec};
pub use transform::evaluate::{apply_transform, evaluate_pixel};
pub use transform::variant::{ColorKernel, StyleVariant, UnknownVariant};
