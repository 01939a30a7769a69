//! Fixed color transforms: variant coefficients and per-pixel evaluation.

pub mod evaluate;
pub mod variant;
