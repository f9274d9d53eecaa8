//! Camera model building blocks.
//!
//! The fusion engine only needs two pieces of camera geometry:
//!
//! 1. [`PinholeIntrinsics`]: square-pixel, zero-skew pinhole `K`.
//! 2. A world-to-camera rigid transform ([`crate::Iso3`]), built with the
//!    helpers in [`pose`](self) from quaternions or raw 4×4 matrices.
//!
//! Lens distortion is deliberately not modelled.

use thiserror::Error;

mod intrinsics;
mod pose;

pub use intrinsics::*;
pub use pose::*;

/// Errors raised when camera or image inputs do not have the expected form.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Intrinsics are not a finite, positive-focal, zero-skew pinhole `K`.
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(String),
    /// A pose is not a finite rigid transform.
    #[error("invalid pose: {0}")]
    InvalidPose(String),
    /// A depth buffer does not match its declared dimensions.
    #[error("depth buffer has {actual} samples, expected {width}x{height}")]
    InvalidDepthMap {
        width: usize,
        height: usize,
        actual: usize,
    },
}
