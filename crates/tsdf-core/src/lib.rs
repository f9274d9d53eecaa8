//! Core math and geometry primitives for `tsdf-rs`.
//!
//! This crate provides the building blocks shared by the fusion engine,
//! the dataset loaders and the CLI:
//!
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt3`, `Iso3`, ...),
//! - a square-pixel pinhole camera model ([`PinholeIntrinsics`]),
//! - rigid pose helpers (quaternion/matrix conversions, pose conventions),
//! - an owned row-major depth image ([`DepthMap`]),
//! - deterministic synthetic scenes for tests and demos.
//!
//! Projection pipeline:
//! `pixel = K * (world_to_camera * p_world) / z`
//!
//! # Example
//!
//! ```no_run
//! use tsdf_core::{PinholeIntrinsics, Pt3};
//!
//! let k = PinholeIntrinsics::new(525.0, 319.5, 239.5).with_image_size(640, 480);
//! let px = k.project(&Pt3::new(0.1, -0.05, 1.2));
//! assert!(px.is_some());
//! ```

/// Linear algebra type aliases and helpers.
pub mod math;
/// Camera intrinsics and pose utilities.
pub mod models;
/// Deterministic synthetic data generation helpers.
///
/// Used by tests across the workspace and by the CLI smoke tests. Scenes are
/// built without random number generators so results are stable across
/// platforms.
pub mod synthetic;

mod depth;

pub use depth::*;
pub use math::*;
pub use models::*;
