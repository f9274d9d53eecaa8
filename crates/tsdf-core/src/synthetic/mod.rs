//! Deterministic synthetic data generation helpers.
//!
//! This module provides small, reusable building blocks for constructing
//! synthetic fusion problems used in tests and examples:
//! - analytic planar scenes rendered into depth maps,
//! - look-at and orbit pose generators (world-to-camera),
//! - deterministic pseudo-random depth noise.
//!
//! # Example
//!
//! ```no_run
//! use tsdf_core::synthetic::{noise::UniformDepthNoise, scene};
//! use tsdf_core::{PinholeIntrinsics, Pt3, Vec3};
//!
//! let k = PinholeIntrinsics::new(60.0, 31.5, 23.5).with_image_size(64, 48);
//! let plane = scene::Plane::new(Vec3::z(), 1.0);
//! let poses = scene::orbit_poses(4, Pt3::new(0.5, 0.5, 1.0), 0.1, 0.8);
//! let noise = UniformDepthNoise { seed: 7, max_abs: 0.002 };
//! for (idx, pose) in poses.iter().enumerate() {
//!     let mut depth = scene::render_plane_depth(&k, pose, &plane).unwrap();
//!     noise.apply(idx, &mut depth);
//! }
//! ```

pub mod noise;
pub mod scene;
