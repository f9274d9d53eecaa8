//! Mathematical utilities and type definitions.
//!
//! Geometry is expressed in [`Real`] (`f64`); the voxel grid itself stores
//! single precision values, see [`Scalar`].

use nalgebra::{Isometry3, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

pub mod rounding;

pub use rounding::{round_to_pixel, PixelIndex};

/// Scalar type used for geometry and camera parameters (currently `f64`).
pub type Real = f64;
/// Scalar type used for dense per-voxel storage (currently `f32`).
pub type Scalar = f32;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Convert a 3D homogeneous image vector back to a 2D point.
///
/// The input is interpreted as `(x, y, w)` and the result is `(x / w, y / w)`.
/// Returns `None` when `w` is zero or the result is not finite.
pub fn from_homogeneous(v: &Vec3) -> Option<Pt2> {
    if v.z == 0.0 {
        return None;
    }
    let p = Pt2::new(v.x / v.z, v.y / v.z);
    (p.x.is_finite() && p.y.is_finite()).then_some(p)
}
