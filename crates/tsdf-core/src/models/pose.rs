//! Rigid pose helpers.
//!
//! Poses handed to the fusion engine always map grid (world) coordinates into
//! the camera frame: `p_cam = camera_se3_world * p_world`. Trajectory sources
//! that store the inverse must be converted with [`PoseConvention`].

use nalgebra::{Quaternion, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::{Iso3, Mat3, Mat4, Real, Vec3};

const ROTATION_TOL: Real = 1e-6;

/// Direction in which a stored pose maps points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseConvention {
    /// `p_cam = T * p_world` (COLMAP `images.txt`).
    #[default]
    WorldToCamera,
    /// `p_world = T * p_cam` (most SLAM trajectory dumps).
    CameraToWorld,
}

impl PoseConvention {
    /// Convert a pose stored in this convention into world-to-camera form.
    pub fn to_world_to_camera(self, pose: Iso3) -> Iso3 {
        match self {
            PoseConvention::WorldToCamera => pose,
            PoseConvention::CameraToWorld => pose.inverse(),
        }
    }
}

/// Build a pose from a Hamilton quaternion `(w, x, y, z)` and a translation.
///
/// The quaternion is normalised; a zero or non-finite quaternion is rejected.
pub fn pose_from_quaternion(
    qw: Real,
    qx: Real,
    qy: Real,
    qz: Real,
    translation: Vec3,
) -> Result<Iso3, ModelError> {
    let q = Quaternion::new(qw, qx, qy, qz);
    let norm = q.norm();
    if !norm.is_finite() || norm < 1e-12 {
        return Err(ModelError::InvalidPose(format!(
            "quaternion ({qw}, {qx}, {qy}, {qz}) cannot be normalised"
        )));
    }
    if !translation.iter().all(|v| v.is_finite()) {
        return Err(ModelError::InvalidPose(format!(
            "translation {:?} is not finite",
            translation.as_slice()
        )));
    }
    Ok(Iso3::from_parts(
        Translation3::from(translation),
        UnitQuaternion::from_quaternion(q),
    ))
}

/// Convert a homogeneous 4×4 rigid transform into an [`Iso3`].
///
/// The matrix must be finite, have bottom row `[0 0 0 1]` and an
/// orthonormal, right-handed rotation block.
pub fn pose_from_matrix(m: &Mat4) -> Result<Iso3, ModelError> {
    if !m.iter().all(|v| v.is_finite()) {
        return Err(ModelError::InvalidPose(
            "matrix contains non-finite entries".to_string(),
        ));
    }
    let bottom = m.fixed_view::<1, 4>(3, 0);
    let expected = [0.0, 0.0, 0.0, 1.0];
    if bottom
        .iter()
        .zip(expected)
        .any(|(a, b)| (a - b).abs() > ROTATION_TOL)
    {
        return Err(ModelError::InvalidPose(format!(
            "bottom row must be [0 0 0 1], got {:?}",
            bottom.iter().collect::<Vec<_>>()
        )));
    }

    let r: Mat3 = m.fixed_view::<3, 3>(0, 0).into_owned();
    let orthogonality = (r.transpose() * r - Mat3::identity()).abs().max();
    if orthogonality > ROTATION_TOL {
        return Err(ModelError::InvalidPose(format!(
            "rotation block is not orthonormal (max deviation {orthogonality:.3e})"
        )));
    }
    let det = r.determinant();
    if (det - 1.0).abs() > ROTATION_TOL {
        return Err(ModelError::InvalidPose(format!(
            "rotation block has determinant {det}, expected 1"
        )));
    }

    let t = Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let rot = Rotation3::from_matrix_unchecked(r);
    Ok(Iso3::from_parts(
        Translation3::from(t),
        UnitQuaternion::from_rotation_matrix(&rot),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pt3;

    #[test]
    fn identity_quaternion_gives_pure_translation() {
        let pose = pose_from_quaternion(1.0, 0.0, 0.0, 0.0, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let p = pose.transform_point(&Pt3::origin());
        assert_eq!(p, Pt3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn quaternion_is_normalised() {
        let pose = pose_from_quaternion(2.0, 0.0, 0.0, 0.0, Vec3::zeros()).unwrap();
        let p = pose.transform_point(&Pt3::new(1.0, 0.0, 0.0));
        assert!((p - Pt3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn zero_quaternion_is_rejected() {
        assert!(pose_from_quaternion(0.0, 0.0, 0.0, 0.0, Vec3::zeros()).is_err());
        assert!(pose_from_quaternion(1.0, 0.0, 0.0, 0.0, Vec3::new(Real::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn matrix_roundtrip() {
        let rot = UnitQuaternion::from_scaled_axis(Vec3::new(0.1, -0.2, 0.3));
        let pose = Iso3::from_parts(Translation3::new(0.5, -1.0, 2.0), rot);
        let back = pose_from_matrix(&pose.to_homogeneous()).unwrap();
        let p = Pt3::new(0.3, 0.2, 0.1);
        assert!((back * p - pose * p).norm() < 1e-12);
    }

    #[test]
    fn matrix_validation() {
        let mut m = Mat4::identity();
        m[(3, 0)] = 0.5;
        assert!(pose_from_matrix(&m).is_err());

        let mut m = Mat4::identity();
        m[(0, 0)] = 2.0;
        assert!(pose_from_matrix(&m).is_err());

        // reflection
        let mut m = Mat4::identity();
        m[(2, 2)] = -1.0;
        assert!(pose_from_matrix(&m).is_err());

        let mut m = Mat4::identity();
        m[(0, 3)] = Real::INFINITY;
        assert!(pose_from_matrix(&m).is_err());
    }

    #[test]
    fn camera_to_world_is_inverted() {
        let c2w = Iso3::translation(0.0, 0.0, -2.0);
        let w2c = PoseConvention::CameraToWorld.to_world_to_camera(c2w);
        let p = w2c.transform_point(&Pt3::origin());
        assert!((p - Pt3::new(0.0, 0.0, 2.0)).norm() < 1e-12);
        assert_eq!(PoseConvention::WorldToCamera.to_world_to_camera(c2w), c2w);
    }
}
