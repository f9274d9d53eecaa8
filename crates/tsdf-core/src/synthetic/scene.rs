//! Analytic scenes rendered into depth maps.
//!
//! Depth is the camera-frame `z` of the first ray/surface intersection, which
//! is what a depth sensor reports and what fusion compares voxel `z` against.

use crate::{DepthMap, Iso3, ModelError, PinholeIntrinsics, Pt3, Real, Scalar, Vec3};

/// Infinite plane `{ p : normal · p = offset }` in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    pub offset: Real,
}

impl Plane {
    /// Build a plane from any non-zero normal; the normal is normalised.
    pub fn new(normal: Vec3, offset: Real) -> Self {
        let n = normal.norm();
        Self {
            normal: normal / n,
            offset: offset / n,
        }
    }

    /// Signed distance of a world point to the plane (positive on the normal side).
    pub fn signed_distance(&self, p: &Pt3) -> Real {
        self.normal.dot(&p.coords) - self.offset
    }

    /// Ray parameter `t` where `origin + t * dir` meets the plane.
    pub fn intersect(&self, origin: &Pt3, dir: &Vec3) -> Option<Real> {
        let denom = self.normal.dot(dir);
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = (self.offset - self.normal.dot(&origin.coords)) / denom;
        t.is_finite().then_some(t)
    }
}

/// Render the depth map of `plane` seen through `intrinsics` at `world_to_camera`.
///
/// The intrinsics must carry an image size. Pixels whose ray misses the
/// plane, or hits it behind the camera, get depth `0`.
pub fn render_plane_depth(
    intrinsics: &PinholeIntrinsics,
    camera_se3_world: &Iso3,
    plane: &Plane,
) -> Result<DepthMap, ModelError> {
    intrinsics.validate()?;
    let Some(size) = intrinsics.image_size else {
        return Err(ModelError::InvalidIntrinsics(
            "rendering requires an image size".to_string(),
        ));
    };

    let world_se3_camera = camera_se3_world.inverse();
    let eye = world_se3_camera.transform_point(&Pt3::origin());
    let mut depth = DepthMap::new(size.width, size.height);

    for row in 0..size.height {
        for col in 0..size.width {
            // Ray through the pixel centre, scaled so that its camera z is 1:
            // the intersection parameter is then directly the depth.
            let dir_c = Vec3::new(
                (col as Real - intrinsics.cx) / intrinsics.f,
                (row as Real - intrinsics.cy) / intrinsics.f,
                1.0,
            );
            let dir_w = world_se3_camera.transform_vector(&dir_c);
            if let Some(t) = plane.intersect(&eye, &dir_w) {
                if t > 0.0 {
                    depth.set(row, col, t as Scalar);
                }
            }
        }
    }
    Ok(depth)
}

/// World-to-camera pose of a camera at `eye` looking at `target`.
///
/// The camera `+z` axis points at the target and its `+y` axis (image rows)
/// is aligned as closely as possible with `down`.
pub fn look_at(eye: &Pt3, target: &Pt3, down: &Vec3) -> Iso3 {
    Iso3::face_towards(eye, target, down).inverse()
}

/// `n_views` cameras on a ring of radius `radius`, all at distance `standoff`
/// along `-z` from `target` and looking at it.
///
/// Views are ordered by angle; the first view sits at `+x` of the ring.
pub fn orbit_poses(n_views: usize, target: Pt3, radius: Real, standoff: Real) -> Vec<Iso3> {
    (0..n_views)
        .map(|view_idx| {
            let angle = std::f64::consts::TAU * view_idx as Real / n_views.max(1) as Real;
            let eye = Pt3::new(
                target.x + radius * angle.cos(),
                target.y + radius * angle.sin(),
                target.z - standoff,
            );
            look_at(&eye, &target, &Vec3::y())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fronto_parallel_plane_has_constant_depth() {
        let k = PinholeIntrinsics::new(50.0, 15.5, 11.5).with_image_size(32, 24);
        let plane = Plane::new(Vec3::z(), 2.0);
        let depth = render_plane_depth(&k, &Iso3::identity(), &plane).unwrap();
        assert_eq!(depth.valid_count(), 32 * 24);
        for d in depth.as_slice() {
            assert!((d - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn plane_behind_camera_is_invalid() {
        let k = PinholeIntrinsics::new(50.0, 15.5, 11.5).with_image_size(32, 24);
        let plane = Plane::new(Vec3::z(), -1.0);
        let depth = render_plane_depth(&k, &Iso3::identity(), &plane).unwrap();
        assert_eq!(depth.valid_count(), 0);
    }

    #[test]
    fn rendering_requires_image_size() {
        let k = PinholeIntrinsics::new(50.0, 15.5, 11.5);
        let plane = Plane::new(Vec3::z(), 2.0);
        assert!(render_plane_depth(&k, &Iso3::identity(), &plane).is_err());
    }

    #[test]
    fn look_at_straight_ahead_is_a_translation() {
        let pose = look_at(&Pt3::new(1.0, 2.0, 0.0), &Pt3::new(1.0, 2.0, 5.0), &Vec3::y());
        let p = pose.transform_point(&Pt3::new(1.0, 2.0, 5.0));
        assert!((p - Pt3::new(0.0, 0.0, 5.0)).norm() < 1e-12);
        let q = pose.transform_point(&Pt3::new(2.0, 3.0, 0.0));
        assert!((q - Pt3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn orbit_cameras_see_the_target_on_axis() {
        let target = Pt3::new(0.5, 0.5, 1.0);
        for pose in orbit_poses(5, target, 0.2, 0.8) {
            let p = pose.transform_point(&target);
            assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
            assert!(p.z > 0.8);
        }
    }

    #[test]
    fn plane_signed_distance() {
        let plane = Plane::new(Vec3::new(0.0, 0.0, 2.0), 2.0);
        assert!((plane.offset - 1.0).abs() < 1e-12);
        assert!((plane.signed_distance(&Pt3::new(3.0, -1.0, 1.5)) - 0.5).abs() < 1e-12);
    }
}
