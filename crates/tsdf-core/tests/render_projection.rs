//! Integration tests tying the synthetic renderer to the pinhole projection.
//!
//! A depth sample rendered at pixel `(row, col)` must back-project to a world
//! point on the plane that projects back onto the same pixel.

use tsdf_core::synthetic::scene::{look_at, render_plane_depth, Plane};
use tsdf_core::{PixelIndex, PinholeIntrinsics, Pt3, Real, Vec3};

#[test]
fn rendered_depth_reprojects_onto_its_pixel() {
    let k = PinholeIntrinsics::new(80.0, 39.5, 29.5).with_image_size(80, 60);
    let plane = Plane::new(Vec3::new(0.1, -0.2, 1.0), 1.5);
    let pose = look_at(&Pt3::new(0.2, 0.1, -0.5), &Pt3::new(0.0, 0.0, 1.5), &Vec3::y());

    let depth = render_plane_depth(&k, &pose, &plane).expect("render");
    assert!(depth.valid_count() > 0);

    let world_se3_camera = pose.inverse();
    for (row, col) in [(0usize, 0usize), (10, 70), (29, 39), (59, 79)] {
        let d = depth.get(row, col) as Real;
        assert!(d > 0.0, "pixel ({row}, {col}) should see the plane");

        let p_c = Pt3::new(
            (col as Real - k.cx) / k.f * d,
            (row as Real - k.cy) / k.f * d,
            d,
        );
        let p_w = world_se3_camera.transform_point(&p_c);
        assert!(
            plane.signed_distance(&p_w).abs() < 1e-5,
            "back-projected point off plane by {}",
            plane.signed_distance(&p_w)
        );

        let px = k.project(&p_c).expect("point in front of camera");
        assert_eq!(
            px,
            PixelIndex {
                u: col as i64,
                v: row as i64
            }
        );
    }
}
