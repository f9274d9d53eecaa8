//! Voxel-to-pixel projection.

use nalgebra::Point3;
use rayon::prelude::*;
use tsdf_core::{Iso3, PinholeIntrinsics, PixelIndex, Real, Scalar};

/// Voxel centres expressed in one camera's frame and image.
///
/// Both buffers are indexed like the grid.
#[derive(Clone, Debug, Default)]
pub struct ProjectedVoxels {
    /// `camera_se3_world * center` for every voxel.
    pub camera_points: Vec<Point3<Scalar>>,
    /// Rounded pixel of every voxel; `None` when the voxel is on or behind the
    /// image plane or its projection is not finite.
    pub pixels: Vec<Option<PixelIndex>>,
}

impl ProjectedVoxels {
    /// Number of voxels that produced a pixel coordinate.
    pub fn projected_count(&self) -> usize {
        self.pixels.par_iter().filter(|p| p.is_some()).count()
    }
}

/// Maps voxel centres into pixel space with a pinhole camera.
#[derive(Clone, Debug)]
pub struct Projector {
    intrinsics: PinholeIntrinsics,
}

impl Projector {
    pub fn new(intrinsics: PinholeIntrinsics) -> Self {
        Self { intrinsics }
    }

    pub fn intrinsics(&self) -> &PinholeIntrinsics {
        &self.intrinsics
    }

    /// Transform every centre into the camera frame and project it.
    ///
    /// No bounds checking is done here; a pixel may be negative or beyond
    /// the image. Geometry is evaluated in [`Real`] precision.
    pub fn project(&self, centers: &[Point3<Scalar>], camera_se3_world: &Iso3) -> ProjectedVoxels {
        let (camera_points, pixels) = centers
            .par_iter()
            .map(|center| {
                let p_c = camera_se3_world.transform_point(&center.cast::<Real>());
                (p_c.cast::<Scalar>(), self.intrinsics.project(&p_c))
            })
            .unzip();

        ProjectedVoxels {
            camera_points,
            pixels,
        }
    }
}
