//! Image-bounds masking and depth lookup.

use rayon::prelude::*;
use tsdf_core::{DepthMap, PixelIndex, Scalar};

/// Result of masking one frame.
#[derive(Clone, Debug, Default)]
pub struct ValidDepths {
    /// Per-voxel flag: the voxel projects inside the image.
    pub mask: Vec<bool>,
    /// Depth samples of the masked voxels, in voxel order. Samples beyond
    /// `max_depth` (or non-finite) are reported as `0`.
    pub depths: Vec<Scalar>,
}

/// Decides which voxels see the image and fetches their depth samples.
#[derive(Clone, Copy, Debug)]
pub struct DepthValidator {
    max_depth: Scalar,
}

impl DepthValidator {
    pub fn new(max_depth: Scalar) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> Scalar {
        self.max_depth
    }

    /// Mask voxels by image bounds and gather the depth under each masked voxel.
    ///
    /// The depth map is only read: the max-depth clamp is applied to the
    /// gathered samples, not written back to the caller's buffer.
    pub fn validate(&self, pixels: &[Option<PixelIndex>], depth: &DepthMap) -> ValidDepths {
        let (width, height) = (depth.width(), depth.height());
        let lookup = |p: &Option<PixelIndex>| p.and_then(|p| p.in_bounds(width, height));

        let mask = pixels.par_iter().map(|p| lookup(p).is_some()).collect();
        let depths = pixels
            .par_iter()
            .filter_map(lookup)
            .map(|(row, col)| self.clamp(depth.get(row, col)))
            .collect();

        ValidDepths { mask, depths }
    }

    /// Apply the max-depth clamp to a single sample.
    #[inline]
    pub fn clamp(&self, d: Scalar) -> Scalar {
        if d.is_finite() && d <= self.max_depth {
            d
        } else {
            0.0
        }
    }
}
