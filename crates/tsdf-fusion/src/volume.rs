//! Frame-by-frame fusion driver.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tsdf_core::{DepthMap, Iso3, ModelError, PinholeIntrinsics};

use crate::{
    DepthValidator, FusionConfig, FusionError, FusionUpdater, GridSnapshot, Projector, VoxelGrid,
};

/// Per-frame diagnostics returned by [`TsdfVolume::integrate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    /// Zero-based position of the frame in the integration sequence.
    pub frame: usize,
    /// Voxels in front of the camera with a finite projection.
    pub projected: usize,
    /// Voxels projecting inside the depth image.
    pub in_bounds: usize,
    /// Voxels whose TSDF was updated.
    pub fused: usize,
    /// Fused voxels whose weight had already saturated.
    pub saturated: usize,
}

/// A TSDF volume that fuses depth frames into a dense voxel grid.
///
/// Each call to [`integrate`](Self::integrate) runs projection, masking and
/// the weighted update over all voxels. The volume is valid and readable
/// after every completed call.
///
/// # Example
///
/// ```no_run
/// use tsdf_core::{DepthMap, Iso3, PinholeIntrinsics};
/// use tsdf_fusion::{FusionConfig, TsdfVolume};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let k = PinholeIntrinsics::new(525.0, 319.5, 239.5).with_image_size(640, 480);
/// let mut volume = TsdfVolume::new(FusionConfig::default(), k)?;
///
/// let depth = DepthMap::filled(640, 480, 1.5);
/// let stats = volume.integrate(&depth, &Iso3::identity())?;
/// println!("fused {} voxels", stats.fused);
///
/// let (tsdf, weight) = volume.into_grid().into_parts();
/// # let _ = (tsdf, weight);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TsdfVolume {
    config: FusionConfig,
    grid: VoxelGrid,
    projector: Projector,
    validator: DepthValidator,
    updater: FusionUpdater,
    frames_integrated: usize,
}

impl TsdfVolume {
    /// Validate the configuration and allocate the grid.
    pub fn new(config: FusionConfig, intrinsics: PinholeIntrinsics) -> Result<Self, FusionError> {
        config.validate()?;
        intrinsics.validate()?;

        let grid = VoxelGrid::new(config.resolution, config.voxel_scale)?;
        info!(
            "allocated {r}x{r}x{r} TSDF grid (voxel {:.4}, truncation {:.4}, {:.1} MiB)",
            config.voxel_scale,
            config.truncation_threshold,
            VoxelGrid::required_bytes(config.resolution).unwrap_or(0) as f64 / (1 << 20) as f64,
            r = config.resolution,
        );

        Ok(Self {
            projector: Projector::new(intrinsics),
            validator: DepthValidator::new(config.max_depth),
            updater: FusionUpdater::new(config.truncation_threshold),
            config,
            grid,
            frames_integrated: 0,
        })
    }

    /// Fuse one depth frame observed from `camera_se3_world`.
    ///
    /// `camera_se3_world` maps grid-frame points into the camera frame. Inputs
    /// are checked before any voxel is modified; per-voxel exclusions
    /// (behind the camera, out of image, invalid depth, outside the
    /// truncation band) are silent.
    pub fn integrate(
        &mut self,
        depth: &DepthMap,
        camera_se3_world: &Iso3,
    ) -> Result<FrameStats, FusionError> {
        self.check_inputs(depth, camera_se3_world)?;

        let projected = self
            .projector
            .project(self.grid.centers(), camera_se3_world);
        let valid = self.validator.validate(&projected.pixels, depth);
        let update = self.updater.update(
            &mut self.grid,
            &projected.camera_points,
            &valid.mask,
            &valid.depths,
        )?;

        let stats = FrameStats {
            frame: self.frames_integrated,
            projected: projected.projected_count(),
            in_bounds: valid.depths.len(),
            fused: update.fused,
            saturated: update.saturated,
        };
        self.frames_integrated += 1;

        debug!(
            "frame {}: projected={} in_bounds={} fused={}",
            stats.frame, stats.projected, stats.in_bounds, stats.fused
        );
        if stats.saturated > 0 {
            warn!(
                "frame {}: {} voxels at maximum weight {}",
                stats.frame,
                stats.saturated,
                crate::Weight::MAX
            );
        }
        Ok(stats)
    }

    fn check_inputs(&self, depth: &DepthMap, pose: &Iso3) -> Result<(), FusionError> {
        if let Some(size) = self.projector.intrinsics().image_size {
            if depth.width() != size.width || depth.height() != size.height {
                return Err(FusionError::DepthShapeMismatch {
                    width: depth.width(),
                    height: depth.height(),
                    expected_width: size.width,
                    expected_height: size.height,
                });
            }
        }
        let finite = pose.translation.vector.iter().all(|v| v.is_finite())
            && pose.rotation.coords.iter().all(|v| v.is_finite());
        if !finite {
            return Err(ModelError::InvalidPose("pose has non-finite entries".to_string()).into());
        }
        Ok(())
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn intrinsics(&self) -> &PinholeIntrinsics {
        self.projector.intrinsics()
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Number of successful [`integrate`](Self::integrate) calls.
    pub fn frames_integrated(&self) -> usize {
        self.frames_integrated
    }

    /// Copy the grid state into a serializable snapshot.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            resolution: self.grid.resolution(),
            voxel_scale: self.grid.voxel_scale(),
            truncation_threshold: self.config.truncation_threshold,
            frames_integrated: self.frames_integrated,
            tsdf: self.grid.tsdf().to_vec(),
            weight: self.grid.weights().to_vec(),
        }
    }

    /// Hand the grid over to a downstream consumer.
    pub fn into_grid(self) -> VoxelGrid {
        self.grid
    }
}
