//! Dataset-level reconstruction: open a dataset, integrate frames `1..=N`
//! into a [`TsdfVolume`] and summarise the result.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tsdf_core::{DepthMap, Iso3, PinholeIntrinsics, PoseConvention, Scalar};
use tsdf_fusion::{FrameStats, FusionConfig, TsdfVolume};
use tsdf_io::Dataset;

/// Default conversion from integer depth units (millimetres) to metres.
pub const DEFAULT_DEPTH_SCALE: Scalar = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Grid and fusion parameters.
    pub fusion: FusionConfig,
    /// Divisor applied to integer depth samples.
    pub depth_scale: Scalar,
    /// How `images.txt` stores poses.
    pub pose_convention: PoseConvention,
    /// Integrate at most this many frames (if `None`, all of them).
    pub max_frames: Option<usize>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
            depth_scale: DEFAULT_DEPTH_SCALE,
            pose_convention: PoseConvention::WorldToCamera,
            max_frames: None,
        }
    }
}

/// Summary of a reconstruction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionReport {
    pub intrinsics: PinholeIntrinsics,
    pub resolution: usize,
    pub voxel_scale: Scalar,
    pub truncation_threshold: Scalar,
    /// Number of frames integrated.
    pub frames: usize,
    /// Voxels with a non-zero weight.
    pub observed_voxels: usize,
    /// Interpolated surface samples between neighbouring observed voxels.
    pub zero_crossings: usize,
    pub per_frame: Vec<FrameStats>,
}

/// Output of [`run_reconstruction`].
#[derive(Debug)]
pub struct Reconstruction {
    pub volume: TsdfVolume,
    pub report: FusionReport,
}

/// Open the dataset at `root` and fuse its frames.
pub fn run_reconstruction(root: &Path, config: &ReconstructionConfig) -> Result<Reconstruction> {
    let dataset = Dataset::open(root, config.depth_scale, config.pose_convention)?;
    let mut volume = TsdfVolume::new(config.fusion, *dataset.intrinsics())
        .context("failed to allocate the voxel grid")?;

    let count = match config.max_frames {
        Some(max) => max.min(dataset.frame_count()),
        None => dataset.frame_count(),
    };
    let frames = (1..=count).map(|idx| {
        dataset
            .frame(idx)
            .with_context(|| format!("failed to load frame {idx}"))
    });
    let per_frame = integrate_frames(&mut volume, frames)?;

    let report = summarize(&volume, per_frame);
    Ok(Reconstruction { volume, report })
}

/// Integrate a sequence of `(depth, world-to-camera pose)` frames in order.
///
/// Stops at the first frame that fails to load or integrate; the volume
/// keeps every frame fused before it.
pub fn integrate_frames<I>(volume: &mut TsdfVolume, frames: I) -> Result<Vec<FrameStats>>
where
    I: IntoIterator<Item = Result<(DepthMap, Iso3)>>,
{
    let mut stats = Vec::new();
    for (pos, frame) in frames.into_iter().enumerate() {
        let (depth, pose) = frame?;
        let frame_stats = volume
            .integrate(&depth, &pose)
            .with_context(|| format!("failed to integrate frame {}", pos + 1))?;
        if frame_stats.fused == 0 {
            warn!(
                "frame {}: no voxel fell inside the truncation band",
                pos + 1
            );
        }
        stats.push(frame_stats);
    }
    Ok(stats)
}

/// Build the report for the current state of `volume`.
pub fn summarize(volume: &TsdfVolume, per_frame: Vec<FrameStats>) -> FusionReport {
    let grid = volume.grid();
    let report = FusionReport {
        intrinsics: *volume.intrinsics(),
        resolution: grid.resolution(),
        voxel_scale: grid.voxel_scale(),
        truncation_threshold: volume.config().truncation_threshold,
        frames: volume.frames_integrated(),
        observed_voxels: grid.observed_count(),
        zero_crossings: grid.zero_crossings().len(),
        per_frame,
    };
    info!(
        "fused {} frames: {} observed voxels, {} zero crossings",
        report.frames, report.observed_voxels, report.zero_crossings
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: ReconstructionConfig =
            serde_json::from_str(r#"{"fusion": {"resolution": 32}, "max_frames": 5}"#).unwrap();
        assert_eq!(config.fusion.resolution, 32);
        assert_eq!(config.fusion.voxel_scale, FusionConfig::default().voxel_scale);
        assert_eq!(config.depth_scale, DEFAULT_DEPTH_SCALE);
        assert_eq!(config.pose_convention, PoseConvention::WorldToCamera);
        assert_eq!(config.max_frames, Some(5));
    }

    #[test]
    fn pose_convention_uses_snake_case() {
        let config: ReconstructionConfig =
            serde_json::from_str(r#"{"pose_convention": "camera_to_world"}"#).unwrap();
        assert_eq!(config.pose_convention, PoseConvention::CameraToWorld);
    }

    #[test]
    fn integrate_frames_stops_at_first_error() {
        let k = PinholeIntrinsics::new(10.0, 4.5, 4.5).with_image_size(10, 10);
        let config = FusionConfig {
            resolution: 4,
            voxel_scale: 0.25,
            ..FusionConfig::default()
        };
        let mut volume = TsdfVolume::new(config, k).unwrap();
        let frames = vec![
            Ok((DepthMap::filled(10, 10, 0.5), Iso3::identity())),
            Err(anyhow::anyhow!("unreadable")),
            Ok((DepthMap::filled(10, 10, 0.5), Iso3::identity())),
        ];
        assert!(integrate_frames(&mut volume, frames).is_err());
        assert_eq!(volume.frames_integrated(), 1);
    }
}
