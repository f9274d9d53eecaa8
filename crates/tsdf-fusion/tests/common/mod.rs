//! Shared fixtures for fusion integration tests.
#![allow(dead_code)]

use tsdf_core::synthetic::scene::{render_plane_depth, Plane};
use tsdf_core::{DepthMap, Iso3, PinholeIntrinsics, Vec3};
use tsdf_fusion::{FusionConfig, TsdfVolume};

/// Unit-cube grid of `resolution³` voxels.
pub fn unit_cube_config(resolution: usize, truncation: f32) -> FusionConfig {
    FusionConfig {
        resolution,
        voxel_scale: 1.0 / resolution as f32,
        max_depth: 3.0,
        truncation_threshold: truncation,
        ..FusionConfig::default()
    }
}

pub fn camera() -> PinholeIntrinsics {
    PinholeIntrinsics::new(50.0, 31.5, 23.5).with_image_size(64, 48)
}

pub fn volume(config: FusionConfig) -> TsdfVolume {
    TsdfVolume::new(config, camera()).expect("valid test volume")
}

/// World plane `z = height`, facing the cameras.
pub fn horizontal_plane(height: f64) -> Plane {
    Plane::new(Vec3::z(), height)
}

pub fn render(plane: &Plane, pose: &Iso3) -> DepthMap {
    render_plane_depth(&camera(), pose, plane).expect("render")
}
