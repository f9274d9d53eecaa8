//! Write a synthetic plane dataset, reconstruct it and print the report.
//!
//! ```text
//! cargo run -p tsdf --example synthetic_plane
//! ```

use anyhow::Result;
use log::info;
use tsdf::core::synthetic::noise::UniformDepthNoise;
use tsdf::core::synthetic::scene::{orbit_poses, render_plane_depth, Plane};
use tsdf::prelude::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let intrinsics = PinholeIntrinsics::new(120.0, 79.5, 59.5).with_image_size(160, 120);
    let plane = Plane::new(Vec3::z(), 0.6);
    let noise = UniformDepthNoise {
        seed: 7,
        max_abs: 0.003,
    };

    let mut frames = Vec::new();
    for (idx, pose) in orbit_poses(8, Pt3::new(0.5, 0.5, 0.6), 0.15, 0.9)
        .into_iter()
        .enumerate()
    {
        let mut depth = render_plane_depth(&intrinsics, &pose, &plane)?;
        noise.apply(idx, &mut depth);
        frames.push((depth, pose));
    }

    let dir = tempfile::tempdir()?;
    tsdf::io::write_dataset(dir.path(), &intrinsics, &frames)?;
    info!("synthetic dataset in {}", dir.path().display());

    let config = ReconstructionConfig {
        fusion: FusionConfig {
            resolution: 64,
            voxel_scale: 1.0 / 64.0,
            truncation_threshold: 0.05,
            ..FusionConfig::default()
        },
        depth_scale: 1.0,
        ..ReconstructionConfig::default()
    };
    let run = run_reconstruction(dir.path(), &config)?;

    let crossings = run.volume.grid().zero_crossings();
    let mean_err = crossings
        .iter()
        .map(|p| (p.z as Real - plane.offset).abs())
        .sum::<Real>()
        / crossings.len().max(1) as Real;
    println!(
        "{} frames, {} observed voxels, {} surface samples, mean |z - plane| = {:.4} m",
        run.report.frames,
        run.report.observed_voxels,
        crossings.len(),
        mean_err
    );
    Ok(())
}
