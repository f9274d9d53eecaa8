use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tsdf_core::{PoseConvention, Scalar};
use tsdf_fusion::FusionConfig;
use tsdf_pipeline::{run_reconstruction, FusionReport, ReconstructionConfig, DEFAULT_DEPTH_SCALE};

/// Fuse the depth frames of a dataset directory into a TSDF voxel grid.
#[derive(Debug, Parser)]
#[command(author, version, about = "TSDF depth fusion")]
struct Args {
    /// Dataset root containing cameras.txt, images.txt and depth/.
    #[arg(long)]
    dataset: PathBuf,

    /// Optional path to JSON FusionConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid side length in voxels.
    #[arg(long)]
    resolution: Option<usize>,

    /// Depth samples beyond this distance (metres) are ignored.
    #[arg(long)]
    max_depth: Option<Scalar>,

    /// Truncation band half-width in metres.
    #[arg(long)]
    truncation: Option<Scalar>,

    /// Voxel edge length in metres.
    #[arg(long)]
    voxel_scale: Option<Scalar>,

    /// Divisor converting integer depth units to metres.
    #[arg(long, default_value_t = DEFAULT_DEPTH_SCALE)]
    depth_scale: Scalar,

    /// images.txt stores camera-to-world poses instead of COLMAP's world-to-camera.
    #[arg(long)]
    camera_to_world: bool,

    /// Integrate at most this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Write the fused grid as JSON to this path.
    #[arg(long)]
    export: Option<PathBuf>,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

fn build_config(args: &Args) -> Result<ReconstructionConfig> {
    let mut fusion = match &args.config {
        Some(path) => load_json_file::<FusionConfig>(path)?,
        None => FusionConfig::default(),
    };
    if let Some(resolution) = args.resolution {
        fusion.resolution = resolution;
    }
    if let Some(max_depth) = args.max_depth {
        fusion.max_depth = max_depth;
    }
    if let Some(truncation) = args.truncation {
        fusion.truncation_threshold = truncation;
    }
    if let Some(voxel_scale) = args.voxel_scale {
        fusion.voxel_scale = voxel_scale;
    }

    Ok(ReconstructionConfig {
        fusion,
        depth_scale: args.depth_scale,
        pose_convention: if args.camera_to_world {
            PoseConvention::CameraToWorld
        } else {
            PoseConvention::WorldToCamera
        },
        max_frames: args.max_frames,
    })
}

fn run_from_args(args: &Args) -> Result<FusionReport> {
    let config = build_config(args)?;
    let run = run_reconstruction(&args.dataset, &config)
        .with_context(|| format!("reconstruction of {} failed", args.dataset.display()))?;

    if let Some(path) = &args.export {
        tsdf_io::write_snapshot(path, &run.volume.snapshot())?;
    }
    Ok(run.report)
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("reconstructing {}", args.dataset.display());
    let report = run_from_args(&args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
