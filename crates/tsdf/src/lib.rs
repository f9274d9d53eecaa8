//! High-level entry crate for `tsdf-rs`.
//!
//! Fuses a sequence of depth maps, each with a world-to-camera pose, into a
//! dense truncated signed distance grid.
//!
//! ## Fusing frames directly
//!
//! ```no_run
//! use tsdf::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let intrinsics = PinholeIntrinsics::new(525.0, 319.5, 239.5).with_image_size(640, 480);
//! let mut volume = TsdfVolume::new(FusionConfig::default(), intrinsics)?;
//!
//! let depth = DepthMap::filled(640, 480, 1.2);
//! let stats = volume.integrate(&depth, &Iso3::identity())?;
//! println!("fused {} voxels", stats.fused);
//! # Ok(())
//! # }
//! ```
//!
//! ## Reconstructing a dataset directory
//!
//! ```no_run
//! use tsdf::pipeline::{run_reconstruction, ReconstructionConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let run = run_reconstruction("data/scene".as_ref(), &ReconstructionConfig::default())?;
//! println!("{} observed voxels", run.report.observed_voxels);
//! tsdf::io::write_snapshot("grid.json".as_ref(), &run.volume.snapshot())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: math types, intrinsics, poses, depth maps, synthetic scenes
//! - **[`fusion`]**: voxel grid and the per-frame integration stages
//! - **[`io`]**: COLMAP models, depth frames, grid export
//! - **[`pipeline`]**: dataset-level runs and reports
//! - **[`prelude`]**: convenient re-exports

/// Math types, camera model, poses and depth maps.
pub mod core {
    pub use tsdf_core::*;
}

/// Voxel grid, projection, depth validation and the running-average update.
pub mod fusion {
    pub use tsdf_fusion::*;
}

/// Dataset loaders and grid export.
pub mod io {
    pub use tsdf_io::*;
}

/// Whole-dataset reconstruction runs.
pub mod pipeline {
    pub use tsdf_pipeline::*;
}

/// Import with `use tsdf::prelude::*;`.
pub mod prelude {
    pub use crate::core::{
        DepthMap, Iso3, PinholeIntrinsics, PoseConvention, Pt3, Real, Scalar, Vec3,
    };
    pub use crate::fusion::{
        FrameStats, FusionConfig, FusionError, GridSnapshot, TsdfVolume, VoxelGrid,
    };
    pub use crate::io::Dataset;
    pub use crate::pipeline::{
        run_reconstruction, FusionReport, Reconstruction, ReconstructionConfig,
    };
}
