//! Truncated signed distance (TSDF) fusion of depth maps.
//!
//! A [`TsdfVolume`] owns a dense cubic [`VoxelGrid`] and fuses one depth map
//! per call to [`TsdfVolume::integrate`]. Each call runs three stages over
//! every voxel:
//!
//! 1. [`Projector`]: voxel centre → camera frame → rounded pixel.
//! 2. [`DepthValidator`]: image-bounds mask and depth lookup (with the
//!    max-depth clamp).
//! 3. [`FusionUpdater`]: truncated signed distance and unit-weight running
//!    average.
//!
//! The stages are data-parallel over voxels (via `rayon`) and produce the same
//! result as a sequential voxel-by-voxel evaluation.
//!
//! Poses passed to `integrate` map grid (world) coordinates into the camera
//! frame. Sources that store camera-to-world poses must be inverted first,
//! see [`tsdf_core::PoseConvention`].
//!
//! The fused `tsdf`/`weight` buffers are the output of this crate; surface
//! extraction is left to downstream consumers.

mod config;
mod error;
mod grid;
mod projector;
mod updater;
mod validator;
mod volume;

pub use config::{FusionConfig, DEFAULT_MAX_GRID_BYTES, DEFAULT_VOXEL_SCALE};
pub use error::FusionError;
pub use grid::{GridSnapshot, VoxelGrid, Weight, TSDF_UNOBSERVED};
pub use projector::{ProjectedVoxels, Projector};
pub use updater::{FusionUpdater, UpdateStats};
pub use validator::{DepthValidator, ValidDepths};
pub use volume::{FrameStats, TsdfVolume};
