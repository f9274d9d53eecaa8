//! Loaders for the inputs of a reconstruction run and writers for its output.
//!
//! - [`colmap`]: camera intrinsics (`cameras.txt`) and per-frame poses
//!   (`images.txt`) in COLMAP's text model format.
//! - [`frames`]: dataset directory layout and per-frame depth maps
//!   (`.npy` or 16-bit `.png`).
//! - [`npy`]: the NumPy array subset used for depth frames.
//! - [`export`]: JSON snapshots of the fused grid.

pub mod colmap;
pub mod export;
pub mod frames;
pub mod npy;

pub use colmap::{
    format_cameras, format_images, load_intrinsics, load_poses, parse_cameras, parse_images,
};
pub use export::{read_snapshot, write_snapshot};
pub use frames::{frame_stem, write_dataset, Dataset, DepthFormat};
