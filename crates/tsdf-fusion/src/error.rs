use thiserror::Error;
use tsdf_core::ModelError;

/// Errors that can occur while building a volume or integrating a frame.
///
/// All of them are raised before the grid is touched, so a failed call
/// leaves the volume exactly as it was.
#[derive(Debug, Error)]
pub enum FusionError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The dense grid would not fit in the configured memory budget.
    #[error("grid of resolution {resolution}^3 needs more than {limit} bytes")]
    GridTooLarge { resolution: usize, limit: u64 },
    /// The depth map size differs from the size the intrinsics were built for.
    #[error("depth map is {width}x{height}, intrinsics expect {expected_width}x{expected_height}")]
    DepthShapeMismatch {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
    /// Per-voxel buffers passed between stages disagree in length.
    #[error("{what}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Intrinsics, pose or depth input rejected by the camera model.
    #[error(transparent)]
    Model(#[from] ModelError),
}
