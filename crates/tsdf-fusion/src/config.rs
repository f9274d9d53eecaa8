//! Fusion configuration.

use serde::{Deserialize, Serialize};
use tsdf_core::Scalar;

use crate::{FusionError, VoxelGrid};

/// Default edge length of one voxel, in depth units.
pub const DEFAULT_VOXEL_SCALE: Scalar = 0.02;
/// Default memory budget for the dense grid (4 GiB).
pub const DEFAULT_MAX_GRID_BYTES: u64 = 4 << 30;

/// Parameters fixed for the lifetime of a [`crate::TsdfVolume`].
///
/// # Example
///
/// ```
/// use tsdf_fusion::FusionConfig;
///
/// let config: FusionConfig = serde_json::from_str(r#"{ "resolution": 64 }"#).unwrap();
/// assert_eq!(config.resolution, 64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Number of voxels along each axis of the cubic grid.
    pub resolution: usize,
    /// Edge length of one voxel.
    pub voxel_scale: Scalar,
    /// Depth samples beyond this value are treated as missing.
    pub max_depth: Scalar,
    /// Half-width of the band around the observed surface that is fused.
    pub truncation_threshold: Scalar,
    /// Upper bound on the resident size of the grid, in bytes.
    pub max_grid_bytes: u64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            resolution: 128,
            voxel_scale: DEFAULT_VOXEL_SCALE,
            max_depth: 3.0,
            truncation_threshold: 0.06,
            max_grid_bytes: DEFAULT_MAX_GRID_BYTES,
        }
    }
}

impl FusionConfig {
    /// Reject configurations the fusion engine cannot run with.
    pub fn validate(&self) -> Result<(), FusionError> {
        if self.resolution == 0 {
            return Err(FusionError::InvalidConfig(
                "resolution must be positive".to_string(),
            ));
        }
        check_positive("voxel_scale", self.voxel_scale)?;
        check_positive("max_depth", self.max_depth)?;
        check_positive("truncation_threshold", self.truncation_threshold)?;

        match VoxelGrid::required_bytes(self.resolution) {
            Some(bytes) if bytes <= self.max_grid_bytes => Ok(()),
            _ => Err(FusionError::GridTooLarge {
                resolution: self.resolution,
                limit: self.max_grid_bytes,
            }),
        }
    }
}

fn check_positive(name: &str, value: Scalar) -> Result<(), FusionError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FusionError::InvalidConfig(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(FusionConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let base = FusionConfig::default();
        let cases = [
            FusionConfig {
                resolution: 0,
                ..base
            },
            FusionConfig {
                voxel_scale: 0.0,
                ..base
            },
            FusionConfig {
                voxel_scale: -0.1,
                ..base
            },
            FusionConfig {
                truncation_threshold: 0.0,
                ..base
            },
            FusionConfig {
                truncation_threshold: Scalar::NAN,
                ..base
            },
            FusionConfig {
                max_depth: -1.0,
                ..base
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(FusionError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_grids_over_budget() {
        let config = FusionConfig {
            resolution: 100,
            max_grid_bytes: 1_000_000,
            ..FusionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FusionError::GridTooLarge {
                resolution: 100,
                ..
            })
        ));

        let huge = FusionConfig {
            resolution: usize::MAX,
            max_grid_bytes: u64::MAX,
            ..FusionConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(FusionError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: FusionConfig =
            serde_json::from_str(r#"{ "resolution": 32, "truncation_threshold": 0.1 }"#).unwrap();
        assert_eq!(config.resolution, 32);
        assert_eq!(config.truncation_threshold, 0.1);
        assert_eq!(config.voxel_scale, DEFAULT_VOXEL_SCALE);
    }
}
