//! Truncated signed distance computation and running-average merge.

use nalgebra::Point3;
use rayon::prelude::*;
use tsdf_core::Scalar;

use crate::{FusionError, VoxelGrid, Weight};

/// Outcome of merging one frame into the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Voxels whose value and weight were updated.
    pub fused: usize,
    /// Fused voxels whose weight was already at [`Weight::MAX`].
    pub saturated: usize,
}

/// Computes per-voxel TSDF samples and blends them into the grid.
///
/// Sign convention: positive values lie between the camera and the observed
/// surface (free space), negative values behind it.
#[derive(Clone, Copy, Debug)]
pub struct FusionUpdater {
    truncation: Scalar,
}

impl FusionUpdater {
    pub fn new(truncation_threshold: Scalar) -> Self {
        Self {
            truncation: truncation_threshold,
        }
    }

    pub fn truncation_threshold(&self) -> Scalar {
        self.truncation
    }

    /// Normalised TSDF sample for a voxel at camera depth `z` seen at depth `d`.
    ///
    /// Returns `None` unless `d > 0` and `|d - z| < truncation`.
    #[inline]
    pub fn tsdf_sample(&self, d: Scalar, z: Scalar) -> Option<Scalar> {
        if !(d > 0.0) {
            return None;
        }
        let sdf = d - z;
        (sdf > -self.truncation && sdf < self.truncation).then(|| sdf / self.truncation)
    }

    /// Merge the samples of the masked voxels into `grid`.
    ///
    /// `camera_points` and `mask` are indexed like the grid; `depths` holds one
    /// sample per `true` entry of `mask`, in voxel order.
    pub fn update(
        &self,
        grid: &mut VoxelGrid,
        camera_points: &[Point3<Scalar>],
        mask: &[bool],
        depths: &[Scalar],
    ) -> Result<UpdateStats, FusionError> {
        check_len("camera points", grid.len(), camera_points.len())?;
        check_len("mask", grid.len(), mask.len())?;
        let masked = mask.par_iter().filter(|m| **m).count();
        check_len("masked depths", masked, depths.len())?;

        let mut samples: Vec<Option<Scalar>> = vec![None; grid.len()];
        let masked_voxels = mask
            .iter()
            .enumerate()
            .filter_map(|(voxel, m)| m.then_some(voxel));
        for (voxel, &d) in masked_voxels.zip(depths) {
            samples[voxel] = self.tsdf_sample(d, camera_points[voxel].z);
        }

        let (tsdf, weight) = grid.values_mut();
        let (fused, saturated) = tsdf
            .par_iter_mut()
            .zip(weight.par_iter_mut())
            .zip(samples.par_iter())
            .filter_map(|((t, w), s)| s.map(|s| merge(t, w, s)))
            .fold(
                || (0usize, 0usize),
                |(fused, saturated), sat| (fused + 1, saturated + usize::from(sat)),
            )
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        Ok(UpdateStats { fused, saturated })
    }
}

/// Unit-weight incremental mean. Returns `true` if the weight was saturated.
///
/// A saturated weight stays at `Weight::MAX` and keeps blending new samples
/// with that fixed weight instead of wrapping.
#[inline]
fn merge(tsdf: &mut Scalar, weight: &mut Weight, sample: Scalar) -> bool {
    let w_old = *weight as Scalar;
    *tsdf = (w_old * *tsdf + sample) / (w_old + 1.0);
    match weight.checked_add(1) {
        Some(w) => {
            *weight = w;
            false
        }
        None => true,
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), FusionError> {
    if expected == actual {
        Ok(())
    } else {
        Err(FusionError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsdf_sample_band_is_open() {
        let u = FusionUpdater::new(0.1);
        assert_eq!(u.tsdf_sample(1.0, 1.0), Some(0.0));
        assert!((u.tsdf_sample(1.0, 0.95).unwrap() - 0.5).abs() < 1e-5);
        assert!((u.tsdf_sample(1.0, 1.05).unwrap() + 0.5).abs() < 1e-5);
        assert_eq!(u.tsdf_sample(1.0, 0.8), None);
        assert_eq!(u.tsdf_sample(1.0, 1.2), None);
        assert_eq!(u.tsdf_sample(0.0, 0.0), None);
        assert_eq!(u.tsdf_sample(-1.0, -1.0), None);
        assert_eq!(u.tsdf_sample(Scalar::NAN, 1.0), None);
    }

    #[test]
    fn merge_is_a_running_mean() {
        let (mut t, mut w) = (1.0, 0);
        merge(&mut t, &mut w, 0.5);
        assert_eq!((t, w), (0.5, 1));
        merge(&mut t, &mut w, -0.5);
        assert_eq!((t, w), (0.0, 2));
        merge(&mut t, &mut w, 0.3);
        assert!((t - 0.1).abs() < 1e-6);
        assert_eq!(w, 3);
    }

    #[test]
    fn merge_saturates_instead_of_wrapping() {
        let (mut t, mut w) = (0.0, Weight::MAX);
        assert!(merge(&mut t, &mut w, 1.0));
        assert_eq!(w, Weight::MAX);
        assert!(t > 0.0 && t < 1e-4);
    }

    #[test]
    fn update_touches_only_accepted_voxels() {
        let mut grid = VoxelGrid::new(2, 1.0).unwrap();
        let n = grid.len();
        let camera_points = vec![Point3::new(0.0, 0.0, 1.0); n];
        let mut mask = vec![false; n];
        mask[1] = true;
        mask[3] = true;
        mask[6] = true;
        // voxel 1 accepted, 3 outside the band, 6 invalid depth
        let depths = [1.05, 2.0, 0.0];

        let stats = FusionUpdater::new(0.1)
            .update(&mut grid, &camera_points, &mask, &depths)
            .unwrap();
        assert_eq!(stats, UpdateStats { fused: 1, saturated: 0 });
        assert_eq!(grid.weights()[1], 1);
        assert!((grid.tsdf()[1] - 0.5).abs() < 1e-5);
        for i in [0, 2, 3, 4, 5, 6, 7] {
            assert_eq!(grid.weights()[i], 0);
            assert_eq!(grid.tsdf()[i], 1.0);
        }
    }

    #[test]
    fn update_rejects_mismatched_buffers() {
        let mut grid = VoxelGrid::new(2, 1.0).unwrap();
        let n = grid.len();
        let points = vec![Point3::origin(); n];
        let updater = FusionUpdater::new(0.1);

        let err = updater
            .update(&mut grid, &points[..3], &vec![false; n], &[])
            .unwrap_err();
        assert!(matches!(err, FusionError::LengthMismatch { .. }));

        let err = updater
            .update(&mut grid, &points, &vec![true; n], &[1.0])
            .unwrap_err();
        assert!(matches!(
            err,
            FusionError::LengthMismatch {
                expected: 8,
                actual: 1,
                ..
            }
        ));
        assert_eq!(grid.observed_count(), 0);
    }
}
