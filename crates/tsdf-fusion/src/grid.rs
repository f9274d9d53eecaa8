//! Dense cubic voxel grid.
//!
//! All per-voxel state lives in flat buffers of length `R³` indexed by
//! `i = x·R² + y·R + z`.

use std::mem;

use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tsdf_core::Scalar;

use crate::FusionError;

/// Per-voxel integration weight (count of fused observations).
pub type Weight = u16;

/// Value of `tsdf` for voxels that were never observed.
pub const TSDF_UNOBSERVED: Scalar = 1.0;

/// Resident bytes per voxel: tsdf + weight + precomputed centre.
const BYTES_PER_VOXEL: u64 =
    (mem::size_of::<Scalar>() + mem::size_of::<Weight>() + mem::size_of::<Point3<Scalar>>()) as u64;

/// Dense TSDF and weight storage together with the voxel centres.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    resolution: usize,
    voxel_scale: Scalar,
    tsdf: Vec<Scalar>,
    weight: Vec<Weight>,
    centers: Vec<Point3<Scalar>>,
}

impl VoxelGrid {
    /// Allocate a `resolution³` grid of unobserved voxels.
    ///
    /// Voxel `(x, y, z)` has its centre at `((x, y, z) + 0.5) * voxel_scale`.
    pub fn new(resolution: usize, voxel_scale: Scalar) -> Result<Self, FusionError> {
        if resolution == 0 {
            return Err(FusionError::InvalidConfig(
                "resolution must be positive".to_string(),
            ));
        }
        if !(voxel_scale.is_finite() && voxel_scale > 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "voxel_scale must be positive and finite, got {voxel_scale}"
            )));
        }
        let len = resolution
            .checked_mul(resolution)
            .and_then(|r2| r2.checked_mul(resolution))
            .ok_or(FusionError::GridTooLarge {
                resolution,
                limit: u64::MAX,
            })?;

        let centers = (0..len)
            .into_par_iter()
            .map(|i| {
                let [x, y, z] = lattice_of(i, resolution);
                Point3::new(
                    (x as Scalar + 0.5) * voxel_scale,
                    (y as Scalar + 0.5) * voxel_scale,
                    (z as Scalar + 0.5) * voxel_scale,
                )
            })
            .collect();

        Ok(Self {
            resolution,
            voxel_scale,
            tsdf: vec![TSDF_UNOBSERVED; len],
            weight: vec![0; len],
            centers,
        })
    }

    /// Bytes needed to hold a grid of the given resolution, `None` on overflow.
    pub fn required_bytes(resolution: usize) -> Option<u64> {
        let r = u64::try_from(resolution).ok()?;
        r.checked_mul(r)?.checked_mul(r)?.checked_mul(BYTES_PER_VOXEL)
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn voxel_scale(&self) -> Scalar {
        self.voxel_scale
    }

    /// Total number of voxels, `R³`.
    #[inline]
    pub fn len(&self) -> usize {
        self.tsdf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tsdf.is_empty()
    }

    /// Flat index of lattice coordinate `(x, y, z)`.
    #[inline]
    pub fn flat_index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.resolution && y < self.resolution && z < self.resolution);
        (x * self.resolution + y) * self.resolution + z
    }

    /// Lattice coordinate `[x, y, z]` of flat index `i`.
    #[inline]
    pub fn lattice_index(&self, i: usize) -> [usize; 3] {
        lattice_of(i, self.resolution)
    }

    /// Iterator over the lattice coordinates of every voxel, in flat order.
    pub fn lattice_indices(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.len()).map(|i| self.lattice_index(i))
    }

    #[inline]
    pub fn tsdf(&self) -> &[Scalar] {
        &self.tsdf
    }

    #[inline]
    pub fn weights(&self) -> &[Weight] {
        &self.weight
    }

    /// Voxel centres in the grid (world) frame.
    #[inline]
    pub fn centers(&self) -> &[Point3<Scalar>] {
        &self.centers
    }

    #[inline]
    pub fn tsdf_at(&self, x: usize, y: usize, z: usize) -> Scalar {
        self.tsdf[self.flat_index(x, y, z)]
    }

    #[inline]
    pub fn weight_at(&self, x: usize, y: usize, z: usize) -> Weight {
        self.weight[self.flat_index(x, y, z)]
    }

    /// Number of voxels with at least one fused observation.
    pub fn observed_count(&self) -> usize {
        self.weight.par_iter().filter(|w| **w > 0).count()
    }

    /// Interpolated positions where the TSDF changes sign between two
    /// observed, axis-adjacent voxels.
    ///
    /// For an edge between centres `a` and `b` with values `ta > 0 >= tb`
    /// (or vice versa) the point is `a + (b - a) * ta / (ta - tb)`.
    pub fn zero_crossings(&self) -> Vec<Point3<Scalar>> {
        let r = self.resolution;
        (0..self.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let [x, y, z] = self.lattice_index(i);
                let neighbours = [
                    (x + 1 < r).then(|| i + r * r),
                    (y + 1 < r).then(|| i + r),
                    (z + 1 < r).then(|| i + 1),
                ];
                neighbours
                    .into_iter()
                    .flatten()
                    .filter_map(move |j| self.crossing_between(i, j))
            })
            .collect()
    }

    fn crossing_between(&self, i: usize, j: usize) -> Option<Point3<Scalar>> {
        if self.weight[i] == 0 || self.weight[j] == 0 {
            return None;
        }
        let (ta, tb) = (self.tsdf[i], self.tsdf[j]);
        if (ta > 0.0) == (tb > 0.0) {
            return None;
        }
        let s = ta / (ta - tb);
        let (a, b) = (self.centers[i], self.centers[j]);
        Some(a + (b - a) * s)
    }

    /// Mutable access to the tsdf and weight buffers for the fusion stage.
    pub(crate) fn values_mut(&mut self) -> (&mut [Scalar], &mut [Weight]) {
        (&mut self.tsdf, &mut self.weight)
    }

    /// Consume the grid, returning the `tsdf` and `weight` buffers.
    pub fn into_parts(self) -> (Vec<Scalar>, Vec<Weight>) {
        (self.tsdf, self.weight)
    }
}

/// Serializable copy of the fused grid, handed to downstream consumers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub resolution: usize,
    pub voxel_scale: Scalar,
    pub truncation_threshold: Scalar,
    pub frames_integrated: usize,
    /// Flat `R³` buffer, `i = x·R² + y·R + z`.
    pub tsdf: Vec<Scalar>,
    /// Flat `R³` buffer, same layout as `tsdf`.
    pub weight: Vec<Weight>,
}

#[inline]
fn lattice_of(i: usize, r: usize) -> [usize; 3] {
    [i / (r * r), (i / r) % r, i % r]
}
