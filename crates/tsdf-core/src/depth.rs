//! Owned single-channel depth image in row-major layout.
//!
//! Values are in arbitrary (not necessarily metric) units shared with the
//! pose translations. Samples `<= 0` or non-finite mean "no depth".

use crate::{ModelError, Scalar};

#[derive(Clone, Debug, PartialEq)]
pub struct DepthMap {
    width: usize,
    height: usize,
    data: Vec<Scalar>,
}

impl DepthMap {
    /// Construct a zero-filled (fully invalid) depth map of size `width × height`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Construct a depth map filled with a constant value.
    pub fn filled(width: usize, height: usize, value: Scalar) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap a row-major buffer. The buffer length must equal `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<Scalar>) -> Result<Self, ModelError> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(ModelError::InvalidDepthMap {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Depth sample at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Scalar {
        assert!(col < self.width, "column {col} out of bounds");
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Scalar) {
        assert!(col < self.width, "column {col} out of bounds");
        self.data[row * self.width + col] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Scalar] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Scalar] {
        &mut self.data
    }

    /// Number of samples that carry a usable depth (`> 0` and finite).
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|d| d.is_finite() && **d > 0.0).count()
    }
}
