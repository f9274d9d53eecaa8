use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::{from_homogeneous, round_to_pixel, Mat3, PixelIndex, Pt2, Pt3, Real};

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

/// Square-pixel pinhole intrinsics.
///
/// The corresponding calibration matrix `K` has the form:
///
/// ```text
/// [ f  0  cx ]
/// [ 0  f  cy ]
/// [ 0  0   1 ]
/// ```
///
/// `image_size` is optional; when present, depth maps fused with these
/// intrinsics must have exactly that size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinholeIntrinsics {
    /// Focal length in pixels (shared by both axes).
    pub f: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
    /// Image size the intrinsics were calibrated for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
}

impl PinholeIntrinsics {
    pub fn new(f: Real, cx: Real, cy: Real) -> Self {
        Self {
            f,
            cx,
            cy,
            image_size: None,
        }
    }

    /// Attach the calibrated image size.
    pub fn with_image_size(mut self, width: usize, height: usize) -> Self {
        self.image_size = Some(ImageSize { width, height });
        self
    }

    /// Check that the parameters describe a usable camera.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.f.is_finite() && self.f > 0.0) {
            return Err(ModelError::InvalidIntrinsics(format!(
                "focal length must be positive and finite, got {}",
                self.f
            )));
        }
        if !(self.cx.is_finite() && self.cy.is_finite()) {
            return Err(ModelError::InvalidIntrinsics(format!(
                "principal point must be finite, got ({}, {})",
                self.cx, self.cy
            )));
        }
        if let Some(size) = self.image_size {
            if size.width == 0 || size.height == 0 {
                return Err(ModelError::InvalidIntrinsics(format!(
                    "image size must be non-empty, got {}x{}",
                    size.width, size.height
                )));
            }
        }
        Ok(())
    }

    /// Build the 3×3 calibration matrix `K`.
    pub fn k_matrix(&self) -> Mat3 {
        Mat3::new(self.f, 0.0, self.cx, 0.0, self.f, self.cy, 0.0, 0.0, 1.0)
    }

    /// Construct intrinsics from a 3×3 calibration matrix `K`.
    ///
    /// The matrix is normalised so that `K[2, 2] == 1` and then checked
    /// against the square-pixel, zero-skew form within a small tolerance.
    pub fn try_from_k_matrix(k: &Mat3) -> Result<Self, ModelError> {
        let eps = 1e-9;
        let k33 = k[(2, 2)];
        if !k33.is_finite() || k33.abs() < eps {
            return Err(ModelError::InvalidIntrinsics(format!(
                "K[2,2] must be non-zero, got {k33}"
            )));
        }
        let k = k / k33;

        if k[(1, 0)].abs() > eps || k[(2, 0)].abs() > eps || k[(2, 1)].abs() > eps {
            return Err(ModelError::InvalidIntrinsics(
                "K must be upper triangular with last row [0 0 1]".to_string(),
            ));
        }
        if k[(0, 1)].abs() > eps {
            return Err(ModelError::InvalidIntrinsics(format!(
                "non-zero skew {} is not supported",
                k[(0, 1)]
            )));
        }
        let (fx, fy) = (k[(0, 0)], k[(1, 1)]);
        if (fx - fy).abs() > eps * fx.abs().max(1.0) {
            return Err(ModelError::InvalidIntrinsics(format!(
                "square pixels required, got fx={fx} fy={fy}"
            )));
        }

        let intrinsics = Self::new(fx, k[(0, 2)], k[(1, 2)]);
        intrinsics.validate()?;
        Ok(intrinsics)
    }

    /// Project a camera-frame point to continuous pixel coordinates.
    ///
    /// Returns `None` if the point is on or behind the image plane.
    pub fn project_point(&self, p_c: &Pt3) -> Option<Pt2> {
        if !(p_c.z > 0.0) {
            return None;
        }
        from_homogeneous(&(self.k_matrix() * p_c.coords))
    }

    /// Project a camera-frame point to an integer pixel index.
    pub fn project(&self, p_c: &Pt3) -> Option<PixelIndex> {
        self.project_point(p_c).as_ref().and_then(round_to_pixel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_matrix_roundtrip() {
        let k = PinholeIntrinsics::new(525.0, 319.5, 239.5);
        let back = PinholeIntrinsics::try_from_k_matrix(&k.k_matrix()).unwrap();
        assert_eq!(back, k);
    }

    #[test]
    fn scaled_k_matrix_is_normalised() {
        let k = PinholeIntrinsics::new(500.0, 320.0, 240.0).k_matrix() * 2.0;
        let back = PinholeIntrinsics::try_from_k_matrix(&k).unwrap();
        assert!((back.f - 500.0).abs() < 1e-12);
        assert!((back.cx - 320.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_square_pixels_and_skew() {
        let k = Mat3::new(500.0, 0.0, 320.0, 0.0, 510.0, 240.0, 0.0, 0.0, 1.0);
        assert!(PinholeIntrinsics::try_from_k_matrix(&k).is_err());

        let k = Mat3::new(500.0, 1.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0);
        assert!(PinholeIntrinsics::try_from_k_matrix(&k).is_err());
    }

    #[test]
    fn validate_rejects_bad_focal_length() {
        assert!(PinholeIntrinsics::new(0.0, 1.0, 1.0).validate().is_err());
        assert!(PinholeIntrinsics::new(-3.0, 1.0, 1.0).validate().is_err());
        assert!(PinholeIntrinsics::new(Real::NAN, 1.0, 1.0).validate().is_err());
        assert!(PinholeIntrinsics::new(10.0, 1.0, 1.0)
            .with_image_size(0, 10)
            .validate()
            .is_err());
    }

    #[test]
    fn principal_point_projects_to_centre() {
        let k = PinholeIntrinsics::new(100.0, 32.0, 24.0);
        let px = k.project(&Pt3::new(0.0, 0.0, 2.0)).unwrap();
        assert_eq!(px, PixelIndex { u: 32, v: 24 });

        let px = k.project_point(&Pt3::new(0.1, -0.2, 1.0)).unwrap();
        assert!((px.x - 42.0).abs() < 1e-12);
        assert!((px.y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        let k = PinholeIntrinsics::new(100.0, 32.0, 24.0);
        assert!(k.project(&Pt3::new(0.0, 0.0, 0.0)).is_none());
        assert!(k.project(&Pt3::new(0.1, 0.1, -1.0)).is_none());
    }

    #[test]
    fn image_size_is_optional_in_json() {
        let k: PinholeIntrinsics =
            serde_json::from_str(r#"{"f": 500.0, "cx": 320.0, "cy": 240.0}"#).unwrap();
        assert!(k.image_size.is_none());
        let json = serde_json::to_string(&k.with_image_size(640, 480)).unwrap();
        assert!(json.contains("\"width\":640"));
    }
}
