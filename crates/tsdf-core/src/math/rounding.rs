//! Conversion from continuous image coordinates to integer pixel indices.
//!
//! Pixel coordinates are rounded half-to-even (NumPy's `round`). A pixel
//! centre sits on integer coordinates, so `u = 2.5` maps to column `2`.

use crate::{Pt2, Real};

/// Integer pixel coordinate `(u, v)` = `(column, row)`.
///
/// Values are signed: projections left of or above the image are legal and
/// are rejected later by bounds checks, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelIndex {
    /// Column index.
    pub u: i64,
    /// Row index.
    pub v: i64,
}

impl PixelIndex {
    /// Returns `(row, col)` if the pixel lies inside `[0, width) x [0, height)`.
    #[inline]
    pub fn in_bounds(&self, width: usize, height: usize) -> Option<(usize, usize)> {
        let (u, v) = (self.u, self.v);
        if u < 0 || v < 0 {
            return None;
        }
        let (col, row) = (u as usize, v as usize);
        (col < width && row < height).then_some((row, col))
    }
}

/// Round a continuous pixel coordinate to the nearest integer pixel.
///
/// Returns `None` for non-finite input or coordinates outside the `i64`
/// range, so a degenerate projection can never alias a valid pixel.
#[inline]
pub fn round_to_pixel(p: &Pt2) -> Option<PixelIndex> {
    let u = round_component(p.x)?;
    let v = round_component(p.y)?;
    Some(PixelIndex { u, v })
}

#[inline]
fn round_component(x: Real) -> Option<i64> {
    if !x.is_finite() {
        return None;
    }
    let r = x.round_ties_even();
    // i64::MAX is not exactly representable; stay strictly inside.
    if r <= i64::MIN as Real || r >= i64::MAX as Real {
        return None;
    }
    Some(r as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_to_even() {
        let p = round_to_pixel(&Pt2::new(2.5, 3.5)).unwrap();
        assert_eq!(p, PixelIndex { u: 2, v: 4 });
        let p = round_to_pixel(&Pt2::new(-0.5, 0.49)).unwrap();
        assert_eq!(p, PixelIndex { u: 0, v: 0 });
    }

    #[test]
    fn rejects_non_finite() {
        assert!(round_to_pixel(&Pt2::new(Real::INFINITY, 0.0)).is_none());
        assert!(round_to_pixel(&Pt2::new(0.0, Real::NAN)).is_none());
        assert!(round_to_pixel(&Pt2::new(1e300, 0.0)).is_none());
    }

    #[test]
    fn bounds_are_half_open() {
        let w = 4;
        let h = 3;
        assert_eq!(PixelIndex { u: 0, v: 0 }.in_bounds(w, h), Some((0, 0)));
        assert_eq!(PixelIndex { u: 3, v: 2 }.in_bounds(w, h), Some((2, 3)));
        assert_eq!(PixelIndex { u: 4, v: 0 }.in_bounds(w, h), None);
        assert_eq!(PixelIndex { u: 0, v: 3 }.in_bounds(w, h), None);
        assert_eq!(PixelIndex { u: -1, v: 0 }.in_bounds(w, h), None);
        assert_eq!(PixelIndex { u: 0, v: -1 }.in_bounds(w, h), None);
    }
}
