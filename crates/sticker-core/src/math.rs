use serde::{Deserialize, Serialize};

/// A 2D affine transform in canvas convention:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
///
/// The `*_by` builders right-multiply, so a chain reads in the same order
/// as the equivalent sequence of canvas `translate`/`rotate`/`scale` calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation by `radians`, clockwise on screen (y grows downward).
    pub fn rotate(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self * other`: `other` is applied first.
    pub fn multiply(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translate_by(self, tx: f64, ty: f64) -> Self {
        self.multiply(&Self::translate(tx, ty))
    }

    pub fn scale_by(self, sx: f64, sy: f64) -> Self {
        self.multiply(&Self::scale(sx, sy))
    }

    pub fn rotate_by(self, radians: f64) -> Self {
        self.multiply(&Self::rotate(radians))
    }

    /// Map a point through the transform.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < 1e-9 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` of the rectangle
    /// `(0, 0, width, height)` after transformation.
    pub fn bounds(&self, width: f64, height: f64) -> (f64, f64, f64, f64) {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(width, 0.0),
            self.apply(0.0, height),
            self.apply(width, height),
        ];
        corners.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_chain_matches_canvas_order() {
        // translate(10, 0) then scale(2): a point at 1 lands at 12.
        let m = Affine::identity().translate_by(10.0, 0.0).scale_by(2.0, 2.0);
        assert!(close(m.apply(1.0, 0.0), (12.0, 0.0)));
    }

    #[test]
    fn test_pivot_scale_keeps_pivot_fixed() {
        let m = Affine::identity()
            .translate_by(50.0, 40.0)
            .scale_by(3.0, 3.0)
            .translate_by(-50.0, -40.0);
        assert!(close(m.apply(50.0, 40.0), (50.0, 40.0)));
        assert!(close(m.apply(51.0, 40.0), (53.0, 40.0)));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let m = Affine::rotate(std::f64::consts::FRAC_PI_2);
        assert!(close(m.apply(1.0, 0.0), (0.0, 1.0)));
    }

    #[test]
    fn test_invert_roundtrip() {
        let m = Affine::identity()
            .translate_by(5.0, -3.0)
            .rotate_by(0.7)
            .scale_by(1.5, 0.5);
        let inv = m.invert().unwrap();
        let p = m.apply(2.0, 9.0);
        assert!(close(inv.apply(p.0, p.1), (2.0, 9.0)));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_bounds_of_translated_rect() {
        let (x0, y0, x1, y1) = Affine::translate(2.0, 3.0).bounds(4.0, 5.0);
        assert_eq!((x0, y0, x1, y1), (2.0, 3.0, 6.0, 8.0));
    }
}
