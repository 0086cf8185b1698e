use nalgebra::{Matrix2, Matrix3, Matrix4, Point2, Vector2, Vector3, Vector4};
use tracing::{debug, warn};

use crate::error::{AlignError, Result};

/// A 2D coordinate in pixels, normalized UV or plane-local units
pub type Point2D = Point2<f64>;

/// Minimum landmark separation, relative to the landmarks' distance from the origin
const DEGENERACY_EPSILON: f64 = 1e-9;

/// Two landmark correspondences (e.g. left and right eye centers)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCorrespondence {
    pub source_a: Point2D,
    pub source_b: Point2D,
    pub target_a: Point2D,
    pub target_b: Point2D,
}

impl PointCorrespondence {
    pub fn new(source_a: Point2D, source_b: Point2D, target_a: Point2D, target_b: Point2D) -> Self {
        Self {
            source_a,
            source_b,
            target_a,
            target_b,
        }
    }

    /// Fit the similarity transform mapping both sources onto their targets
    pub fn fit(&self) -> Result<SimilarityTransform> {
        fit(self.source_a, self.source_b, self.target_a, self.target_b)
    }
}

/// Rotation + uniform scale + translation, without shear
///
/// Stored as `a = s·cos(r)`, `b = s·sin(r)` and `(tx, ty)`, so a point
/// `(x, y)` maps to `(a·x - b·y + tx, b·x + a·y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    pub a: f64,
    pub b: f64,
    pub tx: f64,
    pub ty: f64,
}

impl SimilarityTransform {
    pub fn new(a: f64, b: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, tx, ty }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Build from scale, CCW rotation in radians and translation
    pub fn from_parts(scale: f64, rotation: f64, translation: Vector2<f64>) -> Self {
        Self::new(
            scale * rotation.cos(),
            scale * rotation.sin(),
            translation.x,
            translation.y,
        )
    }

    /// Uniform scale factor `s`
    pub fn scale(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Rotation angle in radians, counter-clockwise positive
    pub fn rotation(&self) -> f64 {
        self.b.atan2(self.a)
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation().to_degrees()
    }

    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.tx, self.ty)
    }

    /// Pure rotation part `[[a/s, -b/s], [b/s, a/s]]`
    pub fn rotation_matrix(&self) -> Matrix2<f64> {
        let s = self.scale();
        if s == 0.0 {
            return Matrix2::identity();
        }
        Matrix2::new(
            self.a / s, -self.b / s,
            self.b / s, self.a / s,
        )
    }

    /// 3x3 homogeneous matrix
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.a, -self.b, self.tx,
            self.b, self.a, self.ty,
            0.0, 0.0, 1.0,
        )
    }

    pub fn apply(&self, point: Point2D) -> Point2D {
        apply(self, point)
    }

    /// The transform mapping targets back onto sources
    pub fn inverse(&self) -> Result<Self> {
        let norm = self.a * self.a + self.b * self.b;
        if norm == 0.0 {
            return Err(AlignError::degenerate("transform has zero scale"));
        }
        let a = self.a / norm;
        let b = -self.b / norm;
        Ok(Self::new(
            a,
            b,
            -(a * self.tx - b * self.ty),
            -(b * self.tx + a * self.ty),
        ))
    }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn compose(&self, other: &SimilarityTransform) -> Self {
        Self::new(
            self.a * other.a - self.b * other.b,
            self.a * other.b + self.b * other.a,
            self.a * other.tx - self.b * other.ty + self.tx,
            self.b * other.tx + self.a * other.ty + self.ty,
        )
    }
}

impl Default for SimilarityTransform {
    fn default() -> Self {
        Self::identity()
    }
}

fn check_finite(name: &'static str, p: &Point2D) -> Result<()> {
    if p.x.is_finite() && p.y.is_finite() {
        Ok(())
    } else {
        Err(AlignError::NonFiniteInput {
            name,
            x: p.x,
            y: p.y,
        })
    }
}

/// Fit the unique similarity transform with `target = T * source` at both points
///
/// Solves the 4x4 system
/// ```text
/// | xa  -ya  1  0 |   | a  |   | xa' |
/// | ya   xa  0  1 | * | b  | = | ya' |
/// | xb  -yb  1  0 |   | tx |   | xb' |
/// | yb   xb  0  1 |   | ty |   | yb' |
/// ```
/// by inverting the coefficient matrix.
///
/// The system is singular exactly when the two sources coincide
/// (`det = ±|source_a - source_b|²`). Sources count as coincident when their
/// separation is at most `1e-9 · max(|source_a|, |source_b|, 1)`, the point
/// where subtracting the coordinates no longer carries meaningful digits.
/// Two landmarks one unit apart are accepted anywhere below `1e9` from the
/// origin.
pub fn fit(
    source_a: Point2D,
    source_b: Point2D,
    target_a: Point2D,
    target_b: Point2D,
) -> Result<SimilarityTransform> {
    check_finite("source_a", &source_a)?;
    check_finite("source_b", &source_b)?;
    check_finite("target_a", &target_a)?;
    check_finite("target_b", &target_b)?;

    let (xa, ya) = (source_a.x, source_a.y);
    let (xb, yb) = (source_b.x, source_b.y);

    let coefficients = Matrix4::new(
        xa, -ya, 1.0, 0.0,
        ya, xa, 0.0, 1.0,
        xb, -yb, 1.0, 0.0,
        yb, xb, 0.0, 1.0,
    );
    let targets = Vector4::new(target_a.x, target_a.y, target_b.x, target_b.y);

    let separation = (source_a - source_b).norm();
    let magnitude = source_a.coords.norm().max(source_b.coords.norm()).max(1.0);
    if separation <= DEGENERACY_EPSILON * magnitude {
        warn!(separation, ?source_a, ?source_b, "source landmarks coincide");
        return Err(AlignError::degenerate(format!(
            "source points ({}, {}) and ({}, {}) are too close (separation = {:e})",
            xa, ya, xb, yb, separation
        )));
    }

    let inverse = coefficients
        .try_inverse()
        .ok_or_else(|| AlignError::degenerate("coefficient matrix is not invertible"))?;
    let t = inverse * targets;

    let transform = SimilarityTransform::new(t[0], t[1], t[2], t[3]);
    debug!(
        scale = transform.scale(),
        rotation_deg = transform.rotation_degrees(),
        tx = transform.tx,
        ty = transform.ty,
        "fitted similarity transform"
    );
    Ok(transform)
}

/// Transform a point using the homogeneous matrix
pub fn apply(transform: &SimilarityTransform, point: Point2D) -> Point2D {
    let p = transform.matrix() * Vector3::new(point.x, point.y, 1.0);
    Point2D::new(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_4;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    fn assert_point_eq(actual: Point2D, expected: Point2D, tolerance: f64) {
        assert_abs_diff_eq!(actual.x, expected.x, epsilon = tolerance);
        assert_abs_diff_eq!(actual.y, expected.y, epsilon = tolerance);
    }

    #[test]
    fn test_fit_is_exact_at_landmarks() {
        let (sa, sb) = (p(12.5, -3.0), p(-4.0, 7.25));
        let (ta, tb) = (p(100.0, 40.0), p(55.5, 91.0));
        let t = fit(sa, sb, ta, tb).unwrap();

        assert_point_eq(apply(&t, sa), ta, 1e-9);
        assert_point_eq(apply(&t, sb), tb, 1e-9);
    }

    #[test]
    fn test_identity_when_source_equals_target() {
        let (a, b) = (p(0.25, 0.75), p(0.8, 0.1));
        let t = fit(a, b, a, b).unwrap();

        assert_abs_diff_eq!(t.scale(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.rotation(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.tx, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.ty, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_recovers_known_transform() {
        let known = SimilarityTransform::from_parts(2.5, 0.6, Vector2::new(-3.0, 4.0));
        let (sa, sb) = (p(1.0, 2.0), p(-2.0, 0.5));
        let t = fit(sa, sb, known.apply(sa), known.apply(sb)).unwrap();

        assert_abs_diff_eq!(t.scale(), 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(t.rotation(), 0.6, epsilon = 1e-9);
        assert_abs_diff_eq!(t.translation(), known.translation(), epsilon = 1e-9);
    }

    #[test]
    fn test_distance_ratio_equals_scale() {
        let t = fit(p(0.0, 0.0), p(1.0, 1.0), p(3.0, -1.0), p(3.5, 2.0)).unwrap();
        let pairs = [
            (p(10.0, -4.0), p(2.0, 9.0)),
            (p(0.3, 0.3), p(-0.7, 0.1)),
            (p(-100.0, 50.0), p(75.0, 75.0)),
        ];

        for (p1, p2) in pairs {
            let before = (p1 - p2).norm();
            let after = (apply(&t, p1) - apply(&t, p2)).norm();
            assert_abs_diff_eq!(after / before, t.scale(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal() {
        let t = SimilarityTransform::from_parts(3.0, -1.1, Vector2::zeros());
        let r = t.rotation_matrix();
        assert_abs_diff_eq!(r * r.transpose(), Matrix2::identity(), epsilon = 1e-12);
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_coincident_sources() {
        let a = p(0.4, 0.6);
        let err = fit(a, a, p(0.1, 0.2), p(0.3, 0.4)).unwrap_err();
        assert!(matches!(err, AlignError::DegenerateInput { .. }));
    }

    #[test]
    fn test_rejects_nearly_coincident_sources() {
        let err = fit(p(500.0, 500.0), p(500.0, 500.0 + 1e-7), p(0.0, 0.0), p(1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, AlignError::DegenerateInput { .. }));
    }

    #[test]
    fn test_acceptance_does_not_depend_on_offset() {
        let near = fit(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 0.0), p(0.0, 2.0)).unwrap();
        let far = fit(
            p(1e5, 1e5),
            p(1e5 + 1.0, 1e5),
            p(1e5, 1e5),
            p(1e5, 1e5 + 2.0),
        )
        .unwrap();

        assert_abs_diff_eq!(far.scale(), near.scale(), epsilon = 1e-4);
        assert_abs_diff_eq!(far.rotation(), near.rotation(), epsilon = 1e-4);
    }

    #[test]
    fn test_rejects_non_finite_input() {
        let err = fit(p(0.0, 0.0), p(1.0, 0.0), p(f64::NAN, 0.0), p(1.0, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            AlignError::NonFiniteInput {
                name: "target_a",
                ..
            }
        ));
    }

    #[test]
    fn test_eye_landmarks_square_plane() {
        // Eye centers on the plane and on a photo with the same aspect ratio
        let t = fit(
            p(0.6617, 0.7678),
            p(0.3767, 0.7688),
            p(0.7144, 0.8297),
            p(0.3899, 0.8297),
        )
        .unwrap();

        assert_abs_diff_eq!(t.scale(), 1.1386, epsilon = 1e-3);
        assert_abs_diff_eq!(t.rotation(), 0.0, epsilon = 1e-2);

        let corners = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        let expected = [
            p(-0.038, -0.033),
            p(1.101, -0.03),
            p(1.098, 1.109),
            p(-0.040, 1.106),
        ];
        for (corner, gt) in corners.iter().zip(expected) {
            assert_point_eq(apply(&t, *corner), gt, 0.1);
        }
    }

    #[test]
    fn test_recovers_45_degree_rotation() {
        let t = fit(p(1.0, 0.0), p(0.0, 0.0), p(0.5, 0.5), p(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(t.rotation(), FRAC_PI_4, epsilon = 1e-9);
        assert_abs_diff_eq!(t.scale(), 0.5_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = SimilarityTransform::from_parts(0.75, 2.0, Vector2::new(5.0, -1.0));
        let inv = t.inverse().unwrap();
        let q = p(3.3, -7.1);

        assert_point_eq(inv.apply(t.apply(q)), q, 1e-9);
        let composed = inv.compose(&t);
        assert_abs_diff_eq!(composed.matrix(), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_of_zero_scale_fails() {
        let t = SimilarityTransform::new(0.0, 0.0, 1.0, 1.0);
        assert!(t.inverse().is_err());
    }

    #[test]
    fn test_correspondence_fit_matches_free_function() {
        let c = PointCorrespondence::new(p(0.0, 1.0), p(2.0, 3.0), p(1.0, 1.0), p(4.0, 2.0));
        assert_eq!(c.fit().unwrap(), fit(c.source_a, c.source_b, c.target_a, c.target_b).unwrap());
    }
}
