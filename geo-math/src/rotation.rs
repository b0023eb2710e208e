//! Quaternion constructors for aligning directions and orientation frames.
//!
//! Every operation comes in two shapes: one returning a fresh [`Quaternion`]
//! and an `_into` variant that writes into a caller-owned quaternion and hands
//! back the same reference. Both shapes produce identical values.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::quaternion::Quaternion;

/// Dot products beyond this magnitude are treated as (anti)parallel.
pub const PARALLEL_DOT_THRESHOLD: f64 = 0.999999;

/// Minimum cross product magnitude for a usable fallback rotation axis.
pub const DEGENERATE_AXIS_EPSILON: f64 = 0.000001;

/// Three axis vectors forming the columns of a rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
    pub z_axis: Vector3<f64>,
}

impl Basis {
    pub fn new(x_axis: Vector3<f64>, y_axis: Vector3<f64>, z_axis: Vector3<f64>) -> Self {
        Self {
            x_axis,
            y_axis,
            z_axis,
        }
    }

    /// The world frame `(1,0,0), (0,1,0), (0,0,1)`.
    pub fn standard() -> Self {
        Self::new(Vector3::x(), Vector3::y(), Vector3::z())
    }

    /// Check unit length and mutual orthogonality within `epsilon`.
    pub fn is_orthonormal(&self, epsilon: f64) -> bool {
        let unit = |v: &Vector3<f64>| (v.norm() - 1.0).abs() <= epsilon;
        unit(&self.x_axis)
            && unit(&self.y_axis)
            && unit(&self.z_axis)
            && self.x_axis.dot(&self.y_axis).abs() <= epsilon
            && self.y_axis.dot(&self.z_axis).abs() <= epsilon
            && self.z_axis.dot(&self.x_axis).abs() <= epsilon
    }
}

/// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
///
/// See [`rotation_to_into`] for the branch behaviour.
pub fn rotation_to(from: &Vector3<f64>, to: &Vector3<f64>) -> Quaternion {
    let mut out = Quaternion::IDENTITY;
    rotation_to_into(from, to, &mut out);
    out
}

/// Shortest-arc rotation taking `from` onto `to`, written into `out`.
///
/// Both inputs must be unit length.
///
/// * Nearly antiparallel inputs get a half turn about an axis perpendicular to
///   `from`, built from the world X axis (or world Y when `from` lies along X).
/// * Nearly parallel inputs get the identity.
/// * Otherwise the half-angle form `(from x to, 1 + from·to)` is normalized.
pub fn rotation_to_into<'a>(
    from: &Vector3<f64>,
    to: &Vector3<f64>,
    out: &'a mut Quaternion,
) -> &'a mut Quaternion {
    let dot = from.dot(to);

    if dot < -PARALLEL_DOT_THRESHOLD {
        let mut axis = Vector3::x().cross(from);
        if axis.norm() < DEGENERATE_AXIS_EPSILON {
            axis = Vector3::y().cross(from);
        }
        axis.normalize_mut();
        *out = Quaternion::from_axis_angle(&axis, std::f64::consts::PI);
        out
    } else if dot > PARALLEL_DOT_THRESHOLD {
        out.set(0.0, 0.0, 0.0, 1.0)
    } else {
        let axis = from.cross(to);
        out.set(axis.x, axis.y, axis.z, 1.0 + dot).normalize()
    }
}

/// Orientation whose rotation matrix has `basis` as its columns.
pub fn basis_to_rotation(basis: &Basis) -> Quaternion {
    let mut out = Quaternion::IDENTITY;
    basis_to_rotation_into(&basis.x_axis, &basis.y_axis, &basis.z_axis, &mut out);
    out
}

/// Rotation-matrix-to-quaternion conversion with the axes as matrix columns.
///
/// The axes must be orthonormal; other input gives meaningless output. The
/// branch is picked from the trace and the largest diagonal entry so the
/// divisor never approaches zero.
pub fn basis_to_rotation_into<'a>(
    x_axis: &Vector3<f64>,
    y_axis: &Vector3<f64>,
    z_axis: &Vector3<f64>,
    out: &'a mut Quaternion,
) -> &'a mut Quaternion {
    let (m11, m12, m13) = (x_axis.x, y_axis.x, z_axis.x);
    let (m21, m22, m23) = (x_axis.y, y_axis.y, z_axis.y);
    let (m31, m32, m33) = (x_axis.z, y_axis.z, z_axis.z);
    let trace = m11 + m22 + m33;

    if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        out.set(
            (m32 - m23) * s,
            (m13 - m31) * s,
            (m21 - m12) * s,
            0.25 / s,
        )
    } else if m11 > m22 && m11 > m33 {
        let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
        out.set(
            0.25 * s,
            (m12 + m21) / s,
            (m13 + m31) / s,
            (m32 - m23) / s,
        )
    } else if m22 > m33 {
        let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
        out.set(
            (m12 + m21) / s,
            0.25 * s,
            (m23 + m32) / s,
            (m13 - m31) / s,
        )
    } else {
        let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
        out.set(
            (m13 + m31) / s,
            (m23 + m32) / s,
            0.25 * s,
            (m21 - m12) / s,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::PI;

    fn random_unit(rng: &mut ChaCha8Rng) -> Vector3<f64> {
        loop {
            let v = Vector3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            let n = v.norm();
            if n > 0.1 && n <= 1.0 {
                return v / n;
            }
        }
    }

    #[test]
    fn test_rotation_to_same_vector_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let v = random_unit(&mut rng);
            assert_eq!(rotation_to(&v, &v), Quaternion::IDENTITY);
        }
    }

    #[test]
    fn test_rotation_to_opposite_is_half_turn() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut cases: Vec<Vector3<f64>> = (0..50).map(|_| random_unit(&mut rng)).collect();
        cases.push(Vector3::x());
        cases.push(-Vector3::x());
        cases.push(Vector3::y());
        cases.push(Vector3::z());

        for v in cases {
            let q = rotation_to(&v, &-v);
            assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(q.angle(), PI, epsilon = 1e-9);

            let axis = Vector3::new(q.x, q.y, q.z);
            assert!(axis.dot(&v).abs() < 1e-9, "axis not perpendicular for {v:?}");
            assert_relative_eq!(q.rotate_vector(&v), -v, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotation_to_along_x_uses_y_fallback() {
        let q = rotation_to(&Vector3::x(), &-Vector3::x());
        // UNIT_Y x UNIT_X = -Z
        assert_relative_eq!(q.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.z.abs(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.w, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_to_general_case() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            let from = random_unit(&mut rng);
            let to = random_unit(&mut rng);
            if from.dot(&to).abs() > PARALLEL_DOT_THRESHOLD {
                continue;
            }
            let q = rotation_to(&from, &to);
            assert!((q.norm() - 1.0).abs() < 1e-6);
            assert_relative_eq!(q.rotate_vector(&from), to, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotation_to_into_writes_caller_slot() {
        let from = Vector3::new(0.0, 0.0, 1.0);
        let to = Vector3::new(1.0, 0.0, 0.0);
        let mut out = Quaternion::new(9.0, 9.0, 9.0, 9.0);

        let written = *rotation_to_into(&from, &to, &mut out);
        assert_eq!(written, out);
        assert_eq!(out, rotation_to(&from, &to));
        assert_relative_eq!(out.rotate_vector(&from), to, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_to_quarter_turn_value() {
        let q = rotation_to(&Vector3::x(), &Vector3::y());
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(q.z, half, epsilon = 1e-12);
        assert_relative_eq!(q.w, half, epsilon = 1e-12);
    }

    #[test]
    fn test_basis_standard_is_identity() {
        assert_eq!(basis_to_rotation(&Basis::standard()), Quaternion::IDENTITY);
    }

    #[test]
    fn test_basis_reproduces_axes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let axis = random_unit(&mut rng);
            let angle = rng.gen_range(-PI..PI);
            let m = Quaternion::from_axis_angle(&axis, angle).to_rotation_matrix();
            let basis = Basis::new(
                m.column(0).into_owned(),
                m.column(1).into_owned(),
                m.column(2).into_owned(),
            );
            assert!(basis.is_orthonormal(1e-9));

            let q = basis_to_rotation(&basis);
            assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(q.rotate_vector(&Vector3::x()), basis.x_axis, epsilon = 1e-9);
            assert_relative_eq!(q.rotate_vector(&Vector3::y()), basis.y_axis, epsilon = 1e-9);
            assert_relative_eq!(q.rotate_vector(&Vector3::z()), basis.z_axis, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_basis_negative_trace_branches() {
        // Half turns about each world axis have trace -1 and exercise the
        // three diagonal-dominant branches.
        let cases = [
            (Basis::new(Vector3::x(), -Vector3::y(), -Vector3::z()), Vector3::x()),
            (Basis::new(-Vector3::x(), Vector3::y(), -Vector3::z()), Vector3::y()),
            (Basis::new(-Vector3::x(), -Vector3::y(), Vector3::z()), Vector3::z()),
        ];

        for (basis, axis) in cases {
            let q = basis_to_rotation(&basis);
            let expected = Quaternion::from_axis_angle(&axis, PI);
            assert!(q.same_rotation(&expected, 1e-12), "{q:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_basis_into_matches_allocating_form() {
        let q0 = Quaternion::from_axis_angle(&Vector3::new(1.0, 1.0, 0.0).normalize(), 2.5);
        let m = q0.to_rotation_matrix();
        let (x, y, z) = (
            m.column(0).into_owned(),
            m.column(1).into_owned(),
            m.column(2).into_owned(),
        );

        let mut out = Quaternion::IDENTITY;
        basis_to_rotation_into(&x, &y, &z, &mut out);
        assert_eq!(out, basis_to_rotation(&Basis::new(x, y, z)));
        assert!(out.same_rotation(&q0, 1e-12));
    }

    #[test]
    fn test_basis_orthonormal_check() {
        assert!(Basis::standard().is_orthonormal(1e-12));
        let skewed = Basis::new(Vector3::x(), Vector3::new(1.0, 1.0, 0.0), Vector3::z());
        assert!(!skewed.is_orthonormal(1e-6));
    }
}
