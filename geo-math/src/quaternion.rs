//! Rotation quaternion stored in `(x, y, z, w)` order.
//!
//! Kept as a plain struct so callers can reuse an instance as an output slot
//! across many rotation computations. Conversions to and from nalgebra's
//! `UnitQuaternion` are provided for composing with the rest of the math stack.

use nalgebra::{Matrix3, Quaternion as NaQuaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A quaternion `x*i + y*j + z*k + w`.
///
/// Rotation constructors in this crate always produce unit quaternions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Vector part (i)
    pub x: f64,
    /// Vector part (j)
    pub y: f64,
    /// Vector part (k)
    pub z: f64,
    /// Scalar part
    pub w: f64,
}

impl Quaternion {
    /// The "no rotation" quaternion.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis`.
    ///
    /// `axis` is expected to be unit length; it is not normalized here.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        let half = angle / 2.0;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Overwrite all four components.
    pub fn set(&mut self, x: f64, y: f64, z: f64, w: f64) -> &mut Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self.w = w;
        self
    }

    pub fn norm_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Scale to unit length in place.
    pub fn normalize(&mut self) -> &mut Self {
        let inv = 1.0 / self.norm();
        self.x *= inv;
        self.y *= inv;
        self.z *= inv;
        self.w *= inv;
        self
    }

    /// Unit-length copy of this quaternion.
    pub fn normalized(&self) -> Self {
        let mut q = *self;
        q.normalize();
        q
    }

    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Hamilton product `self * rhs`.
    pub fn multiply(&self, rhs: &Quaternion) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }

    /// Rotate a vector by this (unit) quaternion.
    ///
    /// Uses `v' = v + 2w(u x v) + 2u x (u x v)` with `u` the vector part.
    pub fn rotate_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let u = Vector3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(&t)
    }

    /// Rotation angle in radians, in `[0, 2π]`.
    pub fn angle(&self) -> f64 {
        2.0 * self.w.clamp(-1.0, 1.0).acos()
    }

    /// 3x3 rotation matrix equivalent of this (unit) quaternion.
    pub fn to_rotation_matrix(&self) -> Matrix3<f64> {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let (x2, y2, z2) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Matrix3::new(
            1.0 - 2.0 * (y2 + z2),
            2.0 * (xy - wz),
            2.0 * (xz + wy),
            2.0 * (xy + wz),
            1.0 - 2.0 * (x2 + z2),
            2.0 * (yz - wx),
            2.0 * (xz - wy),
            2.0 * (yz + wx),
            1.0 - 2.0 * (x2 + y2),
        )
    }

    /// True when both quaternions describe the same rotation within `epsilon`.
    ///
    /// `q` and `-q` encode the same rotation, so both signs are accepted.
    pub fn same_rotation(&self, other: &Quaternion, epsilon: f64) -> bool {
        let close = |s: f64| {
            (self.x - s * other.x).abs() <= epsilon
                && (self.y - s * other.y).abs() <= epsilon
                && (self.z - s * other.z).abs() <= epsilon
                && (self.w - s * other.w).abs() <= epsilon
        };
        close(1.0) || close(-1.0)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<UnitQuaternion<f64>> for Quaternion {
    fn from(uq: UnitQuaternion<f64>) -> Self {
        let q = uq.into_inner();
        Self::new(q.i, q.j, q.k, q.w)
    }
}

impl From<Quaternion> for UnitQuaternion<f64> {
    fn from(q: Quaternion) -> Self {
        // nalgebra: Quaternion::new(w, i, j, k)
        UnitQuaternion::from_quaternion(NaQuaternion::new(q.w, q.x, q.y, q.z))
    }
}
