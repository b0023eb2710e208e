//! Local east/north/up frame on the ellipsoid surface.

use nalgebra::{Point3, Vector3};

use crate::ellipsoid::Ellipsoid;

/// Horizontal coordinates within this distance of zero count as the pole
const POLE_EPSILON: f64 = 1.0e-14;

/// A plane tangent to the ellipsoid with two horizontal axes.
///
/// `x_axis` points east, `y_axis` points north and `normal` points up. The
/// three form a right-handed orthonormal frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentPlane {
    /// Point on the ellipsoid surface below the construction point
    pub origin: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
    pub normal: Vector3<f64>,
}

impl TangentPlane {
    /// Tangent plane at the surface point beneath `point`.
    ///
    /// Returns `None` when `point` is at the ellipsoid centre.
    pub fn new(point: &Point3<f64>, ellipsoid: &Ellipsoid) -> Option<Self> {
        let origin = ellipsoid.scale_to_geodetic_surface(point)?;

        let (east, north, up) = if origin.x.abs() < POLE_EPSILON && origin.y.abs() < POLE_EPSILON {
            // Longitude is undefined at the poles; pin east to +Y.
            let sign = origin.z.signum();
            (
                Vector3::y(),
                Vector3::new(-sign, 0.0, 0.0),
                Vector3::new(0.0, 0.0, sign),
            )
        } else {
            let up = ellipsoid.geodetic_surface_normal(&origin)?;
            let east = Vector3::new(-origin.y, origin.x, 0.0).normalize();
            let north = up.cross(&east);
            (east, north, up)
        };

        Some(Self {
            origin,
            x_axis: east,
            y_axis: north,
            normal: up,
        })
    }

    /// Point at planar coordinates `(x, y)` measured along the axes.
    pub fn point_at(&self, x: f64, y: f64) -> Point3<f64> {
        self.origin + self.x_axis * x + self.y_axis * y
    }
}
