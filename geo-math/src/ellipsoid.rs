//! Reference ellipsoid and geodetic coordinate conversions.
//!
//! Cartesian coordinates are Earth-centred, Earth-fixed (ECEF) metres.
//! Cartographic coordinates are geodetic longitude/latitude in radians plus
//! height in metres above the ellipsoid surface.

use nalgebra::{Point3, Vector3};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Convergence tolerance for the surface projection iteration
const SURFACE_EPSILON: f64 = 1.0e-12;

/// Squared scaled distance under which a point is too close to the centre to
/// project onto the surface
const CENTER_TOLERANCE_SQUARED: f64 = 0.1;

/// Guard against a non-converging projection
const MAX_SURFACE_ITERATIONS: usize = 64;

/// WGS84 semi-major axis in metres
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 semi-minor axis in metres
pub const WGS84_B: f64 = 6_356_752.314_245_179;

/// The WGS84 reference ellipsoid.
pub static WGS84: Lazy<Ellipsoid> = Lazy::new(|| Ellipsoid::from_radii(WGS84_A, WGS84_A, WGS84_B));

/// Geodetic position on an ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cartographic {
    /// Longitude in radians
    pub longitude: f64,
    /// Geodetic latitude in radians
    pub latitude: f64,
    /// Height above the ellipsoid in metres
    pub height: f64,
}

impl Cartographic {
    pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    pub fn from_degrees(longitude_deg: f64, latitude_deg: f64, height: f64) -> Self {
        Self::new(longitude_deg.to_radians(), latitude_deg.to_radians(), height)
    }
}

/// An axis-aligned ellipsoid centred at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    radii: Vector3<f64>,
    radii_squared: Vector3<f64>,
    one_over_radii_squared: Vector3<f64>,
}

impl Ellipsoid {
    /// A sphere of the given radius.
    pub fn sphere(radius: f64) -> Self {
        Self::from_radii(radius, radius, radius)
    }

    /// Build an ellipsoid from its three semi-axes.
    pub fn from_radii(x: f64, y: f64, z: f64) -> Self {
        Self {
            radii: Vector3::new(x, y, z),
            radii_squared: Vector3::new(x * x, y * y, z * z),
            one_over_radii_squared: Vector3::new(1.0 / (x * x), 1.0 / (y * y), 1.0 / (z * z)),
        }
    }

    pub fn radii(&self) -> &Vector3<f64> {
        &self.radii
    }

    /// Outward unit normal of the ellipsoid surface passing through `point`'s
    /// geodetic direction.
    ///
    /// Returns `None` for the centre point, where no normal exists.
    pub fn geodetic_surface_normal(&self, point: &Point3<f64>) -> Option<Vector3<f64>> {
        point
            .coords
            .component_mul(&self.one_over_radii_squared)
            .try_normalize(0.0)
    }

    /// Geodetic surface normal at a longitude/latitude.
    pub fn geodetic_surface_normal_cartographic(
        &self,
        longitude: f64,
        latitude: f64,
    ) -> Vector3<f64> {
        let cos_lat = latitude.cos();
        Vector3::new(
            cos_lat * longitude.cos(),
            cos_lat * longitude.sin(),
            latitude.sin(),
        )
        .normalize()
    }

    /// Project `point` along its geodetic normal onto the ellipsoid surface.
    ///
    /// Returns `None` when the point is too close to the centre for the
    /// projection to be meaningful.
    pub fn scale_to_geodetic_surface(&self, point: &Point3<f64>) -> Option<Point3<f64>> {
        let p = point.coords;
        let oors = self.one_over_radii_squared;

        let x2 = p.x * p.x * oors.x;
        let y2 = p.y * p.y * oors.y;
        let z2 = p.z * p.z * oors.z;

        let squared_norm = x2 + y2 + z2;
        let ratio = (1.0 / squared_norm).sqrt();

        // Radial projection is the starting guess.
        let intersection = p * ratio;

        if squared_norm < CENTER_TOLERANCE_SQUARED {
            return if ratio.is_finite() {
                Some(Point3::from(intersection))
            } else {
                None
            };
        }

        let gradient = intersection.component_mul(&oors) * 2.0;

        // Newton iteration on the scaling factor lambda.
        let mut lambda = ((1.0 - ratio) * p.norm()) / (0.5 * gradient.norm());
        let mut correction = 0.0;
        let mut multiplier = Vector3::new(1.0, 1.0, 1.0);
        let mut converged = false;

        for _ in 0..MAX_SURFACE_ITERATIONS {
            lambda -= correction;

            multiplier = Vector3::new(
                1.0 / (1.0 + lambda * oors.x),
                1.0 / (1.0 + lambda * oors.y),
                1.0 / (1.0 + lambda * oors.z),
            );
            let m2 = multiplier.component_mul(&multiplier);
            let m3 = m2.component_mul(&multiplier);

            let func = x2 * m2.x + y2 * m2.y + z2 * m2.z - 1.0;
            if func.abs() <= SURFACE_EPSILON {
                converged = true;
                break;
            }

            let denominator = x2 * m3.x * oors.x + y2 * m3.y * oors.y + z2 * m3.z * oors.z;
            let derivative = -2.0 * denominator;
            correction = func / derivative;
        }

        if !converged {
            log::warn!(
                "Surface projection of {point:?} did not converge in \
                 {MAX_SURFACE_ITERATIONS} iterations"
            );
        }

        Some(Point3::from(p.component_mul(&multiplier)))
    }

    /// Convert an ECEF position to longitude, latitude and height.
    ///
    /// Returns `None` near the ellipsoid centre.
    pub fn cartographic_from_cartesian(&self, point: &Point3<f64>) -> Option<Cartographic> {
        let surface = self.scale_to_geodetic_surface(point)?;
        let normal = self.geodetic_surface_normal(&surface)?;
        let offset = point - surface;

        let longitude = normal.y.atan2(normal.x);
        let latitude = normal.z.clamp(-1.0, 1.0).asin();
        let height = offset.dot(&point.coords).signum() * offset.norm();

        Some(Cartographic::new(longitude, latitude, height))
    }

    /// Convert longitude/latitude (radians) and height to an ECEF position.
    pub fn cartesian_from_radians(
        &self,
        longitude: f64,
        latitude: f64,
        height: f64,
    ) -> Point3<f64> {
        let normal = self.geodetic_surface_normal_cartographic(longitude, latitude);
        let k = self.radii_squared.component_mul(&normal);
        let gamma = normal.dot(&k).sqrt();
        Point3::from(k / gamma + normal * height)
    }

    /// Convert a [`Cartographic`] to an ECEF position.
    pub fn cartesian_from_cartographic(&self, cartographic: &Cartographic) -> Point3<f64> {
        self.cartesian_from_radians(
            cartographic.longitude,
            cartographic.latitude,
            cartographic.height,
        )
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        *WGS84
    }
}
