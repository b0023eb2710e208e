//! Rays and bounding volumes.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A half-line starting at `origin` travelling along `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point3<f64>,
    /// Travel direction, unit length for distance-parameterised use
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// Minimal enclosing sphere of a model, used as its footprint proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Point3<f64>,
    /// Radius in metres
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }
}
