//! Geometry for globe scenes: rotation quaternions and the reference ellipsoid.
//!
//! - [`rotation`] builds quaternions that align one direction with another, or
//!   that reproduce an orthonormal frame.
//! - [`ellipsoid`] converts between ECEF cartesian positions and geodetic
//!   longitude/latitude/height, and provides surface normals.
//! - [`tangent_plane`] builds the local east/north/up frame at a point.

pub mod ellipsoid;
pub mod quaternion;
pub mod ray;
pub mod rotation;
pub mod tangent_plane;

pub use ellipsoid::{Cartographic, Ellipsoid, WGS84};
pub use quaternion::Quaternion;
pub use ray::{BoundingSphere, Ray};
pub use rotation::{
    basis_to_rotation, basis_to_rotation_into, rotation_to, rotation_to_into, Basis,
};
pub use tangent_plane::TangentPlane;
