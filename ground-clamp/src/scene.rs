//! Capabilities the clamper consumes from the host rendering environment.
//!
//! The host owns the camera, the picking subsystem and the tileset lifecycle.
//! These traits are the narrow surface the clamping logic needs from them.

use geo_math::{Ellipsoid, Ray, WGS84};
use nalgebra::{Matrix4, Point3, Vector3};

/// Identifier of a pickable scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

/// Result of casting a ray into the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPick {
    /// Object that was hit, if the picking subsystem could resolve one
    pub object: Option<ObjectId>,
    /// Intersection position in ECEF metres
    pub position: Point3<f64>,
}

/// Scene and camera services of the host.
pub trait Scene {
    /// Point the camera at `target`, placed at `offset` in the target's local
    /// east/north/up frame.
    fn look_at(&mut self, target: &Point3<f64>, offset: &Vector3<f64>);

    /// Cast `ray` into the scene, ignoring objects in `exclude`.
    ///
    /// Returns the nearest intersection, or `None` when nothing was hit.
    fn pick_from_ray(&self, ray: &Ray, exclude: &[ObjectId]) -> Option<RayPick>;

    /// Reference ellipsoid of the globe.
    fn ellipsoid(&self) -> &Ellipsoid {
        &WGS84
    }
}

/// Writable model transform of a loaded tileset.
pub trait ModelTransform {
    fn model_matrix(&self) -> Matrix4<f64>;

    fn set_model_matrix(&mut self, matrix: Matrix4<f64>);
}

/// Listener invoked each time a tileset finishes streaming its tiles.
pub type AllTilesLoadedListener = Box<dyn FnMut(&dyn Scene, &mut dyn ModelTransform)>;

/// A streamed 3D tileset.
pub trait Tileset: ModelTransform {
    /// Subscribe to the "all tiles loaded" event.
    ///
    /// The event fires every time the tile request queue drains, so a
    /// listener may be called many times. Listeners cannot be removed.
    fn add_all_tiles_loaded_listener(&mut self, listener: AllTilesLoadedListener);
}
