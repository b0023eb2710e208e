//! Ground clamping for streamed 3D tilesets.
//!
//! Photogrammetry and CAD tilesets are often authored with an arbitrary
//! vertical offset. [`clamp_to_ground`] waits for a tileset to finish loading,
//! samples the surface beneath its bounding sphere by ray-picking straight
//! down, and translates the model along the local vertical so its lowest
//! sampled point sits just above the ellipsoid.
//!
//! The host engine is reached only through the traits in [`scene`]: camera
//! placement, ray picking, the reference ellipsoid, and the tileset's load
//! event and model matrix.
//!
//! ```no_run
//! use geo_math::BoundingSphere;
//! use ground_clamp::{clamp_to_ground, ModelTransform, Scene, Tileset};
//!
//! fn place<S: Scene, T: Tileset>(scene: &mut S, tileset: &mut T, sphere: BoundingSphere) {
//!     clamp_to_ground(
//!         scene,
//!         tileset,
//!         sphere,
//!         Some(Box::new(|model: &mut dyn ModelTransform| {
//!             log::info!("clamped: {:?}", model.model_matrix())
//!         })),
//!     );
//!     // The tileset is not clamped yet; that happens once its tiles load.
//! }
//! ```

pub mod clamper;
pub mod config;
pub mod job;
pub mod latch;
pub mod scene;

#[cfg(test)]
pub(crate) mod test_util;

use geo_math::BoundingSphere;

pub use clamper::{GroundClamper, SamplePoint};
pub use config::{ClampConfig, ClampConfigError};
pub use job::{ClampCallback, ClampJob, ClampOutcome};
pub use latch::OneShot;
pub use scene::{AllTilesLoadedListener, ModelTransform, ObjectId, RayPick, Scene, Tileset};

/// Clamp `tileset` to the ground with the default configuration.
///
/// See [`GroundClamper::clamp_to_ground`].
pub fn clamp_to_ground<S, T>(
    scene: &mut S,
    tileset: &mut T,
    bounding_sphere: BoundingSphere,
    on_done: Option<ClampCallback>,
) where
    S: Scene + ?Sized,
    T: Tileset + ?Sized,
{
    GroundClamper::default().clamp_to_ground(scene, tileset, bounding_sphere, on_done);
}

/// Lowest biased surface height under `bounding_sphere` with the default
/// configuration.
///
/// See [`GroundClamper::pick_lowest_position`].
pub fn pick_lowest_position<S>(scene: &S, bounding_sphere: &BoundingSphere) -> Option<f64>
where
    S: Scene + ?Sized,
{
    GroundClamper::default().pick_lowest_position(scene, bounding_sphere)
}
