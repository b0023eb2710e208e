//! One registered clamp, driven by the tileset's load events.

use geo_math::BoundingSphere;
use log::{info, trace, warn};
use nalgebra::{Matrix4, Vector3};

use crate::clamper::GroundClamper;
use crate::latch::OneShot;
use crate::scene::{ModelTransform, Scene};

/// Completion callback, handed the tileset's transform after the first firing
pub type ClampCallback = Box<dyn FnOnce(&mut dyn ModelTransform)>;

/// What a single "all tiles loaded" firing did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClampOutcome {
    /// The model matrix was replaced with `translation`
    Clamped {
        /// Biased lowest surface height under the footprint (metres)
        lowest_height: f64,
        translation: Vector3<f64>,
    },
    /// Nothing was hit under the footprint; the transform was left alone
    NoSurface,
    /// An earlier firing already ran this clamp
    AlreadyClamped,
}

/// Clamp work attached to one tileset registration.
///
/// Hosts using [`GroundClamper::clamp_to_ground`] never see this type
/// directly. Hosts with their own event plumbing can create one and call
/// [`ClampJob::on_all_tiles_loaded`] from their event handler; the internal
/// latch guarantees the work runs once no matter how often that happens.
pub struct ClampJob {
    clamper: GroundClamper,
    bounding_sphere: BoundingSphere,
    latch: OneShot,
    on_done: Option<ClampCallback>,
}

impl ClampJob {
    pub fn new(
        clamper: GroundClamper,
        bounding_sphere: BoundingSphere,
        on_done: Option<ClampCallback>,
    ) -> Self {
        Self {
            clamper,
            bounding_sphere,
            latch: OneShot::new(),
            on_done,
        }
    }

    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }

    /// True once a firing has claimed the latch.
    pub fn has_run(&self) -> bool {
        self.latch.has_fired()
    }

    /// Handle one "all tiles loaded" event.
    ///
    /// The first call samples the surface and overwrites the model matrix
    /// with a pure translation, then runs the completion callback. Every
    /// later call returns [`ClampOutcome::AlreadyClamped`] without touching
    /// the scene or the transform.
    pub fn on_all_tiles_loaded<S>(
        &mut self,
        scene: &S,
        model: &mut dyn ModelTransform,
    ) -> ClampOutcome
    where
        S: Scene + ?Sized,
    {
        if !self.latch.try_fire() {
            trace!("Ignoring repeated tiles-loaded event");
            return ClampOutcome::AlreadyClamped;
        }

        let outcome = match self
            .clamper
            .ground_translation(scene, &self.bounding_sphere)
        {
            Some((lowest_height, translation)) => {
                model.set_model_matrix(Matrix4::new_translation(&translation));
                info!(
                    "Clamped model to ground: lowest height {:.3} m, moved {:.3} m",
                    lowest_height,
                    translation.norm()
                );
                ClampOutcome::Clamped {
                    lowest_height,
                    translation,
                }
            }
            None => {
                warn!(
                    "No surface found under model at {:?}; transform left unchanged",
                    self.bounding_sphere.center
                );
                ClampOutcome::NoSurface
            }
        };

        if let Some(on_done) = self.on_done.take() {
            on_done(model);
        }

        outcome
    }
}

impl std::fmt::Debug for ClampJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClampJob")
            .field("clamper", &self.clamper)
            .field("bounding_sphere", &self.bounding_sphere)
            .field("latch", &self.latch)
            .field("has_callback", &self.on_done.is_some())
            .finish()
    }
}
