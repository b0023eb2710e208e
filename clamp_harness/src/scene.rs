//! In-memory globe scene with ray-marched picking against a model surface.

use std::cell::Cell;

use geo_math::{Ellipsoid, Ray};
use ground_clamp::{ObjectId, RayPick, Scene};
use log::trace;
use nalgebra::{Point3, Vector3};

use crate::surface::SurfaceModel;

/// Bisection steps used to refine a surface crossing
const REFINE_ITERATIONS: usize = 24;

/// Where the camera was last pointed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub target: Point3<f64>,
    /// Offset from the target in its east/north/up frame
    pub offset: Vector3<f64>,
}

/// Scene holding a single pickable model surface.
pub struct SimulatedScene {
    ellipsoid: Ellipsoid,
    surface: Box<dyn SurfaceModel>,
    object: ObjectId,
    /// Ray march step (metres)
    march_step_m: f64,
    /// Furthest distance along a ray to search (metres)
    max_distance_m: f64,
    camera: Option<CameraPose>,
    pick_count: Cell<usize>,
}

impl SimulatedScene {
    pub fn new(ellipsoid: Ellipsoid, surface: impl SurfaceModel + 'static) -> Self {
        Self {
            ellipsoid,
            surface: Box::new(surface),
            object: ObjectId(1),
            march_step_m: 1.0,
            max_distance_m: 2500.0,
            camera: None,
            pick_count: Cell::new(0),
        }
    }

    /// Override the ray march resolution and reach.
    pub fn with_march(mut self, step_m: f64, max_distance_m: f64) -> Self {
        self.march_step_m = step_m;
        self.max_distance_m = max_distance_m;
        self
    }

    pub fn camera(&self) -> Option<&CameraPose> {
        self.camera.as_ref()
    }

    /// Number of rays cast so far
    pub fn pick_count(&self) -> usize {
        self.pick_count.get()
    }

    pub fn object_id(&self) -> ObjectId {
        self.object
    }

    /// Signed height of `point` above the model surface, `None` off the model.
    fn clearance(&self, point: &Point3<f64>) -> Option<f64> {
        let cartographic = self.ellipsoid.cartographic_from_cartesian(point)?;
        let surface = self.surface.height_at(&cartographic)?;
        Some(cartographic.height - surface)
    }

    /// Bisect `[t_above, t_below]` down to the surface crossing.
    ///
    /// Returns `None` if the bracket leaves the model footprint, which
    /// happens when the ray grazes the model's rim.
    fn refine(&self, ray: &Ray, mut t_above: f64, mut t_below: f64) -> Option<f64> {
        for _ in 0..REFINE_ITERATIONS {
            let mid = 0.5 * (t_above + t_below);
            if self.clearance(&ray.at(mid))? > 0.0 {
                t_above = mid;
            } else {
                t_below = mid;
            }
        }
        Some(t_below)
    }
}

impl Scene for SimulatedScene {
    fn look_at(&mut self, target: &Point3<f64>, offset: &Vector3<f64>) {
        self.camera = Some(CameraPose {
            target: *target,
            offset: *offset,
        });
    }

    fn pick_from_ray(&self, ray: &Ray, exclude: &[ObjectId]) -> Option<RayPick> {
        self.pick_count.set(self.pick_count.get() + 1);

        if exclude.contains(&self.object) {
            return None;
        }

        let mut t = 0.0;
        let mut last_above: Option<f64> = None;

        while t <= self.max_distance_m {
            match self.clearance(&ray.at(t)) {
                Some(c) if c <= 0.0 => {
                    // Entering through the side of the model, or starting
                    // inside it, leaves no bracket on the top surface.
                    let Some(t_above) = last_above else {
                        trace!("Ray entered model below its surface at t = {t:.4} m");
                        return None;
                    };
                    let Some(t_hit) = self.refine(ray, t_above, t) else {
                        trace!("Ray grazed model rim near t = {t:.4} m");
                        return None;
                    };
                    let position = ray.at(t_hit);
                    trace!("Ray hit model at t = {t_hit:.4} m");
                    return Some(RayPick {
                        object: Some(self.object),
                        position,
                    });
                }
                Some(_) => last_above = Some(t),
                None => last_above = None,
            }
            t += self.march_step_m;
        }

        None
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}
