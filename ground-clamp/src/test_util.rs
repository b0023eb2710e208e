//! Scriptable scene and tileset doubles for unit tests.

use std::cell::{Cell, RefCell};

use geo_math::{Ray, WGS84};
use nalgebra::{Matrix4, Point3, Vector3};

use crate::scene::{AllTilesLoadedListener, ModelTransform, ObjectId, RayPick, Scene, Tileset};

/// Reply the mock scene gives to one pick request
#[derive(Debug, Clone, Copy)]
pub enum ScriptedPick {
    Miss,
    /// Hit an object at this geodetic height below the ray origin
    Hit(f64),
    /// Hit a position the picker could not resolve to an object
    Unresolved(f64),
}

/// Scene whose pick results are produced by a script keyed on pick order.
pub struct MockScene {
    script: Box<dyn Fn(usize) -> ScriptedPick>,
    pub picks: Cell<usize>,
    pub rays: RefCell<Vec<Ray>>,
    pub look_at_calls: Vec<(Point3<f64>, Vector3<f64>)>,
}

impl MockScene {
    pub fn new(script: impl Fn(usize) -> ScriptedPick + 'static) -> Self {
        Self {
            script: Box::new(script),
            picks: Cell::new(0),
            rays: RefCell::new(Vec::new()),
            look_at_calls: Vec::new(),
        }
    }

    /// Every pick hits an object at `height`.
    pub fn flat(height: f64) -> Self {
        Self::new(move |_| ScriptedPick::Hit(height))
    }

    pub fn missing() -> Self {
        Self::new(|_| ScriptedPick::Miss)
    }
}

impl Scene for MockScene {
    fn look_at(&mut self, target: &Point3<f64>, offset: &Vector3<f64>) {
        self.look_at_calls.push((*target, *offset));
    }

    fn pick_from_ray(&self, ray: &Ray, _exclude: &[ObjectId]) -> Option<RayPick> {
        let index = self.picks.get();
        self.picks.set(index + 1);
        self.rays.borrow_mut().push(*ray);

        let below = |height: f64| {
            let origin = WGS84.cartographic_from_cartesian(&ray.origin)?;
            Some(WGS84.cartesian_from_radians(origin.longitude, origin.latitude, height))
        };

        match (self.script)(index) {
            ScriptedPick::Miss => None,
            ScriptedPick::Hit(height) => below(height).map(|position| RayPick {
                object: Some(ObjectId(1)),
                position,
            }),
            ScriptedPick::Unresolved(height) => below(height).map(|position| RayPick {
                object: None,
                position,
            }),
        }
    }
}

/// Tileset that records its transform and lets tests fire the load event.
pub struct MockTileset {
    pub matrix: Matrix4<f64>,
    pub writes: usize,
    listeners: Vec<AllTilesLoadedListener>,
}

impl MockTileset {
    pub fn new() -> Self {
        Self {
            matrix: Matrix4::identity(),
            writes: 0,
            listeners: Vec::new(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Invoke every registered listener, as the host does when streaming drains.
    pub fn fire_all_tiles_loaded(&mut self, scene: &dyn Scene) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener(scene, self);
        }
        self.listeners = listeners;
    }
}

impl ModelTransform for MockTileset {
    fn model_matrix(&self) -> Matrix4<f64> {
        self.matrix
    }

    fn set_model_matrix(&mut self, matrix: Matrix4<f64>) {
        self.matrix = matrix;
        self.writes += 1;
    }
}

impl Tileset for MockTileset {
    fn add_all_tiles_loaded_listener(&mut self, listener: AllTilesLoadedListener) {
        self.listeners.push(listener);
    }
}
