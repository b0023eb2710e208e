//! Tileset stand-in whose load events are fired by the harness.

use ground_clamp::{AllTilesLoadedListener, ModelTransform, Scene, Tileset};
use log::debug;
use nalgebra::Matrix4;

/// Simulated streaming tileset.
///
/// Holds a model matrix and the registered "all tiles loaded" listeners.
/// Real hosts fire the event every time the streaming queue drains, which
/// can happen many times as the camera moves; [`fire_all_tiles_loaded`]
/// plays that role here.
///
/// [`fire_all_tiles_loaded`]: SimulatedTileset::fire_all_tiles_loaded
pub struct SimulatedTileset {
    model_matrix: Matrix4<f64>,
    matrix_writes: usize,
    load_cycles: usize,
    listeners: Vec<AllTilesLoadedListener>,
}

impl SimulatedTileset {
    pub fn new() -> Self {
        Self::with_model_matrix(Matrix4::identity())
    }

    pub fn with_model_matrix(model_matrix: Matrix4<f64>) -> Self {
        Self {
            model_matrix,
            matrix_writes: 0,
            load_cycles: 0,
            listeners: Vec::new(),
        }
    }

    /// Times the model matrix has been replaced
    pub fn matrix_writes(&self) -> usize {
        self.matrix_writes
    }

    pub fn load_cycles(&self) -> usize {
        self.load_cycles
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Finish one streaming cycle and notify every listener.
    pub fn fire_all_tiles_loaded(&mut self, scene: &dyn Scene) {
        self.load_cycles += 1;
        debug!(
            "All tiles loaded (cycle {}), notifying {} listener(s)",
            self.load_cycles,
            self.listeners.len()
        );

        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener(scene, self);
        }
        self.listeners = listeners;
    }
}

impl Default for SimulatedTileset {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelTransform for SimulatedTileset {
    fn model_matrix(&self) -> Matrix4<f64> {
        self.model_matrix
    }

    fn set_model_matrix(&mut self, matrix: Matrix4<f64>) {
        self.model_matrix = matrix;
        self.matrix_writes += 1;
    }
}

impl Tileset for SimulatedTileset {
    fn add_all_tiles_loaded_listener(&mut self, listener: AllTilesLoadedListener) {
        self.listeners.push(listener);
    }
}
