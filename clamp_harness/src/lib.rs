//! Clamp harness for testing and simulation
//!
//! Provides an in-memory globe scene, a tileset whose load events are fired
//! on demand, and synthetic model surfaces, so ground clamping can be run
//! end to end without a rendering engine.

pub mod scene;
pub mod surface;
pub mod tileset;

pub use scene::{CameraPose, SimulatedScene};
pub use surface::{Mound, OffsetModel, SurfaceModel};
pub use tileset::SimulatedTileset;

use geo_math::{BoundingSphere, Cartographic, WGS84};
use ground_clamp::{GroundClamper, Scene};
use nalgebra::Matrix4;

/// Parameters for a single simulated model site
#[derive(Debug, Clone)]
pub struct SiteParams {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    /// Height the model was authored at (metres above the ellipsoid)
    pub base_height_m: f64,
    /// Radius of the model footprint and its bounding sphere (metres)
    pub footprint_radius_m: f64,
    pub mound_count: usize,
    pub max_relief_m: f64,
    pub seed: u64,
}

impl Default for SiteParams {
    fn default() -> Self {
        Self {
            longitude_deg: 13.4,
            latitude_deg: 52.5,
            base_height_m: 35.0,
            footprint_radius_m: 20.0,
            mound_count: 0,
            max_relief_m: 0.0,
            seed: 42,
        }
    }
}

/// Build a scene holding the model described by `params`, and its bounding sphere.
pub fn create_site(params: &SiteParams) -> (SimulatedScene, BoundingSphere) {
    let center = Cartographic::from_degrees(params.longitude_deg, params.latitude_deg, 0.0);

    let mut model = OffsetModel::new(
        *WGS84,
        center,
        params.footprint_radius_m,
        params.base_height_m,
    );
    if params.mound_count > 0 {
        model = model.with_random_mounds(params.mound_count, params.max_relief_m, params.seed);
    }

    let sphere_center =
        WGS84.cartesian_from_radians(center.longitude, center.latitude, params.base_height_m);
    let sphere = BoundingSphere::new(sphere_center, params.footprint_radius_m);

    (SimulatedScene::new(*WGS84, model), sphere)
}

/// Lowest geodetic height of the sampled footprint once `model_matrix` is applied.
///
/// Re-samples the untransformed surface and moves every hit through the
/// matrix, giving where the model's lowest point ends up after clamping.
pub fn clamped_clearance<S>(
    clamper: &GroundClamper,
    scene: &S,
    bounding_sphere: &BoundingSphere,
    model_matrix: &Matrix4<f64>,
) -> Option<f64>
where
    S: Scene + ?Sized,
{
    let ellipsoid = scene.ellipsoid();
    clamper
        .sample_footprint(scene, bounding_sphere)
        .iter()
        .filter_map(|sample| {
            let moved = model_matrix.transform_point(&sample.position);
            ellipsoid.cartographic_from_cartesian(&moved)
        })
        .map(|c| c.height)
        .reduce(f64::min)
}
