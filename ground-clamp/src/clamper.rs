//! Terrain sampling beneath a model's footprint.
//!
//! The footprint is approximated by the model's bounding sphere. Samples are
//! taken along the two horizontal axes of the tangent plane at the sphere's
//! centre, forming a cross through the footprint. Each sample casts a ray
//! straight down along the local geodetic normal and records the height of
//! whatever it hits.

use geo_math::{BoundingSphere, Ellipsoid, Ray, TangentPlane};
use log::{debug, trace, warn};
use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::{ClampConfig, ClampConfigError};
use crate::job::{ClampCallback, ClampJob};
use crate::scene::{ModelTransform, ObjectId, Scene, Tileset};

/// A picked surface point beneath the footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    /// Hit position in ECEF metres
    pub position: Point3<f64>,
    /// Geodetic height of the hit position
    pub height: f64,
    /// Object the ray hit
    pub object: ObjectId,
}

/// Samples terrain under models and moves them onto it.
#[derive(Debug, Clone, Default)]
pub struct GroundClamper {
    config: ClampConfig,
}

impl GroundClamper {
    /// Create a clamper with a validated configuration.
    ///
    /// # Errors
    /// * `ClampConfigError::ArgumentError` - if the configuration is unusable
    pub fn new(config: ClampConfig) -> Result<Self, ClampConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClampConfig {
        &self.config
    }

    /// Frame the model and clamp it once its tiles have loaded.
    ///
    /// Points the camera at the sphere centre from `radius` above so the
    /// terrain beneath the model gets loaded, then registers a listener on the
    /// tileset's "all tiles loaded" event. The first firing samples the
    /// terrain and replaces the tileset's model matrix with a pure
    /// translation; later firings do nothing. `on_done` runs after that first
    /// firing whether or not a translation was applied.
    ///
    /// Returns immediately. The model matrix is overwritten, not composed, so
    /// any transform set on the tileset beforehand is lost.
    pub fn clamp_to_ground<S, T>(
        &self,
        scene: &mut S,
        tileset: &mut T,
        bounding_sphere: BoundingSphere,
        on_done: Option<ClampCallback>,
    ) where
        S: Scene + ?Sized,
        T: Tileset + ?Sized,
    {
        scene.look_at(
            &bounding_sphere.center,
            &Vector3::new(0.0, 0.0, bounding_sphere.radius),
        );

        debug!(
            "Waiting for tiles to load before clamping model at {:?} (radius {:.1} m)",
            bounding_sphere.center, bounding_sphere.radius
        );

        let mut job = ClampJob::new(self.clone(), bounding_sphere, on_done);
        tileset.add_all_tiles_loaded_listener(Box::new(
            move |scene: &dyn Scene, model: &mut dyn ModelTransform| {
                job.on_all_tiles_loaded(scene, model);
            },
        ));
    }

    /// Lowest surface height under the footprint, adjusted by the clearance bias.
    ///
    /// Returns `None` when the radius is not positive or no sample hit anything.
    /// A positive minimum has the bias subtracted; zero or negative minimums
    /// have it added.
    pub fn pick_lowest_position<S>(
        &self,
        scene: &S,
        bounding_sphere: &BoundingSphere,
    ) -> Option<f64>
    where
        S: Scene + ?Sized,
    {
        let samples = self.sample_footprint(scene, bounding_sphere);
        let lowest = samples
            .iter()
            .map(|sample| sample.height)
            .fold(f64::INFINITY, f64::min);

        if lowest < f64::INFINITY {
            debug!(
                "Lowest of {} surface samples is {:.3} m",
                samples.len(),
                lowest
            );
            Some(self.apply_clearance_bias(lowest))
        } else {
            None
        }
    }

    /// Every surface hit beneath the footprint, x axis first then y axis.
    pub fn sample_footprint<S>(
        &self,
        scene: &S,
        bounding_sphere: &BoundingSphere,
    ) -> Vec<SamplePoint>
    where
        S: Scene + ?Sized,
    {
        if !bounding_sphere.radius.is_finite() || bounding_sphere.radius <= 0.0 {
            debug!(
                "Skipping terrain sampling for radius {}",
                bounding_sphere.radius
            );
            return Vec::new();
        }

        let ellipsoid = scene.ellipsoid();
        let Some(plane) = TangentPlane::new(&bounding_sphere.center, ellipsoid) else {
            warn!(
                "No tangent plane at {:?}; cannot sample terrain",
                bounding_sphere.center
            );
            return Vec::new();
        };

        let half_count = bounding_sphere.radius.round() as i64;
        let mut samples = Vec::new();

        for (along_x, along_y) in [(1.0, 0.0), (0.0, 1.0)] {
            for offset in (-half_count..half_count).step_by(self.config.sample_step) {
                let offset = offset as f64;
                let position = plane.point_at(along_x * offset, along_y * offset);
                if let Some(sample) = self.pick_below(scene, ellipsoid, &position) {
                    samples.push(sample);
                }
            }
        }

        samples
    }

    /// Translation that moves the lowest sampled point down to the ellipsoid.
    ///
    /// The translation runs along the negated geodetic normal at the sphere
    /// centre. Returns the biased lowest height alongside it, or `None` when
    /// nothing was sampled.
    pub fn ground_translation<S>(
        &self,
        scene: &S,
        bounding_sphere: &BoundingSphere,
    ) -> Option<(f64, Vector3<f64>)>
    where
        S: Scene + ?Sized,
    {
        let lowest = self.pick_lowest_position(scene, bounding_sphere)?;
        let normal = scene
            .ellipsoid()
            .geodetic_surface_normal(&bounding_sphere.center)?;
        Some((lowest, normal * -lowest))
    }

    /// Model matrix that clamps the footprint to the ground.
    pub fn ground_transform<S>(
        &self,
        scene: &S,
        bounding_sphere: &BoundingSphere,
    ) -> Option<Matrix4<f64>>
    where
        S: Scene + ?Sized,
    {
        self.ground_translation(scene, bounding_sphere)
            .map(|(_, translation)| Matrix4::new_translation(&translation))
    }

    fn apply_clearance_bias(&self, lowest: f64) -> f64 {
        if lowest > 0.0 {
            lowest - self.config.clearance_bias
        } else {
            lowest + self.config.clearance_bias
        }
    }

    /// Cast a ray straight down onto `position` from above.
    fn pick_below<S>(
        &self,
        scene: &S,
        ellipsoid: &Ellipsoid,
        position: &Point3<f64>,
    ) -> Option<SamplePoint>
    where
        S: Scene + ?Sized,
    {
        let normal = ellipsoid.geodetic_surface_normal(position)?;
        let cartographic = ellipsoid.cartographic_from_cartesian(position)?;
        let origin = ellipsoid.cartesian_from_radians(
            cartographic.longitude,
            cartographic.latitude,
            cartographic.height + self.config.ray_origin_height,
        );

        let pick = scene.pick_from_ray(&Ray::new(origin, -normal), &[])?;
        let object = pick.object?;
        let height = ellipsoid.cartographic_from_cartesian(&pick.position)?.height;

        trace!("Sample hit {object:?} at height {height:.3} m");

        Some(SamplePoint {
            position: pick.position,
            height,
            object,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MockScene, ScriptedPick};
    use approx::assert_relative_eq;
    use geo_math::WGS84;

    fn sphere(radius: f64) -> BoundingSphere {
        BoundingSphere::new(WGS84.cartesian_from_radians(0.2, 0.8, 30.0), radius)
    }

    #[test]
    fn test_non_positive_radius_returns_none() {
        let scene = MockScene::flat(10.0);
        let clamper = GroundClamper::default();

        assert_eq!(clamper.pick_lowest_position(&scene, &sphere(0.0)), None);
        assert_eq!(clamper.pick_lowest_position(&scene, &sphere(-5.0)), None);
        assert_eq!(clamper.pick_lowest_position(&scene, &sphere(f64::NAN)), None);
        assert_eq!(scene.picks.get(), 0);
    }

    #[test]
    fn test_all_misses_returns_none() {
        let scene = MockScene::missing();
        let clamper = GroundClamper::default();
        assert_eq!(clamper.pick_lowest_position(&scene, &sphere(20.0)), None);
        assert_eq!(scene.picks.get(), 40);
    }

    #[test]
    fn test_sample_count_follows_radius() {
        let clamper = GroundClamper::default();

        // round(10.4) = 10 -> offsets -10, -8, ..., 8 on each axis
        let scene = MockScene::missing();
        clamper.sample_footprint(&scene, &sphere(10.4));
        assert_eq!(scene.picks.get(), 20);

        // round(0.4) = 0 -> no offsets
        let scene = MockScene::missing();
        clamper.sample_footprint(&scene, &sphere(0.4));
        assert_eq!(scene.picks.get(), 0);

        let dense = GroundClamper::new(ClampConfig {
            sample_step: 1,
            ..Default::default()
        })
        .unwrap();
        let scene = MockScene::missing();
        dense.sample_footprint(&scene, &sphere(10.0));
        assert_eq!(scene.picks.get(), 40);
    }

    #[test]
    fn test_single_positive_hit_subtracts_bias() {
        let scene = MockScene::new(|i| {
            if i == 3 {
                ScriptedPick::Hit(5.0)
            } else {
                ScriptedPick::Miss
            }
        });
        let lowest = GroundClamper::default()
            .pick_lowest_position(&scene, &sphere(12.0))
            .unwrap();
        assert_relative_eq!(lowest, 4.8, epsilon = 1e-4);
    }

    #[test]
    fn test_negative_minimum_adds_bias() {
        let scene = MockScene::new(|i| match i % 3 {
            0 => ScriptedPick::Hit(-3.0),
            1 => ScriptedPick::Hit(7.5),
            _ => ScriptedPick::Miss,
        });
        let lowest = GroundClamper::default()
            .pick_lowest_position(&scene, &sphere(12.0))
            .unwrap();
        assert_relative_eq!(lowest, -2.8, epsilon = 1e-4);
    }

    #[test]
    fn test_clearance_bias_direction() {
        let clamper = GroundClamper::default();
        assert_relative_eq!(clamper.apply_clearance_bias(5.0), 4.8, epsilon = 1e-12);
        assert_relative_eq!(clamper.apply_clearance_bias(-3.0), -2.8, epsilon = 1e-12);
        assert_relative_eq!(clamper.apply_clearance_bias(0.0), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_unresolved_picks_are_ignored() {
        let scene = MockScene::new(|i| {
            if i == 0 {
                ScriptedPick::Unresolved(-50.0)
            } else {
                ScriptedPick::Hit(12.0)
            }
        });
        let clamper = GroundClamper::default();
        let samples = clamper.sample_footprint(&scene, &sphere(6.0));
        assert_eq!(samples.len(), 11);

        let lowest = clamper.pick_lowest_position(&scene, &sphere(6.0)).unwrap();
        assert_relative_eq!(lowest, 11.8, epsilon = 1e-4);
    }

    #[test]
    fn test_rays_point_down_from_above() {
        let scene = MockScene::missing();
        let s = sphere(4.0);
        GroundClamper::default().sample_footprint(&scene, &s);

        let rays = scene.rays.borrow();
        assert_eq!(rays.len(), 8);
        for ray in rays.iter() {
            // The geodetic normal is exact only on the surface beneath the ray.
            let surface = WGS84.scale_to_geodetic_surface(&ray.origin).unwrap();
            let up = WGS84.geodetic_surface_normal(&surface).unwrap();
            assert_relative_eq!(ray.direction, -up, epsilon = 1e-9);

            let origin = WGS84.cartographic_from_cartesian(&ray.origin).unwrap();
            // Tangent-plane samples sit a hair above the surface.
            assert!((origin.height - 1000.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_samples_form_a_cross() {
        let scene = MockScene::flat(0.0);
        let s = sphere(6.0);
        let plane = TangentPlane::new(&s.center, &WGS84).unwrap();
        let samples = GroundClamper::default().sample_footprint(&scene, &s);
        assert_eq!(samples.len(), 12);

        // First six run along east, last six along north.
        for (i, sample) in samples.iter().enumerate() {
            let offset = sample.position - plane.origin;
            let expected = -6.0 + 2.0 * (i % 6) as f64;
            let (along, across) = if i < 6 {
                (plane.x_axis, plane.y_axis)
            } else {
                (plane.y_axis, plane.x_axis)
            };
            assert_relative_eq!(offset.dot(&along), expected, epsilon = 1e-3);
            assert!(offset.dot(&across).abs() < 1e-3);
        }
    }

    #[test]
    fn test_ground_translation_points_down() {
        let scene = MockScene::flat(25.0);
        let s = sphere(8.0);
        let (lowest, translation) = GroundClamper::default()
            .ground_translation(&scene, &s)
            .unwrap();

        assert_relative_eq!(lowest, 24.8, epsilon = 1e-4);
        let up = WGS84.geodetic_surface_normal(&s.center).unwrap();
        assert_relative_eq!(translation, up * -lowest, epsilon = 1e-9);
    }

    #[test]
    fn test_ground_transform_is_pure_translation() {
        let scene = MockScene::flat(25.0);
        let s = sphere(8.0);
        let clamper = GroundClamper::default();

        let (_, translation) = clamper.ground_translation(&scene, &s).unwrap();
        let matrix = clamper.ground_transform(&scene, &s).unwrap();
        assert_eq!(matrix, Matrix4::new_translation(&translation));

        let moved = matrix.transform_point(&s.center);
        let height = WGS84.cartographic_from_cartesian(&moved).unwrap().height;
        assert_relative_eq!(height, 30.0 - 24.8, epsilon = 1e-4);
    }

    #[test]
    fn test_ground_transform_without_hits_is_none() {
        let scene = MockScene::missing();
        assert!(GroundClamper::default()
            .ground_transform(&scene, &sphere(8.0))
            .is_none());
    }

    #[test]
    fn test_custom_config_is_kept() {
        let config = ClampConfig {
            sample_step: 3,
            ray_origin_height: 250.0,
            clearance_bias: 0.5,
        };
        let clamper = GroundClamper::new(config.clone()).unwrap();
        assert_eq!(clamper.config(), &config);

        let scene = MockScene::flat(10.0);
        clamper.sample_footprint(&scene, &sphere(6.0));
        let rays = scene.rays.borrow();
        let origin = WGS84.cartographic_from_cartesian(&rays[0].origin).unwrap();
        assert!((origin.height - 250.0).abs() < 0.01);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = GroundClamper::new(ClampConfig {
            sample_step: 0,
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
