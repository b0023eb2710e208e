//! Synthetic model surfaces draped over the ellipsoid.
//!
//! A surface maps a geodetic position to the height of the model's outer
//! surface at that position, or `None` where the model has no geometry.

use geo_math::{Cartographic, Ellipsoid};
use nalgebra::Point3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Height field of a model surface.
pub trait SurfaceModel {
    /// Surface height in metres at `position`, `None` outside the model.
    fn height_at(&self, position: &Cartographic) -> Option<f64>;
}

/// Gaussian mound added on top of a model's base height
#[derive(Debug, Clone, Copy)]
pub struct Mound {
    /// East offset from the model centre (metres)
    pub east_m: f64,
    /// North offset from the model centre (metres)
    pub north_m: f64,
    /// Peak height above the base (metres, may be negative for a pit)
    pub amplitude_m: f64,
    /// Standard deviation of the mound (metres)
    pub sigma_m: f64,
}

/// A disc-shaped model authored at an arbitrary height, with optional mounds.
///
/// Models a photogrammetry tileset floating above (or sunk below) the
/// ellipsoid by `base_height_m`.
#[derive(Debug, Clone)]
pub struct OffsetModel {
    ellipsoid: Ellipsoid,
    center: Cartographic,
    center_surface: Point3<f64>,
    east: nalgebra::Vector3<f64>,
    north: nalgebra::Vector3<f64>,
    footprint_radius_m: f64,
    base_height_m: f64,
    mounds: Vec<Mound>,
}

impl OffsetModel {
    /// Flat disc of `footprint_radius_m` centred at `center`, at `base_height_m`.
    pub fn new(
        ellipsoid: Ellipsoid,
        center: Cartographic,
        footprint_radius_m: f64,
        base_height_m: f64,
    ) -> Self {
        let center_surface =
            ellipsoid.cartesian_from_radians(center.longitude, center.latitude, 0.0);
        let (sin_lon, cos_lon) = center.longitude.sin_cos();
        let (sin_lat, cos_lat) = center.latitude.sin_cos();
        let east = nalgebra::Vector3::new(-sin_lon, cos_lon, 0.0);
        let north = nalgebra::Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);

        Self {
            ellipsoid,
            center,
            center_surface,
            east,
            north,
            footprint_radius_m,
            base_height_m,
            mounds: Vec::new(),
        }
    }

    pub fn with_mound(mut self, mound: Mound) -> Self {
        self.mounds.push(mound);
        self
    }

    /// Scatter `count` random mounds and pits across the footprint.
    ///
    /// Heights stay within `±max_amplitude_m` of the base.
    pub fn with_random_mounds(mut self, count: usize, max_amplitude_m: f64, seed: u64) -> Self {
        let reach = self.footprint_radius_m * 0.8;
        if max_amplitude_m <= 0.0 || reach <= 0.0 {
            return self;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..count {
            self.mounds.push(Mound {
                east_m: rng.gen_range(-reach..reach),
                north_m: rng.gen_range(-reach..reach),
                amplitude_m: rng.gen_range(-max_amplitude_m..max_amplitude_m),
                sigma_m: rng.gen_range(1.0..(self.footprint_radius_m / 3.0).max(1.5)),
            });
        }
        self
    }

    pub fn center(&self) -> &Cartographic {
        &self.center
    }

    pub fn base_height_m(&self) -> f64 {
        self.base_height_m
    }

    /// Horizontal (east, north) offset of `position` from the model centre.
    fn local_offset(&self, position: &Cartographic) -> (f64, f64) {
        let surface = self
            .ellipsoid
            .cartesian_from_radians(position.longitude, position.latitude, 0.0);
        let delta = surface - self.center_surface;
        (delta.dot(&self.east), delta.dot(&self.north))
    }
}

impl SurfaceModel for OffsetModel {
    fn height_at(&self, position: &Cartographic) -> Option<f64> {
        let (east, north) = self.local_offset(position);
        if east * east + north * north > self.footprint_radius_m * self.footprint_radius_m {
            return None;
        }

        let relief: f64 = self
            .mounds
            .iter()
            .map(|m| {
                let d2 = (east - m.east_m).powi(2) + (north - m.north_m).powi(2);
                m.amplitude_m * (-d2 / (2.0 * m.sigma_m * m.sigma_m)).exp()
            })
            .sum();

        Some(self.base_height_m + relief)
    }
}
