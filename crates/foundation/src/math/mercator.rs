//! Spherical Mercator projection into the overlay's world-pixel space.
//!
//! World space is the tile pyramid's zoom-0 pixel space (`WORLD_SIZE` pixels
//! across), centered on (lon 0, lat 0) and mirrored on both axes. The world
//! anchor matrix undoes the mirroring and applies pan/zoom, so everything
//! placed through `project_to_world` tracks the map.

use std::f64::consts::PI;

use super::Vec3;

/// Width of the world in pixels at zoom 0.
pub const WORLD_SIZE: f64 = 512.0;
/// Tile edge in pixels used by the map's pixel convention.
pub const TILE_SIZE: f64 = 512.0;
/// Spherical Mercator (EPSG:3857) earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;
/// Equatorial circumference in meters.
pub const EARTH_CIRCUMFERENCE: f64 = 40_075_000.0;
pub const DEG2RAD: f64 = PI / 180.0;
pub const RAD2DEG: f64 = 180.0 / PI;
/// Meters-on-the-sphere to world-pixel factor (`K`).
pub const PROJECTION_WORLD_SIZE: f64 = WORLD_SIZE / (EARTH_RADIUS * PI) / 2.0;

/// A geographic position in degrees and meters above the ellipsoid.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct GeoCoordinate {
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
}

impl GeoCoordinate {
    pub fn new(lon: f64, lat: f64, alt: f64) -> Self {
        Self { lon, lat, alt }
    }
}

/// Forward spherical Mercator into world space.
pub fn project_to_world(lon: f64, lat: f64, alt: f64) -> Vec3 {
    let x = -EARTH_RADIUS * lon * DEG2RAD * PROJECTION_WORLD_SIZE;
    let y = -EARTH_RADIUS * (PI * 0.25 + 0.5 * lat * DEG2RAD).tan().ln() * PROJECTION_WORLD_SIZE;
    let z = alt * meters_per_world_unit(lat);
    Vec3::new(x, y, z)
}

/// Inverse of [`project_to_world`].
pub fn unproject_from_world(p: Vec3) -> GeoCoordinate {
    let k = EARTH_RADIUS * PROJECTION_WORLD_SIZE;
    let lon = -p.x / (k * DEG2RAD);
    let lat = (2.0 * (-p.y / k).exp().atan() - 0.5 * PI) * RAD2DEG;
    let alt = p.z / meters_per_world_unit(lat);
    GeoCoordinate::new(lon, lat, alt)
}

/// World units per meter at `lat_deg`.
///
/// Objects whose internal units are meters get scaled by this so they keep
/// their real size under Mercator's latitude stretch.
pub fn meters_per_world_unit(lat_deg: f64) -> f64 {
    (WORLD_SIZE / (lat_deg * DEG2RAD).cos()).abs() / EARTH_CIRCUMFERENCE
}

/// Absolute map pixel x of `lon` for a world `world_size` pixels wide.
pub fn lng_x(lon: f64, world_size: f64) -> f64 {
    (180.0 + lon) * world_size / 360.0
}

/// Absolute map pixel y of `lat` (y grows southwards).
pub fn lat_y(lat: f64, world_size: f64) -> f64 {
    let y = RAD2DEG * (PI / 4.0 + lat * PI / 360.0).tan().ln();
    (180.0 - y) * world_size / 360.0
}

/// Longitude at map pixel `x`.
pub fn x_lng(x: f64, world_size: f64) -> f64 {
    x * 360.0 / world_size - 180.0
}

/// Latitude at map pixel `y`.
pub fn y_lat(y: f64, world_size: f64) -> f64 {
    let y2 = 180.0 - y * 360.0 / world_size;
    360.0 / PI * (y2 * DEG2RAD).exp().atan() - 90.0
}
