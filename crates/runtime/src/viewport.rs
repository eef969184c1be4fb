use foundation::math::{WORLD_SIZE, lat_y, lng_x, x_lng, y_lat};
use serde::{Deserialize, Serialize};

/// Snapshot of the map's viewport state.
///
/// Owned by the map; everything downstream only reads it. Angles are radians,
/// `center_x`/`center_y` are absolute map pixels at the current zoom.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportPose {
    pub width: f64,
    pub height: f64,
    /// Tilt away from straight down; the map keeps it within `[0, MAX_PITCH]`.
    #[serde(default)]
    pub pitch: f64,
    /// Rotation about the view axis; any value, wraps mod 2π.
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub zoom: f64,
    #[serde(default)]
    pub center_x: f64,
    #[serde(default)]
    pub center_y: f64,
}

/// Steepest tilt the map allows (60°).
pub const MAX_PITCH: f64 = 60.0 * std::f64::consts::PI / 180.0;

impl Default for ViewportPose {
    fn default() -> Self {
        Self::new(512.0, 512.0)
    }
}

impl ViewportPose {
    /// Untilted, unrotated zoom-0 pose with the pan offset at the pixel origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pitch: 0.0,
            bearing: 0.0,
            zoom: 0.0,
            center_x: 0.0,
            center_y: 0.0,
        }
    }

    /// Pose looking at `(lon, lat)` at `zoom`.
    pub fn centered_on(width: f64, height: f64, lon: f64, lat: f64, zoom: f64) -> Self {
        let mut pose = Self::new(width, height);
        pose.zoom = zoom;
        pose.center_on(lon, lat);
        pose
    }

    /// `2^zoom`.
    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    /// Width of the whole world in pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        WORLD_SIZE * self.scale()
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn center_on(&mut self, lon: f64, lat: f64) {
        let ws = self.world_size();
        self.center_x = lng_x(lon, ws);
        self.center_y = lat_y(lat, ws);
    }

    /// `(lon, lat)` under the viewport center.
    pub fn center_coordinate(&self) -> (f64, f64) {
        let ws = self.world_size();
        (x_lng(self.center_x, ws), y_lat(self.center_y, ws))
    }
}
