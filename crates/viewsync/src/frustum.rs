use std::f64::consts::{FRAC_PI_2, PI};

use foundation::math::Mat4;
use scene::camera::NEAR;

/// Far plane padding so fragments exactly at the horizon are not clipped.
pub const FAR_MARGIN: f64 = 1.01;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frustum {
    pub near: f64,
    pub far: f64,
    pub aspect: f64,
    /// Distance from the camera to the map center, in pixels.
    pub camera_to_center_distance: f64,
    pub projection: Mat4,
}

/// Distance at which one world unit spans one screen pixel at the view center.
pub fn camera_to_center_distance(fov_y: f64, viewport_height: f64) -> f64 {
    0.5 / (fov_y / 2.0).tan() * viewport_height
}

/// Near/far planes and projection for a map tilted by `pitch`.
///
/// The far plane reaches the point where the top edge of the view frustum
/// meets the ground, plus `FAR_MARGIN`.
pub fn compute_frustum(fov_y: f64, aspect: f64, viewport_height: f64, pitch: f64) -> Frustum {
    let aspect = if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    };
    let viewport_height = if viewport_height.is_finite() && viewport_height > 0.0 {
        viewport_height
    } else {
        1.0
    };

    let half_fov = fov_y / 2.0;
    let distance = camera_to_center_distance(fov_y, viewport_height);
    let ground_angle = FRAC_PI_2 + pitch;
    // Law of sines in the camera / frustum top edge / ground triangle.
    let top_half_surface_distance = half_fov.sin() * distance / (PI - ground_angle - half_fov).sin();
    // cos(π/2 - pitch), written as sin(pitch) so pitch 0 contributes exactly nothing.
    let furthest_distance = pitch.sin() * top_half_surface_distance + distance;
    let far = furthest_distance * FAR_MARGIN;

    Frustum {
        near: NEAR,
        far,
        aspect,
        camera_to_center_distance: distance,
        projection: Mat4::perspective_rh_gl(fov_y, aspect, NEAR, far),
    }
}
