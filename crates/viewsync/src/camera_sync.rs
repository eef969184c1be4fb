use std::cell::RefCell;
use std::rc::Rc;

use foundation::math::{Mat4, Vec3};
use runtime::{SubscriptionId, ViewSource, ViewportPose};
use scene::SyncedCamera;
use tracing::{debug, warn};

use crate::frustum::compute_frustum;

/// Camera-to-world matrix for a map tilted by `pitch` and rotated by
/// `bearing`, looking at the origin from `distance` away.
///
/// Composed as `Rz(bearing) · Rx(pitch) · Tz(distance)`: the camera first
/// backs off along its local Z, then tilts, then turns.
pub fn camera_world_matrix(pitch: f64, bearing: f64, distance: f64) -> Mat4 {
    let mut world = Mat4::IDENTITY;
    world
        .premultiply(&Mat4::translation(Vec3::new(0.0, 0.0, distance)))
        .premultiply(&Mat4::rotation_x(pitch))
        .premultiply(&Mat4::rotation_z(bearing));
    world
}

/// Overwrite the camera's projection and world matrices from `pose`.
///
/// Both matrices depend only on `pose`, so repeated calls with the same pose
/// produce identical results.
pub fn sync_camera(camera: &mut SyncedCamera, pose: &ViewportPose) {
    let frustum = compute_frustum(camera.fov_y(), pose.aspect(), pose.height, pose.pitch);
    camera.set_derived_projection(frustum.aspect, frustum.far, frustum.projection);
    camera.set_derived_world(camera_world_matrix(
        pose.pitch,
        pose.bearing,
        frustum.camera_to_center_distance,
    ));
    debug!(
        far = frustum.far,
        distance = frustum.camera_to_center_distance,
        pitch = pose.pitch,
        bearing = pose.bearing,
        "camera synchronized"
    );
}

/// Keeps a shared camera in step with a map.
#[derive(Debug, Clone)]
pub struct CameraSynchronizer {
    camera: Rc<RefCell<SyncedCamera>>,
}

impl CameraSynchronizer {
    /// Syncs once against `pose` so the camera is valid before any
    /// notification arrives.
    pub fn new(camera: Rc<RefCell<SyncedCamera>>, pose: &ViewportPose) -> Self {
        let sync = Self { camera };
        sync.sync(pose);
        sync
    }

    pub fn camera(&self) -> &Rc<RefCell<SyncedCamera>> {
        &self.camera
    }

    /// Returns `false` and leaves the camera as it was while a caller holds a
    /// borrow of it. The next view change catches up.
    pub fn sync(&self, pose: &ViewportPose) -> bool {
        let Ok(mut camera) = self.camera.try_borrow_mut() else {
            warn!("camera is borrowed during a view change; sync skipped");
            return false;
        };
        sync_camera(&mut camera, pose);
        true
    }

    /// Register for view changes on `map`. The returned id unsubscribes.
    pub fn subscribe(self, map: &mut dyn ViewSource) -> SubscriptionId {
        map.subscribe_to_view_change(Box::new(move |pose| {
            self.sync(pose);
        }))
    }
}
