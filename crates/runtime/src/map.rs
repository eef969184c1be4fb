use crate::event_bus::{SubscriptionId, ViewChangeBus, ViewChangeCallback, ViewSource};
use crate::viewport::{MAX_PITCH, ViewportPose};

/// In-process map: owns a pose and pushes every change to its subscribers.
///
/// Stands in for the interactive map when running headless. Each mutator
/// changes the pose first and then notifies synchronously.
#[derive(Debug)]
pub struct SimulatedMap {
    pose: ViewportPose,
    bus: ViewChangeBus,
}

impl SimulatedMap {
    pub fn new(pose: ViewportPose) -> Self {
        Self {
            pose,
            bus: ViewChangeBus::new(),
        }
    }

    pub fn notification_count(&self) -> u64 {
        self.bus.notification_count()
    }

    pub fn set_pose(&mut self, pose: ViewportPose) {
        self.pose = pose;
        self.bus.notify(&self.pose);
    }

    /// Center on `(lon, lat)` at `zoom`, keeping tilt and rotation.
    pub fn jump_to(&mut self, lon: f64, lat: f64, zoom: f64) {
        self.pose.zoom = zoom.max(0.0);
        self.pose.center_on(lon, lat);
        self.bus.notify(&self.pose);
    }

    /// Drag the map by a screen-pixel delta (unrotated).
    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) {
        self.pose.center_x += dx_px;
        self.pose.center_y += dy_px;
        self.bus.notify(&self.pose);
    }

    /// Change zoom around the current center.
    pub fn zoom_to(&mut self, zoom: f64) {
        let zoom = zoom.max(0.0);
        let factor = (zoom - self.pose.zoom).exp2();
        self.pose.center_x *= factor;
        self.pose.center_y *= factor;
        self.pose.zoom = zoom;
        self.bus.notify(&self.pose);
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.pose.pitch = pitch.clamp(0.0, MAX_PITCH);
        self.bus.notify(&self.pose);
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        self.pose.bearing = bearing;
        self.bus.notify(&self.pose);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.pose.width = width;
        self.pose.height = height;
        self.bus.notify(&self.pose);
    }
}

impl ViewSource for SimulatedMap {
    fn pose(&self) -> ViewportPose {
        self.pose
    }

    fn subscribe_to_view_change(&mut self, callback: ViewChangeCallback) -> SubscriptionId {
        self.bus.subscribe(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }
}
