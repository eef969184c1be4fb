use foundation::math::{Mat4, Vec3};

/// Vertical field of view of the map camera (radians). Exact; the far-plane
/// and camera distance formulas only match the map at this value.
pub const FOV_Y: f64 = 0.6435011087932844;

/// Near clip plane distance.
pub const NEAR: f64 = 1.0;

/// Far plane used before the first synchronization.
const PLACEHOLDER_FAR: f64 = 10_000.0;

/// Perspective camera whose pose is fully derived from the map.
///
/// There is no position/rotation to edit: projection and world matrices are
/// replaced wholesale by the camera synchronizer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SyncedCamera {
    fov_y: f64,
    near: f64,
    far: f64,
    aspect: f64,
    projection: Mat4,
    world: Mat4,
}

impl SyncedCamera {
    pub fn new(aspect: f64) -> Self {
        Self {
            fov_y: FOV_Y,
            near: NEAR,
            far: PLACEHOLDER_FAR,
            aspect,
            projection: Mat4::perspective_rh_gl(FOV_Y, aspect, NEAR, PLACEHOLDER_FAR),
            world: Mat4::IDENTITY,
        }
    }

    pub fn fov_y(&self) -> f64 {
        self.fov_y
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Camera-to-world transform.
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Option<Mat4> {
        self.world.inverse()
    }

    pub fn position(&self) -> Vec3 {
        self.world.translation_part()
    }

    pub fn set_derived_projection(&mut self, aspect: f64, far: f64, projection: Mat4) {
        self.aspect = aspect;
        self.far = far;
        self.projection = projection;
    }

    pub fn set_derived_world(&mut self, world: Mat4) {
        self.world = world;
    }
}
