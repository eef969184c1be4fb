//! Keeps a 3D camera and scene root in lock-step with a slippy map.
//!
//! On every view change the camera gets a fresh projection and pose and the
//! world anchor gets a fresh pan/zoom matrix. Both are pure functions of the
//! map's pose, so notifications can arrive at any rate.

pub mod anchor_sync;
pub mod camera_sync;
pub mod frustum;
pub mod overlay;

pub use anchor_sync::*;
pub use camera_sync::*;
pub use frustum::*;
pub use overlay::*;
