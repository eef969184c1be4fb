use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use foundation::math::{Mat4, TILE_SIZE, Vec3};
use runtime::{SubscriptionId, ViewSource, ViewportPose};
use scene::{DerivedTransform, NodeId, SceneError, SceneGraph};
use tracing::{debug, warn};

/// Model matrix of the world anchor for `pose`.
///
/// Built by successive pre-multiplication of a half turn about Z, the
/// half-tile center correction, the zoom scale and the pan offset, in that
/// order. The half turn and the center correction reproduce the map's pixel
/// convention; keep the exact sequence.
pub fn anchor_matrix(pose: &ViewportPose) -> Mat4 {
    let scale = pose.scale();
    let mut m = Mat4::IDENTITY;
    m.premultiply(&Mat4::rotation_z(PI))
        .premultiply(&Mat4::translation(Vec3::new(
            TILE_SIZE / 2.0,
            -TILE_SIZE / 2.0,
            0.0,
        )))
        .premultiply(&Mat4::scale(Vec3::splat(scale)))
        .premultiply(&Mat4::translation(Vec3::new(
            -pose.center_x,
            pose.center_y,
            0.0,
        )));
    m
}

pub fn sync_anchor(anchor: &mut DerivedTransform, pose: &ViewportPose) {
    anchor.set_derived_matrix(anchor_matrix(pose));
}

/// Keeps the world anchor node of a shared graph in step with a map.
#[derive(Debug, Clone)]
pub struct AnchorSynchronizer {
    graph: Rc<RefCell<SceneGraph>>,
    anchor: NodeId,
}

impl AnchorSynchronizer {
    /// Fails if `anchor` is not a derived node of `graph`. Syncs once against
    /// `pose` on success.
    pub fn new(
        graph: Rc<RefCell<SceneGraph>>,
        anchor: NodeId,
        pose: &ViewportPose,
    ) -> Result<Self, SceneError> {
        {
            let mut g = graph.borrow_mut();
            sync_anchor(g.derived_transform_mut(anchor)?, pose);
        }
        Ok(Self { graph, anchor })
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    /// Returns `Ok(false)` and leaves the anchor as it was while a caller
    /// holds a borrow of the graph. The next view change catches up.
    pub fn sync(&self, pose: &ViewportPose) -> Result<bool, SceneError> {
        let Ok(mut graph) = self.graph.try_borrow_mut() else {
            warn!("scene graph is borrowed during a view change; anchor sync skipped");
            return Ok(false);
        };
        sync_anchor(graph.derived_transform_mut(self.anchor)?, pose);
        debug!(
            zoom = pose.zoom,
            center_x = pose.center_x,
            center_y = pose.center_y,
            "anchor synchronized"
        );
        Ok(true)
    }

    /// Register for view changes on `map`. The returned id unsubscribes.
    ///
    /// An anchor removed from the graph after subscribing is reported once per
    /// notification and otherwise ignored.
    pub fn subscribe(self, map: &mut dyn ViewSource) -> SubscriptionId {
        map.subscribe_to_view_change(Box::new(move |pose| {
            if let Err(err) = self.sync(pose) {
                warn!(%err, "world anchor not synchronized");
            }
        }))
    }
}
