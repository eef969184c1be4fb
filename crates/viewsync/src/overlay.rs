use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use runtime::{SubscriptionId, ViewSource};
use scene::prefabs::spawn_world_anchor;
use scene::{NodeId, SceneError, SceneGraph, SyncedCamera};
use tracing::info;

use crate::anchor_sync::AnchorSynchronizer;
use crate::camera_sync::CameraSynchronizer;

/// A 3D scene glued to a map.
///
/// Owns the synced camera and a scene graph rooted at the world anchor. Both
/// synchronizers and a resize handler stay subscribed to the map until
/// [`MapOverlay::detach`].
#[derive(Debug)]
pub struct MapOverlay {
    camera: Rc<RefCell<SyncedCamera>>,
    graph: Rc<RefCell<SceneGraph>>,
    anchor: NodeId,
    render_size: Rc<Cell<(f64, f64)>>,
    subscriptions: Vec<SubscriptionId>,
}

impl MapOverlay {
    pub fn attach(map: &mut dyn ViewSource) -> Result<Self, SceneError> {
        let pose = map.pose();

        let camera = Rc::new(RefCell::new(SyncedCamera::new(pose.aspect())));
        let graph = Rc::new(RefCell::new(SceneGraph::new()));
        let anchor = spawn_world_anchor(&mut graph.borrow_mut())?;

        let camera_sync = CameraSynchronizer::new(Rc::clone(&camera), &pose);
        let anchor_sync = AnchorSynchronizer::new(Rc::clone(&graph), anchor, &pose)?;
        let render_size = Rc::new(Cell::new((pose.width, pose.height)));

        let size = Rc::clone(&render_size);
        let subscriptions = vec![
            camera_sync.subscribe(map),
            anchor_sync.subscribe(map),
            map.subscribe_to_view_change(Box::new(move |pose| {
                size.set((pose.width, pose.height));
            })),
        ];

        info!(
            width = pose.width,
            height = pose.height,
            zoom = pose.zoom,
            "overlay attached"
        );

        Ok(Self {
            camera,
            graph,
            anchor,
            render_size,
            subscriptions,
        })
    }

    /// Unsubscribe from `map`. The scene stays readable afterwards but no
    /// longer follows the map.
    pub fn detach(&mut self, map: &mut dyn ViewSource) {
        let removed = self
            .subscriptions
            .drain(..)
            .filter(|id| map.unsubscribe(*id))
            .count();
        info!(removed, "overlay detached");
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Guards from `camera`, `graph` and `graph_mut` should be dropped before
    /// the map changes; a view change arriving while one is held is skipped
    /// by the synchronizer it blocks.
    pub fn camera(&self) -> Ref<'_, SyncedCamera> {
        self.camera.borrow()
    }

    pub fn graph(&self) -> Ref<'_, SceneGraph> {
        self.graph.borrow()
    }

    pub fn graph_mut(&self) -> RefMut<'_, SceneGraph> {
        self.graph.borrow_mut()
    }

    /// The geo container every layer attaches under.
    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    /// Size of the drawing surface, tracked from the latest pose.
    pub fn render_size(&self) -> (f64, f64) {
        self.render_size.get()
    }
}
