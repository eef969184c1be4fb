use runtime::Frame;
use scene::{NodeId, SceneGraph};

use crate::placement::PlacementError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// A group of placed objects that share a lifecycle.
pub trait Layer {
    fn id(&self) -> LayerId;

    /// Build the layer's nodes under `container`, a geo container.
    fn attach(&mut self, graph: &mut SceneGraph, container: NodeId) -> Result<(), PlacementError>;

    /// Remove every node the layer created. Safe to call more than once.
    fn dispose(&mut self, graph: &mut SceneGraph);

    /// Per-frame state update; most layers are static.
    fn update(&mut self, _graph: &mut SceneGraph, _frame: Frame) {}
}

/// Attached layers in attach order.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn Layer>>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id()).collect()
    }

    /// Attach `layer` and keep it. A layer that fails to attach is disposed
    /// and dropped.
    pub fn push(
        &mut self,
        mut layer: Box<dyn Layer>,
        graph: &mut SceneGraph,
        container: NodeId,
    ) -> Result<LayerId, PlacementError> {
        if let Err(e) = layer.attach(graph, container) {
            layer.dispose(graph);
            return Err(e);
        }
        let id = layer.id();
        self.layers.push(layer);
        Ok(id)
    }

    pub fn update(&mut self, graph: &mut SceneGraph, frame: Frame) {
        for layer in &mut self.layers {
            layer.update(graph, frame);
        }
    }

    /// Dispose and drop the layer with `id`. Returns `false` if there is none.
    pub fn remove(&mut self, id: LayerId, graph: &mut SceneGraph) -> bool {
        let Some(pos) = self.layers.iter().position(|l| l.id() == id) else {
            return false;
        };
        let mut layer = self.layers.remove(pos);
        layer.dispose(graph);
        true
    }

    pub fn clear(&mut self, graph: &mut SceneGraph) {
        for mut layer in self.layers.drain(..) {
            layer.dispose(graph);
        }
    }
}
