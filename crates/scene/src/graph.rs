use foundation::handles::Handle;
use foundation::math::{Mat4, Vec3};

use crate::error::SceneError;
use crate::node::{
    Capabilities, DerivedTransform, LocalTransform, NodeId, NodePayload, NodeTransform, SceneNode,
};

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Arena-backed scene tree.
///
/// Nodes are addressed by generational [`NodeId`]s; removing a node frees its
/// slot and bumps the generation so old ids stop resolving.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a detached node with an identity local transform.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        payload: NodePayload,
        capabilities: Capabilities,
    ) -> NodeId {
        self.insert(SceneNode::new(name, payload, capabilities))
    }

    /// Add a detached node whose matrix only a synchronizer may write.
    pub fn spawn_derived(
        &mut self,
        name: impl Into<String>,
        payload: NodePayload,
        capabilities: Capabilities,
        pivot: Vec3,
    ) -> NodeId {
        let mut node = SceneNode::new(name, payload, capabilities | Capabilities::DERIVED);
        node.transform = NodeTransform::Derived(DerivedTransform::new(pivot));
        self.insert(node)
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId(Handle::new(index, slot.generation));
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId(Handle::new(index, 0))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.0.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.0.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.get(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    /// Attach `child` under `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle(child));
        }
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink `id` from its parent; the node stays in the graph.
    pub fn detach(&mut self, id: NodeId) -> Result<(), SceneError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Remove `id` and its whole subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, SceneError> {
        self.detach(id)?;
        let mut stack = vec![id];
        let mut removed = 0;
        while let Some(next) = stack.pop() {
            let Some(slot) = self.slots.get_mut(next.index() as usize) else {
                continue;
            };
            if slot.generation != next.0.generation() {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(next.index());
            self.len -= 1;
            removed += 1;
            stack.extend(node.children);
        }
        Ok(removed)
    }

    /// True if `ancestor` is `id` or sits above it.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.get(id).and_then(|n| n.parent) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    pub fn local_transform_mut(&mut self, id: NodeId) -> Result<&mut LocalTransform, SceneError> {
        match &mut self.node_mut(id)?.transform {
            NodeTransform::Local(t) => Ok(t),
            NodeTransform::Derived(_) => Err(SceneError::DerivedTransform(id)),
        }
    }

    /// Derived nodes only expose a whole-matrix setter through this handle.
    pub fn derived_transform_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut DerivedTransform, SceneError> {
        match &mut self.node_mut(id)?.transform {
            NodeTransform::Derived(t) => Ok(t),
            NodeTransform::Local(_) => Err(SceneError::NotDerived(id)),
        }
    }

    /// Model matrix of `id`: its ancestors' matrices composed root-first.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut node = self.node(id)?;
        let mut m = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            m = node.transform.matrix() * m;
        }
        Ok(m)
    }

    /// True if `id` and all its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(node) = self.get(c) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// Live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.node
                .as_ref()
                .map(|n| (NodeId(Handle::new(idx as u32, slot.generation)), n))
        })
    }

    /// Visible mesh nodes in slot order.
    pub fn visible_meshes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, n)| matches!(n.payload, NodePayload::Mesh(_)))
            .map(|(id, _)| id)
            .filter(|id| self.is_visible(*id))
            .collect()
    }

    /// Nearest node, starting at `id` itself, that carries `capability`.
    pub fn find_ancestor_with(&self, id: NodeId, capability: Capabilities) -> Option<NodeId> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.get(c)?;
            if node.has(capability) {
                return Some(c);
            }
            cur = node.parent;
        }
        None
    }
}
