use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle is stale or was never issued by this graph.
    UnknownNode(NodeId),
    /// Local transforms cannot be set on a node whose matrix is derived.
    DerivedTransform(NodeId),
    /// The node owns its transform; there is no derived matrix to set.
    NotDerived(NodeId),
    /// Re-parenting would make a node its own ancestor.
    Cycle(NodeId),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::UnknownNode(id) => write!(f, "unknown scene node #{}", id.index()),
            SceneError::DerivedTransform(id) => {
                write!(f, "scene node #{} has a derived transform", id.index())
            }
            SceneError::NotDerived(id) => {
                write!(f, "scene node #{} does not have a derived transform", id.index())
            }
            SceneError::Cycle(id) => {
                write!(f, "scene node #{} cannot become its own ancestor", id.index())
            }
        }
    }
}

impl std::error::Error for SceneError {}
