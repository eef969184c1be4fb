use foundation::handles::Handle;
use foundation::math::{GeoCoordinate, Mat4, Vec3};

use crate::components::{ComponentBounds, Drawable3D, Light};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub Handle);

impl NodeId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

/// What a node can do, independent of what it carries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    /// May host geo-anchored content (the world anchor and layers under it).
    pub const GEO_CONTAINER: Capabilities = Capabilities(1 << 0);
    /// Positioned and scaled from a geographic coordinate.
    pub const GEO_ANCHOR: Capabilities = Capabilities(1 << 1);
    /// Transform is written by a synchronizer only.
    pub const DERIVED: Capabilities = Capabilities(1 << 2);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NodePayload {
    Group,
    Mesh(Drawable3D),
    Light(Light),
}

/// Position and scale owned by the node itself. Composed as `T · S`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl LocalTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::translation(self.position) * Mat4::scale(self.scale)
    }
}

/// Transform that is never composed from position/rotation/scale.
///
/// The only mutation is replacing the whole matrix. `pivot` is recorded at
/// construction and is not folded into the matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DerivedTransform {
    pivot: Vec3,
    matrix: Mat4,
}

impl DerivedTransform {
    pub fn new(pivot: Vec3) -> Self {
        Self {
            pivot,
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn set_derived_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NodeTransform {
    Local(LocalTransform),
    Derived(DerivedTransform),
}

impl NodeTransform {
    pub fn matrix(&self) -> Mat4 {
        match self {
            NodeTransform::Local(t) => t.matrix(),
            NodeTransform::Derived(t) => t.matrix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub payload: NodePayload,
    pub visible: bool,
    /// Local-space extent used by picking.
    pub bounds: Option<ComponentBounds>,
    /// Last coordinate this node was placed at.
    pub coordinates: Option<GeoCoordinate>,
    /// Latitude-scaling preference from the last placement.
    pub scale_to_latitude: Option<bool>,
    pub(crate) capabilities: Capabilities,
    pub(crate) transform: NodeTransform,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    pub(crate) fn new(name: impl Into<String>, payload: NodePayload, capabilities: Capabilities) -> Self {
        let transform = if capabilities.contains(Capabilities::DERIVED) {
            NodeTransform::Derived(DerivedTransform::new(Vec3::ZERO))
        } else {
            NodeTransform::Local(LocalTransform::default())
        };
        Self {
            name: name.into(),
            payload,
            visible: true,
            bounds: None,
            coordinates: None,
            scale_to_latitude: None,
            capabilities,
            transform,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn drawable(&self) -> Option<&Drawable3D> {
        match &self.payload {
            NodePayload::Mesh(d) => Some(d),
            _ => None,
        }
    }

    pub fn drawable_mut(&mut self) -> Option<&mut Drawable3D> {
        match &mut self.payload {
            NodePayload::Mesh(d) => Some(d),
            _ => None,
        }
    }
}
