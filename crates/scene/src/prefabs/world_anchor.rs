use foundation::math::{Vec3, WORLD_SIZE};

use crate::components::Light;
use crate::error::SceneError;
use crate::graph::SceneGraph;
use crate::node::{Capabilities, NodeId, NodePayload};

/// Direction the sun light shines from, in anchor space.
pub const SUN_POSITION: Vec3 = Vec3::new(0.0, 800.0, 1000.0);

/// Root of all geo content: a derived-transform container whose matrix the
/// world anchor synchronizer owns.
///
/// The pivot sits at the center of the zoom-0 world. Ambient and directional
/// lights ride along as children so lighting follows the map.
pub fn spawn_world_anchor(graph: &mut SceneGraph) -> Result<NodeId, SceneError> {
    let anchor = graph.spawn_derived(
        "world-anchor",
        NodePayload::Group,
        Capabilities::GEO_CONTAINER,
        Vec3::new(WORLD_SIZE / 2.0, WORLD_SIZE / 2.0, 0.0),
    );

    let ambient = graph.spawn(
        "ambient-light",
        NodePayload::Light(Light::ambient(0xcccccc)),
        Capabilities::NONE,
    );
    graph.add_child(anchor, ambient)?;

    let sun = graph.spawn(
        "sun-light",
        NodePayload::Light(Light::directional(0xffffff, 0.5, SUN_POSITION)),
        Capabilities::NONE,
    );
    graph.local_transform_mut(sun)?.position = SUN_POSITION;
    graph.add_child(anchor, sun)?;

    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::spawn_world_anchor;
    use crate::graph::SceneGraph;
    use crate::node::{Capabilities, NodePayload, NodeTransform};
    use foundation::math::Vec3;

    #[test]
    fn anchor_is_a_derived_geo_container_with_lights() {
        let mut graph = SceneGraph::new();
        let anchor = spawn_world_anchor(&mut graph).expect("anchor");

        let node = graph.node(anchor).expect("node");
        assert!(node.has(Capabilities::GEO_CONTAINER));
        assert!(node.has(Capabilities::DERIVED));
        let NodeTransform::Derived(t) = node.transform() else {
            panic!("anchor transform must be derived");
        };
        assert_eq!(t.pivot(), Vec3::new(256.0, 256.0, 0.0));

        let lights = node
            .children()
            .iter()
            .filter(|c| {
                matches!(
                    graph.node(**c).expect("child").payload,
                    NodePayload::Light(_)
                )
            })
            .count();
        assert_eq!(lights, 2);
        assert!(graph.visible_meshes().is_empty());
    }
}
