use runtime::Frame;
use scene::components::Drawable3D;
use scene::{Capabilities, NodeId, NodePayload, NodeTransform, SceneError, SceneGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::GrowthTween;
use crate::layer::{Layer, LayerId};
use crate::placement::{PlacementError, PlacementOptions, PreScale, place_at_coordinate};

/// Side of a pillar's square base, in meters.
pub const PILLAR_FOOTPRINT_M: f64 = 100_000.0;
pub const PILLAR_COLOR: u32 = 0x00ff00;

pub const GROWTH_DELAY_S: f64 = 0.5;
pub const GROWTH_DURATION_S: f64 = 1.0;

/// One bar: where it stands and how tall it grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarSpec {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub alt: f64,
    /// Target height in meters.
    pub height: f64,
    #[serde(default = "default_footprint")]
    pub footprint: f64,
    #[serde(default = "default_color")]
    pub color: u32,
    #[serde(default)]
    pub pre_scale: PreScale,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_to_latitude: Option<bool>,
}

fn default_footprint() -> f64 {
    PILLAR_FOOTPRINT_M
}

fn default_color() -> u32 {
    PILLAR_COLOR
}

impl PillarSpec {
    pub fn new(lon: f64, lat: f64, height: f64) -> Self {
        Self {
            lon,
            lat,
            alt: 0.0,
            height,
            footprint: PILLAR_FOOTPRINT_M,
            color: PILLAR_COLOR,
            pre_scale: PreScale::default(),
            scale_to_latitude: None,
        }
    }

    fn placement_options(&self) -> PlacementOptions {
        PlacementOptions {
            pre_scale: self.pre_scale.clone(),
            scale_to_latitude: self.scale_to_latitude,
        }
    }
}

/// Three bars across the western United States.
pub fn demo_pillars() -> Vec<PillarSpec> {
    [
        (-102.41356, 3_000_000.0),
        (-112.41356, 2_000_000.0),
        (-132.41356, 1_000_000.0),
    ]
    .into_iter()
    .map(|(lon, height)| PillarSpec {
        scale_to_latitude: Some(true),
        ..PillarSpec::new(lon, 37.77577, height)
    })
    .collect()
}

/// Set a pillar mesh's height (its z scale). Heights below 1 clamp to 1.
pub fn set_pillar_height(graph: &mut SceneGraph, mesh: NodeId, height: f64) -> Result<(), SceneError> {
    graph.local_transform_mut(mesh)?.scale.z = height.max(1.0);
    Ok(())
}

pub fn pillar_height(graph: &SceneGraph, mesh: NodeId) -> Result<f64, SceneError> {
    match graph.node(mesh)?.transform() {
        NodeTransform::Local(t) => Ok(t.scale.z),
        NodeTransform::Derived(_) => Err(SceneError::DerivedTransform(mesh)),
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct PlacedPillar {
    mesh: NodeId,
    anchor: NodeId,
    growth: GrowthTween,
}

/// Bars that grow from the ground to their target height once attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PillarLayer {
    id: LayerId,
    specs: Vec<PillarSpec>,
    placed: Vec<PlacedPillar>,
}

impl PillarLayer {
    pub fn new(id: u64, specs: Vec<PillarSpec>) -> Self {
        Self {
            id: LayerId(id),
            specs,
            placed: Vec::new(),
        }
    }

    pub fn demo(id: u64) -> Self {
        Self::new(id, demo_pillars())
    }

    pub fn specs(&self) -> &[PillarSpec] {
        &self.specs
    }

    /// Mesh nodes in placement order; empty until attached.
    pub fn meshes(&self) -> Vec<NodeId> {
        self.placed.iter().map(|p| p.mesh).collect()
    }

    /// Geo anchors in placement order; empty until attached.
    pub fn anchors(&self) -> Vec<NodeId> {
        self.placed.iter().map(|p| p.anchor).collect()
    }

    pub fn is_growing(&self, frame: &Frame) -> bool {
        self.placed.iter().any(|p| !p.growth.is_finished(frame.time))
    }
}

impl Layer for PillarLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn attach(&mut self, graph: &mut SceneGraph, container: NodeId) -> Result<(), PlacementError> {
        for (i, spec) in self.specs.iter().enumerate() {
            let drawable = Drawable3D::column(spec.footprint, spec.color);
            let mesh = graph.spawn(
                format!("pillar-{i}"),
                NodePayload::Mesh(drawable),
                Capabilities::NONE,
            );
            graph.node_mut(mesh)?.bounds = Some(drawable.shape.bounds());

            let anchor = match place_at_coordinate(
                graph,
                mesh,
                container,
                spec.lon,
                spec.lat,
                spec.alt,
                &spec.placement_options(),
            ) {
                Ok(anchor) => anchor,
                Err(e) => {
                    let _ = graph.remove(mesh);
                    return Err(e);
                }
            };

            let start = pillar_height(graph, mesh)?;
            self.placed.push(PlacedPillar {
                mesh,
                anchor,
                growth: GrowthTween::new(start, spec.height, GROWTH_DELAY_S, GROWTH_DURATION_S),
            });
        }
        debug!(layer = self.id.0, pillars = self.placed.len(), "pillar layer attached");
        Ok(())
    }

    fn dispose(&mut self, graph: &mut SceneGraph) {
        for pillar in self.placed.drain(..) {
            // Already gone if the container was removed first.
            let _ = graph.remove(pillar.anchor);
        }
    }

    fn update(&mut self, graph: &mut SceneGraph, frame: Frame) {
        for pillar in &mut self.placed {
            let height = pillar.growth.sample(frame.time);
            // Bars removed behind the layer's back just stop animating.
            let _ = set_pillar_height(graph, pillar.mesh, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PILLAR_COLOR, PILLAR_FOOTPRINT_M, PillarLayer, PillarSpec, demo_pillars, pillar_height,
        set_pillar_height,
    };
    use crate::layer::Layer;
    use crate::placement::PreScale;
    use foundation::math::{Vec3, meters_per_world_unit, project_to_world};
    use pretty_assertions::assert_eq;
    use runtime::FrameClock;
    use scene::picking::{PickOptions, Ray, pick_ray};
    use scene::prefabs::spawn_world_anchor;
    use scene::{Capabilities, SceneGraph};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn demo_places_three_bars_at_their_coordinates() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let mut layer = PillarLayer::demo(1);
        layer.attach(&mut graph, container).expect("attach");

        let anchors = layer.anchors();
        assert_eq!(anchors.len(), 3);
        for (anchor, spec) in anchors.iter().zip(demo_pillars()) {
            let node = graph.node(*anchor).expect("anchor");
            assert!(node.has(Capabilities::GEO_ANCHOR));
            assert_eq!(node.parent(), Some(container));
            let t = *graph.local_transform_mut(*anchor).expect("local");
            assert_eq!(t.position, project_to_world(spec.lon, spec.lat, 0.0));
            assert_eq!(t.scale, Vec3::splat(meters_per_world_unit(spec.lat)));
        }
        for mesh in layer.meshes() {
            assert_eq!(pillar_height(&graph, mesh).expect("height"), 1.0);
        }
    }

    #[test]
    fn bars_grow_to_target_height() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let mut layer = PillarLayer::demo(1);
        layer.attach(&mut graph, container).expect("attach");

        let mut clock = FrameClock::new(60.0);
        let first = clock.tick();
        layer.update(&mut graph, first);
        assert!(layer.is_growing(&first));

        let mut last = first;
        let mut prev = 1.0;
        for _ in 0..120 {
            last = clock.tick();
            layer.update(&mut graph, last);
            let h = pillar_height(&graph, layer.meshes()[0]).expect("height");
            assert!(h >= prev);
            prev = h;
        }
        // 120 frames at 60 Hz is past the 0.5 s delay + 1 s growth.
        assert!(!layer.is_growing(&last));
        let heights: Vec<f64> = layer
            .meshes()
            .into_iter()
            .map(|m| pillar_height(&graph, m).expect("height"))
            .collect();
        assert_eq!(heights, vec![3_000_000.0, 2_000_000.0, 1_000_000.0]);
    }

    #[test]
    fn height_clamps_to_one() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let mut layer = PillarLayer::new(2, vec![PillarSpec::new(0.0, 0.0, 10.0)]);
        layer.attach(&mut graph, container).expect("attach");
        let mesh = layer.meshes()[0];

        set_pillar_height(&mut graph, mesh, 0.25).expect("set");
        assert_eq!(pillar_height(&graph, mesh).expect("height"), 1.0);
        set_pillar_height(&mut graph, mesh, 42.0).expect("set");
        assert_eq!(pillar_height(&graph, mesh).expect("height"), 42.0);
    }

    #[test]
    fn placed_bars_are_pickable_from_above() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let mut layer = PillarLayer::new(3, vec![PillarSpec::new(0.0, 0.0, 500_000.0)]);
        layer.attach(&mut graph, container).expect("attach");
        let mesh = layer.meshes()[0];
        set_pillar_height(&mut graph, mesh, 500_000.0).expect("set");

        // Anchor matrix is identity here, so world space is projected space.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = pick_ray(&graph, ray, PickOptions::default()).expect("hit");
        assert_eq!(hit.node, mesh);
        let top = 500_000.0 * meters_per_world_unit(0.0);
        assert_close(hit.point.z, top, 1e-9);
    }

    #[test]
    fn dispose_removes_everything_it_created() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let before = graph.len();
        let mut layer = PillarLayer::demo(1);
        layer.attach(&mut graph, container).expect("attach");
        assert_eq!(graph.len(), before + 6);

        layer.dispose(&mut graph);
        assert_eq!(graph.len(), before);
        assert!(layer.meshes().is_empty());
        layer.dispose(&mut graph);
    }

    #[test]
    fn pillar_entry_parses_with_defaults() {
        let spec: PillarSpec =
            serde_json::from_str(r#"{ "lon": 10.5, "lat": -3.0, "height": 250.0 }"#).expect("json");
        assert_eq!(spec, PillarSpec::new(10.5, -3.0, 250.0));
        assert_eq!(spec.footprint, PILLAR_FOOTPRINT_M);
        assert_eq!(spec.color, PILLAR_COLOR);

        let spec: PillarSpec = serde_json::from_str(
            r#"{ "lon": 0, "lat": 0, "height": 1, "pre_scale": [1, 1], "scale_to_latitude": false }"#,
        )
        .expect("json");
        assert_eq!(spec.pre_scale, PreScale::Axes(vec![1.0, 1.0]));
        assert_eq!(spec.scale_to_latitude, Some(false));
    }
}
