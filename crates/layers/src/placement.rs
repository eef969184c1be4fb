use foundation::math::{GeoCoordinate, Vec3};
use scene::{Capabilities, NodeId, NodePayload, SceneError, SceneGraph};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use foundation::math::{meters_per_world_unit, project_to_world};

/// Scale applied to an object's geo anchor before latitude scaling.
///
/// Accepts a bare number or a `[x, y, z]` array in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreScale {
    Uniform(f64),
    Axes(Vec<f64>),
}

impl Default for PreScale {
    fn default() -> Self {
        PreScale::Uniform(1.0)
    }
}

impl PreScale {
    pub fn axes(x: f64, y: f64, z: f64) -> Self {
        PreScale::Axes(vec![x, y, z])
    }

    /// Per-axis factors. Anything other than one finite number or three finite
    /// numbers falls back to `(1, 1, 1)` with a warning.
    pub fn resolve(&self) -> Vec3 {
        match self {
            PreScale::Uniform(s) if s.is_finite() => Vec3::splat(*s),
            PreScale::Axes(v) if v.len() == 3 && v.iter().all(|s| s.is_finite()) => {
                Vec3::new(v[0], v[1], v[2])
            }
            other => {
                warn!(
                    pre_scale = ?other,
                    "invalid pre-scale: expected a number or three numbers, using [1, 1, 1]"
                );
                Vec3::ONE
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementOptions {
    #[serde(default)]
    pub pre_scale: PreScale,
    /// Interpret the object's units as meters at the target latitude.
    /// Unset means `true`. An object placed with `true` keeps it; `false`
    /// only holds for the call that passes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_to_latitude: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// The target node does not carry the geo-container capability.
    NotAContainer(NodeId),
    /// Neither the object nor its parent is a geo anchor.
    NoGeoAnchor(NodeId),
    Scene(SceneError),
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::NotAContainer(id) => {
                write!(f, "scene node #{} is not a geo container", id.index())
            }
            PlacementError::NoGeoAnchor(id) => write!(
                f,
                "scene node #{} has no geo anchor; place it with place_at_coordinate first",
                id.index()
            ),
            PlacementError::Scene(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PlacementError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlacementError::Scene(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SceneError> for PlacementError {
    fn from(e: SceneError) -> Self {
        PlacementError::Scene(e)
    }
}

/// Put `object` under `container` at `(lon, lat, alt)`.
///
/// Unless `object` is already a geo anchor, or sits under one from an earlier
/// placement, it is wrapped in a fresh one, and the anchor is what gets
/// positioned and scaled. Returns the anchor. All checks run before the graph
/// is touched, so a failed call changes nothing.
pub fn place_at_coordinate(
    graph: &mut SceneGraph,
    object: NodeId,
    container: NodeId,
    lon: f64,
    lat: f64,
    alt: f64,
    options: &PlacementOptions,
) -> Result<NodeId, PlacementError> {
    if !graph.node(container)?.has(Capabilities::GEO_CONTAINER) {
        return Err(PlacementError::NotAContainer(container));
    }
    let object_node = graph.node(object)?;
    let existing = if object_node.has(Capabilities::GEO_ANCHOR) {
        Some(object)
    } else {
        geo_anchor_of(graph, object).ok()
    };
    if graph.is_ancestor_or_self(object, container) {
        return Err(SceneError::Cycle(object).into());
    }
    if let Some(anchor) = existing {
        if graph.node(anchor)?.has(Capabilities::DERIVED) {
            return Err(SceneError::DerivedTransform(anchor).into());
        }
        if graph.is_ancestor_or_self(anchor, container) {
            return Err(SceneError::Cycle(anchor).into());
        }
    }

    // A placed object keeps its geo anchor; only the first placement wraps it.
    let anchor = match existing {
        Some(anchor) => anchor,
        None => {
            let name = format!("{}-geo", graph.node(object)?.name);
            let anchor = graph.spawn(name, NodePayload::Group, Capabilities::GEO_ANCHOR);
            graph.add_child(anchor, object)?;
            anchor
        }
    };
    graph.add_child(container, anchor)?;

    move_to_coordinate(graph, object, lon, lat, alt, options)?;
    Ok(anchor)
}

/// Re-position an already placed object. Returns its geo anchor.
///
/// Fails with [`PlacementError::NoGeoAnchor`] and leaves the graph untouched
/// if the object was never placed.
pub fn move_to_coordinate(
    graph: &mut SceneGraph,
    object: NodeId,
    lon: f64,
    lat: f64,
    alt: f64,
    options: &PlacementOptions,
) -> Result<NodeId, PlacementError> {
    let anchor = geo_anchor_of(graph, object)?;

    // Latitude scaling defaults on and, once on, stays on.
    let scale_to_latitude = options.scale_to_latitude.unwrap_or(true)
        || graph.node(object)?.scale_to_latitude == Some(true);
    let mut scale = options.pre_scale.resolve();
    if scale_to_latitude {
        scale = scale * meters_per_world_unit(lat);
    }

    let transform = graph.local_transform_mut(anchor)?;
    transform.scale = scale;
    transform.position = project_to_world(lon, lat, alt);

    let node = graph.node_mut(object)?;
    node.coordinates = Some(GeoCoordinate::new(lon, lat, alt));
    node.scale_to_latitude = Some(scale_to_latitude);
    Ok(anchor)
}

/// The object itself if it is a geo anchor, else its parent if that is one.
pub fn geo_anchor_of(graph: &SceneGraph, object: NodeId) -> Result<NodeId, PlacementError> {
    let node = graph.node(object)?;
    if node.has(Capabilities::GEO_ANCHOR) {
        return Ok(object);
    }
    match node.parent() {
        Some(parent) if graph.node(parent)?.has(Capabilities::GEO_ANCHOR) => Ok(parent),
        _ => Err(PlacementError::NoGeoAnchor(object)),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PlacementError, PlacementOptions, PreScale, move_to_coordinate, place_at_coordinate,
    };
    use foundation::math::{GeoCoordinate, Vec3, meters_per_world_unit, project_to_world};
    use pretty_assertions::assert_eq;
    use scene::components::Drawable3D;
    use scene::prefabs::spawn_world_anchor;
    use scene::{Capabilities, NodeId, NodePayload, SceneError, SceneGraph};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn mesh(graph: &mut SceneGraph) -> NodeId {
        graph.spawn(
            "bar",
            NodePayload::Mesh(Drawable3D::column(10.0, 0x00ff00)),
            Capabilities::NONE,
        )
    }

    #[test]
    fn pre_scale_accepts_numbers_and_triples() {
        assert_eq!(PreScale::Uniform(2.0).resolve(), Vec3::splat(2.0));
        assert_eq!(PreScale::axes(1.0, 2.0, 3.0).resolve(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(PreScale::default().resolve(), Vec3::ONE);
    }

    #[test]
    fn malformed_pre_scale_falls_back_to_one() {
        assert_eq!(PreScale::Axes(vec![2.0, 2.0]).resolve(), Vec3::ONE);
        assert_eq!(PreScale::Axes(vec![1.0, 2.0, 3.0, 4.0]).resolve(), Vec3::ONE);
        assert_eq!(PreScale::Uniform(f64::NAN).resolve(), Vec3::ONE);
        assert_eq!(PreScale::axes(1.0, f64::INFINITY, 1.0).resolve(), Vec3::ONE);
    }

    #[test]
    fn options_parse_from_json() {
        let opts: PlacementOptions =
            serde_json::from_str(r#"{ "pre_scale": [1, 2, 3], "scale_to_latitude": false }"#)
                .expect("json");
        assert_eq!(
            opts,
            PlacementOptions {
                pre_scale: PreScale::Axes(vec![1.0, 2.0, 3.0]),
                scale_to_latitude: Some(false),
            }
        );

        let opts: PlacementOptions = serde_json::from_str(r#"{ "pre_scale": 4 }"#).expect("json");
        assert_eq!(opts.pre_scale, PreScale::Uniform(4.0));
        assert_eq!(opts.scale_to_latitude, None);

        let opts: PlacementOptions = serde_json::from_str("{}").expect("json");
        assert_eq!(opts, PlacementOptions::default());
    }

    #[test]
    fn placement_wraps_positions_and_scales() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let bar = mesh(&mut graph);

        let lat = 37.77577;
        let anchor = place_at_coordinate(
            &mut graph,
            bar,
            container,
            -102.41356,
            lat,
            0.0,
            &PlacementOptions::default(),
        )
        .expect("place");

        assert_ne!(anchor, bar);
        let anchor_node = graph.node(anchor).expect("anchor");
        assert!(anchor_node.has(Capabilities::GEO_ANCHOR));
        assert_eq!(anchor_node.parent(), Some(container));
        assert_eq!(graph.node(bar).expect("bar").parent(), Some(anchor));

        let t = *graph.local_transform_mut(anchor).expect("local");
        assert_eq!(t.position, project_to_world(-102.41356, lat, 0.0));
        assert_eq!(t.scale, Vec3::splat(meters_per_world_unit(lat)));

        let bar_node = graph.node(bar).expect("bar");
        assert_eq!(bar_node.coordinates, Some(GeoCoordinate::new(-102.41356, lat, 0.0)));
        assert_eq!(bar_node.scale_to_latitude, Some(true));
    }

    #[test]
    fn placement_without_latitude_scaling_keeps_pre_scale() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let bar = mesh(&mut graph);
        let opts = PlacementOptions {
            pre_scale: PreScale::axes(2.0, 3.0, 4.0),
            scale_to_latitude: Some(false),
        };
        let anchor =
            place_at_coordinate(&mut graph, bar, container, 10.0, 20.0, 500.0, &opts).expect("place");

        let t = *graph.local_transform_mut(anchor).expect("local");
        assert_eq!(t.scale, Vec3::new(2.0, 3.0, 4.0));
        // Altitude is still converted to world units.
        assert_close(t.position.z, 500.0 * meters_per_world_unit(20.0), 1e-15);
    }

    #[test]
    fn an_existing_geo_anchor_is_positioned_directly() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let group = graph.spawn("group", NodePayload::Group, Capabilities::GEO_ANCHOR);

        let anchor = place_at_coordinate(
            &mut graph,
            group,
            container,
            0.0,
            0.0,
            0.0,
            &PlacementOptions::default(),
        )
        .expect("place");
        assert_eq!(anchor, group);
        assert_eq!(graph.len(), 4);
        // ln(tan(π/4)) is not exactly zero, so y only lands near the origin.
        let p = graph.local_transform_mut(group).expect("local").position;
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn placing_again_reuses_the_geo_anchor() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let bar = mesh(&mut graph);
        let opts = PlacementOptions::default();
        let first =
            place_at_coordinate(&mut graph, bar, container, 0.0, 10.0, 0.0, &opts).expect("place");
        let len = graph.len();

        let second =
            place_at_coordinate(&mut graph, bar, container, 20.0, 30.0, 0.0, &opts).expect("place");
        assert_eq!(second, first);
        assert_eq!(graph.len(), len);
        assert_eq!(graph.node(container).expect("container").children().len(), 3);
        let t = *graph.local_transform_mut(first).expect("local");
        assert_eq!(t.position, project_to_world(20.0, 30.0, 0.0));
        assert_eq!(t.scale, Vec3::splat(meters_per_world_unit(30.0)));
    }

    #[test]
    fn non_container_target_is_rejected_without_mutation() {
        let mut graph = SceneGraph::new();
        let not_container = graph.spawn("plain", NodePayload::Group, Capabilities::NONE);
        let bar = mesh(&mut graph);
        let before = graph.len();

        let err = place_at_coordinate(
            &mut graph,
            bar,
            not_container,
            0.0,
            0.0,
            0.0,
            &PlacementOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, PlacementError::NotAContainer(not_container));
        assert_eq!(graph.len(), before);
        assert_eq!(graph.node(bar).expect("bar").parent(), None);
    }

    #[test]
    fn placing_the_container_inside_itself_is_a_cycle() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let before = graph.len();
        let err = place_at_coordinate(
            &mut graph,
            container,
            container,
            0.0,
            0.0,
            0.0,
            &PlacementOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, PlacementError::Scene(SceneError::Cycle(container)));
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn moving_an_unplaced_object_is_an_error() {
        let mut graph = SceneGraph::new();
        let bar = mesh(&mut graph);
        let err = move_to_coordinate(&mut graph, bar, 1.0, 2.0, 0.0, &PlacementOptions::default())
            .unwrap_err();
        assert_eq!(err, PlacementError::NoGeoAnchor(bar));
        assert_eq!(graph.node(bar).expect("bar").coordinates, None);
        assert!(err.to_string().contains("no geo anchor"));
    }

    #[test]
    fn omitted_latitude_scaling_turns_back_on() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let bar = mesh(&mut graph);
        let off = PlacementOptions {
            scale_to_latitude: Some(false),
            ..PlacementOptions::default()
        };
        let anchor =
            place_at_coordinate(&mut graph, bar, container, 0.0, 60.0, 0.0, &off).expect("place");
        assert_eq!(graph.local_transform_mut(anchor).expect("local").scale, Vec3::ONE);

        place_at_coordinate(&mut graph, bar, container, 0.0, 60.0, 0.0, &PlacementOptions::default())
            .expect("place");
        let t = *graph.local_transform_mut(anchor).expect("local");
        assert_eq!(t.scale, Vec3::splat(meters_per_world_unit(60.0)));

        let moved = move_to_coordinate(&mut graph, bar, 5.0, 45.0, 0.0, &PlacementOptions::default())
            .expect("move");
        assert_eq!(moved, anchor);
        let t = *graph.local_transform_mut(anchor).expect("local");
        assert_eq!(t.scale, Vec3::splat(meters_per_world_unit(45.0)));
        assert_eq!(t.position, project_to_world(5.0, 45.0, 0.0));
        assert_eq!(
            graph.node(bar).expect("bar").coordinates,
            Some(GeoCoordinate::new(5.0, 45.0, 0.0))
        );
    }

    #[test]
    fn latitude_scaling_once_on_stays_on() {
        let mut graph = SceneGraph::new();
        let container = spawn_world_anchor(&mut graph).expect("anchor");
        let bar = mesh(&mut graph);
        let anchor = place_at_coordinate(
            &mut graph,
            bar,
            container,
            0.0,
            30.0,
            0.0,
            &PlacementOptions::default(),
        )
        .expect("place");

        let off = PlacementOptions {
            scale_to_latitude: Some(false),
            ..PlacementOptions::default()
        };
        move_to_coordinate(&mut graph, bar, 0.0, 50.0, 0.0, &off).expect("move");
        let t = *graph.local_transform_mut(anchor).expect("local");
        assert_eq!(t.scale, Vec3::splat(meters_per_world_unit(50.0)));
        assert_eq!(graph.node(bar).expect("bar").scale_to_latitude, Some(true));
    }
}
