use foundation::math::Vec3;

use crate::camera::SyncedCamera;
use crate::graph::SceneGraph;
use crate::node::NodeId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Ray from the camera through screen pixel `(x_px, y_px)`.
///
/// Pixels are measured from the top-left of a `width` x `height` viewport.
/// Returns `None` for an empty viewport or a singular projection.
pub fn screen_ray(
    camera: &SyncedCamera,
    x_px: f64,
    y_px: f64,
    width: f64,
    height: f64,
) -> Option<Ray> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let ndc_x = (x_px / width) * 2.0 - 1.0;
    let ndc_y = -(y_px / height) * 2.0 + 1.0;

    let unproject = camera.world_matrix() * camera.projection().inverse()?;
    let target = unproject.project_point3(Vec3::new(ndc_x, ndc_y, 0.5))?;
    let origin = camera.position();
    let dir = (target - origin).normalize()?;
    Some(Ray::new(origin, dir))
}

/// Nearest visible node whose local bounds the ray hits.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - Equal distances resolve to the lower node index.
///
/// Nodes without bounds, hidden nodes, and nodes under a hidden ancestor are
/// skipped. The ray is carried into each node's local space, so bounds stay
/// tight under the anchor's pan/zoom and the node's own scale.
pub fn pick_ray(graph: &SceneGraph, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = ray.dir.normalize()?;

    let mut best: Option<(f64, NodeId)> = None;
    for (id, node) in graph.iter() {
        let Some(bounds) = node.bounds else {
            continue;
        };
        if !graph.is_visible(id) {
            continue;
        }
        let Some(to_local) = graph.world_matrix(id).ok().and_then(|m| m.inverse()) else {
            continue;
        };

        // Not renormalized: `t` stays a world-space distance.
        let local_origin = to_local.transform_point3(ray.origin);
        let local_dir = to_local.transform_vector3(dir);
        let Some(t) = bounds.ray_hit_t(local_origin, local_dir, 0.0, opts.max_distance) else {
            continue;
        };

        best = match best {
            Some((bt, bid)) if t.total_cmp(&bt).then_with(|| id.index().cmp(&bid.index())).is_ge() => {
                Some((bt, bid))
            }
            _ => Some((t, id)),
        };
    }

    let (t, node) = best?;
    Some(PickHit {
        node,
        distance: t,
        point: ray.origin + dir * t,
    })
}

/// Screen picking wrapper.
pub fn pick_screen(
    graph: &SceneGraph,
    camera: &SyncedCamera,
    x_px: f64,
    y_px: f64,
    width: f64,
    height: f64,
    opts: PickOptions,
) -> Option<PickHit> {
    let ray = screen_ray(camera, x_px, y_px, width, height)?;
    pick_ray(graph, ray, opts)
}

/// Move the highlight to `hit`, clearing it everywhere else.
pub fn highlight_hit(graph: &mut SceneGraph, hit: Option<NodeId>) {
    let ids: Vec<NodeId> = graph.iter().map(|(id, _)| id).collect();
    for id in ids {
        if let Some(d) = graph.get_mut(id).and_then(|n| n.drawable_mut()) {
            d.highlight = Some(id) == hit;
        }
    }
}
