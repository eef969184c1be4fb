//! Headless driver for the map overlay: pose files, scene files and reports.

use std::fs;
use std::path::Path;

use foundation::math::{Mat4, Vec3, meters_per_world_unit, project_to_world};
use foundation::time::Time;
use gpu::{RenderCommand, Renderer};
use layers::LayerStack;
use layers::pillar::{PillarLayer, PillarSpec, demo_pillars, pillar_height};
use runtime::{FrameClock, MAX_PITCH, SimulatedMap, ViewportPose};
use scene::SyncedCamera;
use scene::picking::{PickOptions, highlight_hit, pick_screen};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use viewsync::{MapOverlay, compute_frustum};

/// Scene description read from `--scene`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    /// Overrides the command-line pose when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<ViewportPose>,
    /// Bars to place. An empty list places the three demo bars.
    #[serde(default)]
    pub pillars: Vec<PillarSpec>,
}

impl SceneFile {
    pub fn pillars_or_demo(&self) -> Vec<PillarSpec> {
        if self.pillars.is_empty() {
            demo_pillars()
        } else {
            self.pillars.clone()
        }
    }
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("parse {path:?}: {e}"))
}

/// Pose centered on `(lon, lat)` with angles given in degrees. Pitch is clamped
/// to what the map allows.
pub fn pose_from_parts(
    width: f64,
    height: f64,
    lon: f64,
    lat: f64,
    zoom: f64,
    pitch_deg: f64,
    bearing_deg: f64,
) -> ViewportPose {
    let mut pose = ViewportPose::centered_on(width, height, lon, lat, zoom.max(0.0));
    pose.pitch = pitch_deg.to_radians().clamp(0.0, MAX_PITCH);
    pose.bearing = bearing_deg.to_radians();
    pose
}

/// Pixel position (top-left origin) of a world-space point, or `None` if it
/// is behind the camera.
pub fn screen_position(camera: &SyncedCamera, world: Vec3, width: f64, height: f64) -> Option<[f64; 2]> {
    let view = camera.view_matrix()?;
    let clip = (camera.projection() * view).mul_vec4([world.x, world.y, world.z, 1.0]);
    if clip[3] <= 0.0 {
        return None;
    }
    let ndc_x = clip[0] / clip[3];
    let ndc_y = clip[1] / clip[3];
    Some([(ndc_x + 1.0) / 2.0 * width, (1.0 - ndc_y) / 2.0 * height])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrustumReport {
    pub near: f64,
    pub far: f64,
    pub aspect: f64,
    pub camera_to_center_distance: f64,
    /// Column-major.
    pub projection: [f64; 16],
}

pub fn frustum_report(pose: &ViewportPose) -> FrustumReport {
    let f = compute_frustum(scene::camera::FOV_Y, pose.aspect(), pose.height, pose.pitch);
    FrustumReport {
        near: f.near,
        far: f.far,
        aspect: f.aspect,
        camera_to_center_distance: f.camera_to_center_distance,
        projection: f.projection.to_cols_array(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub pose: ViewportPose,
    pub far: f64,
    pub projection: [f64; 16],
    pub camera_world: [f64; 16],
    pub anchor: [f64; 16],
}

/// Matrices the overlay derives for `pose`.
pub fn sync_report(pose: ViewportPose) -> Result<SyncReport, String> {
    let mut map = SimulatedMap::new(pose);
    let overlay = MapOverlay::attach(&mut map).map_err(|e| format!("attach overlay: {e}"))?;
    let camera = overlay.camera();
    let anchor: Mat4 = overlay
        .graph()
        .world_matrix(overlay.anchor())
        .map_err(|e| format!("anchor: {e}"))?;
    Ok(SyncReport {
        pose,
        far: camera.far(),
        projection: camera.projection().to_cols_array(),
        camera_world: camera.world_matrix().to_cols_array(),
        anchor: anchor.to_cols_array(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReport {
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
    /// Position under the world anchor, before pan and zoom.
    pub world: [f64; 3],
    pub meters_per_world_unit: f64,
    /// Where the coordinate lands on screen for the given pose.
    pub screen: Option<[f64; 2]>,
}

pub fn project_report(pose: ViewportPose, lon: f64, lat: f64, alt: f64) -> Result<ProjectReport, String> {
    let world = project_to_world(lon, lat, alt);
    let mut map = SimulatedMap::new(pose);
    let overlay = MapOverlay::attach(&mut map).map_err(|e| format!("attach overlay: {e}"))?;
    let anchor = overlay
        .graph()
        .world_matrix(overlay.anchor())
        .map_err(|e| format!("anchor: {e}"))?;
    let screen = screen_position(
        &overlay.camera(),
        anchor.transform_point3(world),
        pose.width,
        pose.height,
    );
    Ok(ProjectReport {
        lon,
        lat,
        alt,
        world: world.as_array(),
        meters_per_world_unit: meters_per_world_unit(lat),
        screen,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawReport {
    pub name: String,
    /// Screen position of the node's local origin.
    pub screen: Option<[f64; 2]>,
    pub height_m: Option<f64>,
    pub highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub frames: u64,
    pub time_s: f64,
    pub draws: Vec<DrawReport>,
    /// Name of the mesh under the screen center, if any.
    pub center_pick: Option<String>,
}

/// Attach an overlay to a simulated map, place `pillars`, run `frames`
/// frames at `rate_hz`, then pick at the screen center and collect the final
/// render frame.
pub fn run_overlay(
    pose: ViewportPose,
    pillars: Vec<PillarSpec>,
    frames: u64,
    rate_hz: f64,
) -> Result<RunReport, String> {
    let mut map = SimulatedMap::new(pose);
    let overlay = MapOverlay::attach(&mut map).map_err(|e| format!("attach overlay: {e}"))?;

    let mut layers = LayerStack::new();
    layers
        .push(
            Box::new(PillarLayer::new(1, pillars)),
            &mut overlay.graph_mut(),
            overlay.anchor(),
        )
        .map_err(|e| format!("attach pillars: {e}"))?;

    let mut clock = FrameClock::new(rate_hz);
    let mut time = Time::ZERO;
    for _ in 0..frames {
        let frame = clock.tick();
        layers.update(&mut overlay.graph_mut(), frame);
        time = frame.time;
    }

    let (width, height) = overlay.render_size();
    let hit = pick_screen(
        &overlay.graph(),
        &overlay.camera(),
        width / 2.0,
        height / 2.0,
        width,
        height,
        PickOptions::default(),
    );
    highlight_hit(&mut overlay.graph_mut(), hit.map(|h| h.node));

    let graph = overlay.graph();
    let render = Renderer::collect(&overlay.camera(), &graph, time);
    let mut draws = Vec::new();
    for command in &render.commands {
        let RenderCommand::DrawMesh {
            node,
            highlight,
            model_view_projection,
            ..
        } = command
        else {
            continue;
        };
        let Some(n) = graph.get(*node) else {
            continue;
        };
        let screen = model_view_projection
            .project_point3(Vec3::ZERO)
            .map(|ndc| [(ndc.x + 1.0) / 2.0 * width, (1.0 - ndc.y) / 2.0 * height]);
        draws.push(DrawReport {
            name: n.name.clone(),
            screen,
            height_m: pillar_height(&graph, *node).ok(),
            highlight: *highlight,
        });
    }
    let center_pick = hit.and_then(|h| graph.get(h.node)).map(|n| n.name.clone());

    info!(
        frames,
        draws = draws.len(),
        picked = center_pick.as_deref().unwrap_or("-"),
        "overlay run finished"
    );
    Ok(RunReport {
        frames,
        time_s: time.0,
        draws,
        center_pick,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        SceneFile, frustum_report, pose_from_parts, project_report, run_overlay, sync_report,
    };
    use foundation::math::{Mat4, Vec3};
    use layers::pillar::{PillarSpec, demo_pillars};
    use pretty_assertions::assert_eq;
    use runtime::{MAX_PITCH, ViewportPose};
    use scene::camera::FOV_Y;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    const LON: f64 = -102.41356;
    const LAT: f64 = 37.77577;

    #[test]
    fn flat_pose_frustum_matches_camera_distance() {
        let report = frustum_report(&ViewportPose::new(512.0, 512.0));
        let d = 0.5 / (FOV_Y / 2.0).tan() * 512.0;
        assert_eq!(report.near, 1.0);
        assert_eq!(report.camera_to_center_distance, d);
        assert_close(report.far, 768.0 * 1.01, 1e-9);
        assert_eq!(report.projection[11], -1.0);
    }

    #[test]
    fn reference_scenario_end_to_end() {
        let pose = ViewportPose::new(512.0, 512.0);
        let report = sync_report(pose).expect("sync");
        let d = 0.5 / (FOV_Y / 2.0).tan() * 512.0;
        assert_eq!(
            report.camera_world,
            Mat4::translation(Vec3::new(0.0, 0.0, d)).to_cols_array()
        );
        assert_close(report.anchor[0], -1.0, 1e-12);
        assert_close(report.anchor[5], -1.0, 1e-12);
        assert_eq!(report.anchor[10], 1.0);
        assert_eq!(report.anchor[12], 256.0);
        assert_eq!(report.anchor[13], -256.0);

        let placed = project_report(pose, LON, LAT, 0.0).expect("project");
        assert_close(placed.world[0], 102.41356 * 512.0 / 360.0, 1e-9);
        let mercator_y = ((std::f64::consts::FRAC_PI_4 + LAT.to_radians() / 2.0).tan()).ln();
        assert_close(placed.world[1], -mercator_y * 256.0 / std::f64::consts::PI, 1e-9);
        assert_eq!(placed.world[2], 0.0);
    }

    #[test]
    fn projected_center_is_the_screen_center() {
        let pose = pose_from_parts(800.0, 600.0, LON, LAT, 6.0, 30.0, 45.0);
        let report = project_report(pose, LON, LAT, 0.0).expect("project");
        let [x, y] = report.screen.expect("on screen");
        assert_close(x, 400.0, 1e-6);
        assert_close(y, 300.0, 1e-6);
    }

    #[test]
    fn pose_parts_clamp_pitch_and_convert_degrees() {
        let pose = pose_from_parts(100.0, 100.0, 0.0, 0.0, -2.0, 75.0, 90.0);
        assert_eq!(pose.zoom, 0.0);
        assert_eq!(pose.pitch, MAX_PITCH);
        assert_close(pose.bearing, std::f64::consts::FRAC_PI_2, 1e-15);
        assert_close(pose.center_x, 256.0, 1e-9);
    }

    #[test]
    fn demo_run_grows_bars_and_picks_the_centered_one() {
        let pose = pose_from_parts(512.0, 512.0, LON, LAT, 3.0, 0.0, 0.0);
        let report = run_overlay(pose, demo_pillars(), 120, 60.0).expect("run");

        assert_eq!(report.frames, 120);
        assert_eq!(report.draws.len(), 3);
        let names: Vec<&str> = report.draws.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["pillar-0", "pillar-1", "pillar-2"]);
        let heights: Vec<Option<f64>> = report.draws.iter().map(|d| d.height_m).collect();
        assert_eq!(
            heights,
            vec![Some(3_000_000.0), Some(2_000_000.0), Some(1_000_000.0)]
        );

        let [x, y] = report.draws[0].screen.expect("on screen");
        assert_close(x, 256.0, 1e-6);
        assert_close(y, 256.0, 1e-6);
        // Ten degrees west at zoom 3 is 4096 * 10 / 360 px to the left.
        let [x1, _] = report.draws[1].screen.expect("on screen");
        assert_close(x1, 256.0 - 4096.0 * 10.0 / 360.0, 1e-6);

        assert_eq!(report.center_pick.as_deref(), Some("pillar-0"));
        assert!(report.draws[0].highlight);
        assert!(!report.draws[1].highlight);
    }

    #[test]
    fn scene_file_falls_back_to_demo_bars() {
        let scene: SceneFile = serde_json::from_str("{}").expect("json");
        assert_eq!(scene, SceneFile::default());
        assert_eq!(scene.pillars_or_demo(), demo_pillars());

        let scene: SceneFile = serde_json::from_str(
            r#"{
                "pose": { "width": 640, "height": 480, "zoom": 2 },
                "pillars": [{ "lon": 1, "lat": 2, "height": 300, "pre_scale": 2 }]
            }"#,
        )
        .expect("json");
        let pose = scene.pose.expect("pose");
        assert_eq!(pose.zoom, 2.0);
        assert_eq!(pose.pitch, 0.0);
        assert_eq!(scene.pillars_or_demo().len(), 1);
        assert_eq!(
            scene.pillars[0],
            PillarSpec {
                pre_scale: layers::PreScale::Uniform(2.0),
                ..PillarSpec::new(1.0, 2.0, 300.0)
            }
        );
    }
}
