use foundation::math::Mat4;
use foundation::time::Time;
use scene::components::{Light, Shape3D};
use scene::{NodeId, NodePayload, SceneGraph, SyncedCamera};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderCommand {
    DrawMesh {
        node: NodeId,
        shape: Shape3D,
        /// 0xRRGGBB
        color: u32,
        highlight: bool,
        model_view_projection: Mat4,
    },
    Light {
        node: NodeId,
        light: Light,
        /// Model matrix of the light node.
        model: Mat4,
    },
}

impl RenderCommand {
    /// Column-major `f32` layout for uniform upload, if the command carries a
    /// transform that goes through the projection.
    pub fn mvp_uniform(&self) -> Option<[[f32; 4]; 4]> {
        match self {
            RenderCommand::DrawMesh {
                model_view_projection,
                ..
            } => Some(model_view_projection.to_cols_f32()),
            RenderCommand::Light { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderFrame {
    pub time: Time,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn mesh_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawMesh { .. }))
            .count()
    }
}

pub struct Renderer;

impl Renderer {
    /// Snapshot of what a frame at `time` draws.
    ///
    /// Lights come first, then meshes, each in node order. Hidden subtrees are
    /// skipped. A camera whose world matrix cannot be inverted yields an empty
    /// frame.
    pub fn collect(camera: &SyncedCamera, graph: &SceneGraph, time: Time) -> RenderFrame {
        let mut frame = RenderFrame {
            time,
            commands: Vec::new(),
        };
        let Some(view) = camera.view_matrix() else {
            return frame;
        };
        let view_projection = camera.projection() * view;

        for (id, node) in graph.iter() {
            let NodePayload::Light(light) = &node.payload else {
                continue;
            };
            if !graph.is_visible(id) {
                continue;
            }
            let Ok(model) = graph.world_matrix(id) else {
                continue;
            };
            frame.commands.push(RenderCommand::Light {
                node: id,
                light: *light,
                model,
            });
        }

        for id in graph.visible_meshes() {
            let Some(drawable) = graph.get(id).and_then(|n| n.drawable()) else {
                continue;
            };
            let Ok(model) = graph.world_matrix(id) else {
                continue;
            };
            frame.commands.push(RenderCommand::DrawMesh {
                node: id,
                shape: drawable.shape,
                color: drawable.color,
                highlight: drawable.highlight,
                model_view_projection: view_projection * model,
            });
        }
        frame
    }
}
