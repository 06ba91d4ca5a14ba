//! # Scene/Camera Host
//!
//! [`Viewer`] owns the scene graph and camera, builds the default board scene,
//! applies background model loads and runs the per-frame update before
//! handing the scene to a [`FrameRenderer`].
//!
//! Nothing here touches the GPU, which keeps the whole host testable.

use std::{fmt, path::PathBuf};

use cgmath::{Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Zero};

use crate::{
    assets::{LoadEvent, LoadHandle, ModelLoader},
    config::{hex_to_rgb, ViewerSettings, ViewportConfig},
    error::RenderError,
    gfx::{
        camera::{CameraController, CameraManager, OrbitCamera},
        geometry::{generate_axis, generate_cone_outline, generate_grid, generate_plane},
        picking::{pick, Intersection, PickTarget},
        rendering::FrameRenderer,
        scene::{AmbientLight, Mesh, NodeId, NodeKind, Scene, SceneNode, SpotLight, INTERACTABLE_TAG},
    },
};

/// Name of the square highlight shown under the last pick
pub const MARKER_NAME: &str = "highlight";

const BOARD_SIZE: f32 = 64.0;
const SQUARE_SIZE: f32 = 8.0;
/// Keeps the marker from z-fighting with the board
const MARKER_LIFT: f32 = 0.02;
const HELPER_SEGMENTS: u32 = 32;

/// Progress of the most recent model load, shown in the debug panel
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading { percent: f32 },
    Loaded { nodes: usize },
    Failed(String),
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Idle => write!(f, "no model"),
            LoadStatus::Loading { percent } => write!(f, "loading {:.0}%", percent),
            LoadStatus::Loaded { nodes } => write!(f, "model loaded ({} nodes)", nodes),
            LoadStatus::Failed(reason) => write!(f, "load failed: {}", reason),
        }
    }
}

pub struct Viewer {
    scene: Scene,
    ground: NodeId,
    marker: NodeId,
    spot_light: NodeId,
    light_helper: NodeId,
    model: Option<NodeId>,
    model_scale: f32,
    loader: Option<LoadHandle>,
    load_status: LoadStatus,
    last_pick: Option<Intersection>,
    /// Cone (angle, length) the helper geometry was last built for
    helper_cone: Option<(f32, f32)>,
}

impl Viewer {
    /// Builds the camera, lights, board, marker, helpers and grid.
    ///
    /// The model is not loaded here; call [`Viewer::load_model`].
    pub fn initialize(settings: &ViewerSettings) -> Self {
        let (width, height) = settings.window_size;
        let aspect = width.max(1) as f32 / height.max(1) as f32;

        let camera = OrbitCamera::looking_from(Vector3::new(0.0, 40.0, 40.0), Vector3::zero(), aspect)
            .with_perspective(Deg(75.0), 0.1, 1000.0);
        let controller = CameraController::new(0.005, 0.1);
        let mut scene = Scene::new(CameraManager::new(camera, controller));

        scene.add_node(SceneNode::ambient_light(
            "ambient",
            AmbientLight {
                color: hex_to_rgb(0x333333),
                intensity: 1.0,
            },
        ));

        let light = SpotLight {
            color: hex_to_rgb(0xFFFFFF),
            intensity: 800.0,
            angle: 0.2,
            cast_shadow: true,
            ..Default::default()
        };
        let spot_light = scene.add_node(
            SceneNode::spot_light("spot_light", light)
                .with_transform(Matrix4::from_translation(Vector3::new(50.0, 50.0, 50.0))),
        );

        let light_helper = scene.add_node(
            SceneNode::lines("spot_light_helper", Mesh::lines(&Default::default()))
                .with_color(light.color)
                .with_visible(false),
        );

        let flat = Matrix4::from_angle_x(Deg(-90.0));

        let ground = scene.add_node(
            SceneNode::mesh(
                INTERACTABLE_TAG,
                Mesh::from_geometry(&generate_plane(BOARD_SIZE, BOARD_SIZE, 1, 1)),
            )
            .with_transform(flat)
            .with_color(hex_to_rgb(0x66EBBB))
            .with_receive_shadow(true),
        );

        let marker = scene.add_node(
            SceneNode::mesh(
                MARKER_NAME,
                Mesh::from_geometry(&generate_plane(SQUARE_SIZE, SQUARE_SIZE, 1, 1)),
            )
            .with_transform(Matrix4::from_translation(Vector3::new(0.0, MARKER_LIFT, 0.0)) * flat)
            .with_color(ViewportConfig::default().sphere_color)
            .with_visible(false),
        );

        scene.add_node(
            SceneNode::lines("grid", Mesh::lines(&generate_grid(BOARD_SIZE, 10)))
                .with_transform(Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0)))
                .with_color(hex_to_rgb(0x888888)),
        );

        let axes = scene.add_node(SceneNode::group("axes"));
        for (name, axis, color) in [
            ("axis_x", [1.0, 0.0, 0.0], 0xFF0000),
            ("axis_y", [0.0, 1.0, 0.0], 0x00FF00),
            ("axis_z", [0.0, 0.0, 1.0], 0x0000FF),
        ] {
            scene.add_child(
                axes,
                SceneNode::lines(name, Mesh::lines(&generate_axis(axis, 100.0))).with_color(hex_to_rgb(color)),
            );
        }

        let mut viewer = Self {
            scene,
            ground,
            marker,
            spot_light,
            light_helper,
            model: None,
            model_scale: settings.model_scale,
            loader: None,
            load_status: LoadStatus::Idle,
            last_pick: None,
            helper_cone: None,
        };
        viewer.rebuild_light_helper();
        viewer.scene.update();

        log::debug!("Viewer scene initialized: {:?}", viewer.scene.get_statistics());
        viewer
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera_manager_mut(&mut self) -> &mut CameraManager {
        &mut self.scene.camera_manager
    }

    pub fn ground(&self) -> NodeId {
        self.ground
    }

    pub fn marker(&self) -> NodeId {
        self.marker
    }

    pub fn spot_light(&self) -> NodeId {
        self.spot_light
    }

    pub fn light_helper(&self) -> NodeId {
        self.light_helper
    }

    /// Root node of the loaded model, once a load has completed
    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    /// Keeps the camera aspect in step with the window
    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.camera_manager.camera.resize_projection(width, height);
    }

    /// Starts loading the model in the background
    ///
    /// A load already in flight is abandoned.
    pub fn load_model(&mut self, material_path: impl Into<PathBuf>, geometry_path: impl Into<PathBuf>) {
        let material_path = material_path.into();
        let geometry_path = geometry_path.into();
        log::info!(
            "Loading model {} with materials {}",
            geometry_path.display(),
            material_path.display()
        );

        self.loader = Some(ModelLoader::new(material_path, geometry_path).spawn());
        self.load_status = LoadStatus::Loading { percent: 0.0 };
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Applies any events the loader produced since the last call.
    ///
    /// Returns `true` if a model was appended to the scene.
    pub fn poll_model_load(&mut self) -> bool {
        let Some(handle) = self.loader.as_mut() else {
            return false;
        };

        let events = handle.poll();
        if handle.is_finished() {
            self.loader = None;
        }

        let mut appended = false;
        for event in events {
            match event {
                LoadEvent::Progress { loaded, total } => {
                    let percent = if total == 0 {
                        100.0
                    } else {
                        loaded as f32 / total as f32 * 100.0
                    };
                    log::info!("{}% loaded", percent);
                    self.load_status = LoadStatus::Loading { percent };
                }
                LoadEvent::Loaded(patch) => {
                    let patch = patch.scaled(self.model_scale).casting_shadows();
                    let nodes = patch.node_count();
                    self.model = Some(self.scene.apply_patch(patch));
                    self.load_status = LoadStatus::Loaded { nodes };
                    log::info!("Model added to scene ({} nodes)", nodes);
                    appended = true;
                }
                LoadEvent::Failed(err) => {
                    log::error!("An error happened while loading the model: {}", err);
                    self.load_status = LoadStatus::Failed(err.to_string());
                }
            }
        }
        appended
    }

    /// Runs the per-frame update, then renders.
    pub fn on_frame(
        &mut self,
        config: &ViewportConfig,
        renderer: &mut impl FrameRenderer,
    ) -> Result<(), RenderError> {
        if let Some(NodeKind::SpotLight(light)) = self.scene.node_mut(self.spot_light).map(|node| &mut node.kind) {
            light.apply_viewport(config);
        }

        if let Some(marker) = self.scene.node_mut(self.marker) {
            marker.material.color = config.sphere_color;
            marker.material.wireframe = config.wireframe;
        }

        self.rebuild_light_helper();
        self.scene.update();

        renderer.render(&mut self.scene)
    }

    fn spot_light_settings(&self) -> Option<SpotLight> {
        match self.scene.node(self.spot_light).map(|node| &node.kind) {
            Some(NodeKind::SpotLight(light)) => Some(*light),
            _ => None,
        }
    }

    /// Regenerates the helper cone when the light's angle or reach changed
    fn rebuild_light_helper(&mut self) {
        let Some(light) = self.spot_light_settings() else {
            return;
        };
        let position = self.scene.world_position(self.spot_light);
        let length = (light.target - position).magnitude().max(1.0);

        let cone = (light.angle, length);
        if self.helper_cone == Some(cone) {
            return;
        }

        if let Some(helper) = self.scene.node_mut(self.light_helper) {
            if let Some(mesh) = helper.mesh_mut() {
                mesh.replace_lines(&generate_cone_outline(length, light.angle, HELPER_SEGMENTS));
            }
            helper.transform = light
                .view_matrix(position)
                .invert()
                .unwrap_or_else(Matrix4::identity);
        }
        self.helper_cone = Some(cone);
    }

    pub fn light_helper_visible(&self) -> bool {
        self.scene.node(self.light_helper).is_some_and(|node| node.visible)
    }

    pub fn set_light_helper_visible(&mut self, visible: bool) {
        if let Some(helper) = self.scene.node_mut(self.light_helper) {
            helper.visible = visible;
        }
    }

    /// Raycasts a window click against the board.
    pub fn pick_at(&mut self, screen_x: f32, screen_y: f32, width: f32, height: f32) -> Option<Intersection> {
        let candidates = PickTarget::from_scene(&self.scene, self.ground);
        let hit = pick(
            screen_x,
            screen_y,
            width,
            height,
            &self.scene.camera_manager.camera,
            candidates.as_slice(),
        );

        match &hit {
            Some(intersection) => {
                log::info!("{:?}", intersection.pointer);
                log::info!("{:?}", intersection.point);
            }
            None => log::debug!("Click at ({}, {}) missed the board", screen_x, screen_y),
        }

        self.last_pick = hit.clone();
        hit
    }

    pub fn last_pick(&self) -> Option<&Intersection> {
        self.last_pick.as_ref()
    }

    /// Moves the marker onto the board square containing `point` and shows it.
    ///
    /// Returns the marker's new position.
    pub fn highlight(&mut self, point: Point3<f32>) -> Vector3<f32> {
        let center = snap_to_square(point);
        if let Some(marker) = self.scene.node_mut(self.marker) {
            marker.set_translation(center);
            marker.visible = true;
        }
        center
    }
}

/// Center of the 8×8 board square under `point`, clamped to the board
pub fn snap_to_square(point: Point3<f32>) -> Vector3<f32> {
    let limit = BOARD_SIZE / 2.0 - SQUARE_SIZE / 2.0;
    let snap = |v: f32| ((v / SQUARE_SIZE).floor() * SQUARE_SIZE + SQUARE_SIZE / 2.0).clamp(-limit, limit);
    Vector3::new(snap(point.x), MARKER_LIFT, snap(point.z))
}
