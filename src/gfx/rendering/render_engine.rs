//! WGPU-based rendering engine for the viewer
//!
//! Owns the surface, device and pipelines. Each frame renders the spot
//! light's shadow map, then the lit scene, then an optional UI overlay.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    error::RenderError,
    gfx::{
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            object_bindings::{ObjectBindings, ObjectUniform},
            texture_resource::{ShadowMap, TextureResource},
        },
        scene::{DrawMesh, NodeId, Scene, SceneNode, Topology},
    },
};

use super::{
    pipeline_manager::{PipelineConfig, PipelineManager},
    FrameRenderer,
};

const SOLID_PIPELINE: &str = "Solid";
const LINES_PIPELINE: &str = "Lines";
const SHADOW_PIPELINE: &str = "Shadow";

/// How a node is drawn in the main pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawStyle {
    Solid,
    /// Triangle mesh drawn through its edge buffer
    Edges,
    Lines,
}

impl DrawStyle {
    fn of(node: &SceneNode) -> Option<Self> {
        let mesh = node.mesh_ref()?;
        Some(match (mesh.topology(), node.material.wireframe) {
            (Topology::Lines, _) => DrawStyle::Lines,
            (Topology::Triangles, true) => DrawStyle::Edges,
            (Topology::Triangles, false) => DrawStyle::Solid,
        })
    }

    fn pipeline(self) -> &'static str {
        match self {
            DrawStyle::Solid => SOLID_PIPELINE,
            DrawStyle::Edges | DrawStyle::Lines => LINES_PIPELINE,
        }
    }
}

/// Whether a node belongs in the shadow pass
fn casts_shadow(node: &SceneNode) -> bool {
    node.cast_shadow && DrawStyle::of(node) == Some(DrawStyle::Solid)
}

/// Core rendering engine managing GPU resources and draw calls
///
/// The RenderEngine handles all low-level graphics operations including:
/// - Surface and device management
/// - Pipeline creation and management
/// - Depth buffer handling
/// - Shadow mapping for the spot light
/// - Camera and light uniform updates
/// - UI overlay rendering
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    object_bindings: ObjectBindings,
    shadow_map: ShadowMap,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `vsync` - Present with `Fifo` instead of `Immediate`
    ///
    /// # Errors
    /// Fails when no surface, adapter or device can be acquired.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8Unorm);
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::Immediate
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = ShadowMap::new(&device);

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let object_bindings = ObjectBindings::new(&device);

        let device_handle = Arc::new(device);
        let queue_handle = Arc::new(queue);
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shadow.wgsl"));

        let scene_layouts = vec![
            global_bindings.bind_group_layout().clone(),
            object_bindings.bind_group_layout().clone(),
            shadow_map.bind_group_layout().clone(),
        ];

        // Depth only, both faces, biased against acne
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_depth_bias(2, 2.0)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    object_bindings.bind_group_layout().clone(),
                ]),
        );

        // The board is seen from below when orbiting, so nothing is culled
        pipeline_manager.register_pipeline(
            SOLID_PIPELINE,
            PipelineConfig::default()
                .with_label("SOLID")
                .with_shader("scene")
                .with_color_format(format)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(None)
                .with_bind_group_layouts(scene_layouts.clone()),
        );

        pipeline_manager.register_pipeline(
            LINES_PIPELINE,
            PipelineConfig::default()
                .with_label("LINES")
                .with_shader("scene")
                .with_color_format(format)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(None)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_bind_group_layouts(scene_layouts),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            object_bindings,
            shadow_map,
        })
    }

    /// Uploads whatever the scene changed since the last frame
    ///
    /// New or replaced meshes get fresh buffers, every mesh node gets its
    /// world transform and material written, and the global uniform picks up
    /// the camera and the current lights.
    pub fn prepare(&mut self, scene: &mut Scene) {
        let worlds: Vec<_> = (0..scene.len())
            .map(|id| scene.world_transform(id))
            .collect();

        for (node, world) in scene.nodes_mut().iter_mut().zip(worlds) {
            let content = ObjectUniform::new(world, &node.material, node.receive_shadow);
            let Some(mesh) = node.mesh_mut() else {
                continue;
            };
            mesh.upload(&self.device);

            match &node.gpu_resources {
                Some(resources) => {
                    self.queue
                        .write_buffer(&resources.object_buffer, 0, bytemuck::bytes_of(&content));
                }
                None => {
                    node.gpu_resources = Some(
                        self.object_bindings
                            .create_node_resources(&self.device, &content),
                    );
                }
            }
        }

        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            &scene.camera_manager.camera.uniform,
            &scene.lighting(),
        );
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// # Arguments
    /// * `scene` - Scene to draw; call [`RenderEngine::prepare`] first
    /// * `ui_callback` - Optional function that renders UI elements on top
    ///
    /// # Errors
    /// Returns the surface error when no frame could be acquired.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = self.surface.get_current_texture()?;

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let visible: Vec<NodeId> = (0..scene.len())
            .filter(|&id| scene.is_visible(id))
            .collect();

        // PASS 1: Shadow map from the spot light
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(shadow_pipeline) = self.pipeline_manager.get_pipeline(SHADOW_PIPELINE) {
                shadow_pass.set_pipeline(shadow_pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

                for node in visible.iter().filter_map(|&id| scene.node(id)) {
                    if !casts_shadow(node) {
                        continue;
                    }
                    let (Some(bind_group), Some(mesh)) = (node.get_bind_group(), node.mesh_ref())
                    else {
                        continue;
                    };
                    shadow_pass.set_bind_group(1, bind_group, &[]);
                    shadow_pass.draw_mesh(mesh);
                }
            }
        }

        // PASS 2: Main rendering with shadows
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.2,
                            b: 0.3,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
            render_pass.set_bind_group(2, self.shadow_map.bind_group(), &[]);

            for node in visible.iter().filter_map(|&id| scene.node(id)) {
                let (Some(style), Some(bind_group), Some(mesh)) =
                    (DrawStyle::of(node), node.get_bind_group(), node.mesh_ref())
                else {
                    continue;
                };
                let Some(pipeline) = self.pipeline_manager.get_pipeline(style.pipeline()) else {
                    continue;
                };

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, bind_group, &[]);
                match style {
                    DrawStyle::Edges => render_pass.draw_mesh_edges(mesh),
                    DrawStyle::Solid | DrawStyle::Lines => render_pass.draw_mesh(mesh),
                }
            }
        }

        // PASS 3: UI overlay (if provided)
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the render engine surface and recreates depth buffer
    ///
    /// Zero-sized requests (minimized windows) are ignored. The shadow map
    /// keeps its fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Reconfigures the surface at its current size, e.g. after `SurfaceError::Lost`
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    /// Returns current surface dimensions as (width, height) in pixels
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

impl FrameRenderer for RenderEngine {
    fn render(&mut self, scene: &mut Scene) -> Result<(), RenderError> {
        self.prepare(scene);
        self.render_frame(
            scene,
            None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::{generate_grid, generate_plane},
        scene::{Mesh, SpotLight},
    };

    fn board() -> SceneNode {
        SceneNode::mesh("board", Mesh::from_geometry(&generate_plane(8.0, 8.0, 1, 1)))
    }

    #[test]
    fn test_draw_style_follows_topology_and_wireframe() {
        let mut node = board();
        assert_eq!(DrawStyle::of(&node), Some(DrawStyle::Solid));

        node.material.wireframe = true;
        assert_eq!(DrawStyle::of(&node), Some(DrawStyle::Edges));
        assert_eq!(DrawStyle::Edges.pipeline(), LINES_PIPELINE);

        let grid = SceneNode::lines("grid", Mesh::lines(&generate_grid(8.0, 2)));
        assert_eq!(DrawStyle::of(&grid), Some(DrawStyle::Lines));

        assert_eq!(DrawStyle::of(&SceneNode::group("g")), None);
        assert_eq!(
            DrawStyle::of(&SceneNode::spot_light("spot", SpotLight::default())),
            None
        );
    }

    #[test]
    fn test_only_solid_casters_enter_shadow_pass() {
        assert!(!casts_shadow(&board()));
        assert!(casts_shadow(&board().with_cast_shadow(true)));

        let mut wire = board().with_cast_shadow(true);
        wire.material.wireframe = true;
        assert!(!casts_shadow(&wire));

        let spot = SceneNode::spot_light(
            "spot",
            SpotLight {
                cast_shadow: true,
                ..Default::default()
            },
        );
        assert!(!casts_shadow(&spot));
    }
}
