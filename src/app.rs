//! winit application shell
//!
//! Creates the window and GPU context, forwards input to the camera, the
//! debug panel and picking, and drives [`Viewer::on_frame`] once per redraw.

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    error::EventLoopError,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::{ViewerSettings, ViewportConfig},
    error::RenderError,
    gfx::{
        rendering::{FrameRenderer, RenderEngine},
        scene::Scene,
    },
    ui::{viewport_panel, PanelStatus, UiManager},
    viewer::Viewer,
};

/// Largest pointer travel, in physical pixels, that still counts as a click
const CLICK_SLOP: f64 = 4.0;

/// Tells clicks apart from orbit drags
///
/// A press followed by a release within [`CLICK_SLOP`] pixels is a click.
#[derive(Debug, Default)]
struct ClickTracker {
    cursor: Option<PhysicalPosition<f64>>,
    pressed_at: Option<PhysicalPosition<f64>>,
}

impl ClickTracker {
    /// Records pointer motion; called before the UI can swallow the event
    fn observe(&mut self, event: &WindowEvent) {
        if let WindowEvent::CursorMoved { position, .. } = event {
            self.cursor_moved(*position);
        }
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = Some(position);
    }

    fn press(&mut self) {
        self.pressed_at = self.cursor;
    }

    /// Returns where the click landed, if the release completes one
    fn release(&mut self) -> Option<PhysicalPosition<f64>> {
        let start = self.pressed_at.take()?;
        let end = self.cursor?;
        let travel = (end.x - start.x).hypot(end.y - start.y);
        (travel <= CLICK_SLOP).then_some(end)
    }

    fn cancel(&mut self) {
        self.pressed_at = None;
    }
}

/// Renders the scene with the debug panel drawn on top
struct OverlayRenderer<'a> {
    engine: &'a mut RenderEngine,
    ui: &'a mut UiManager,
}

impl FrameRenderer for OverlayRenderer<'_> {
    fn render(&mut self, scene: &mut Scene) -> Result<(), RenderError> {
        self.engine.prepare(scene);
        let ui = &mut *self.ui;
        self.engine.render_frame(
            scene,
            Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| {
                    ui.render_display_only(device, queue, encoder, view);
                },
            ),
        )
    }
}

pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    settings: ViewerSettings,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    viewer: Viewer,
    config: ViewportConfig,
    show_light_helper: bool,
    clicks: ClickTracker,
}

impl ViewerApp {
    /// Builds the scene and starts loading the model
    ///
    /// The window and GPU context are created once the event loop resumes.
    pub fn new(settings: ViewerSettings) -> Result<Self, EventLoopError> {
        let event_loop = EventLoop::new()?;

        let mut viewer = Viewer::initialize(&settings);
        viewer.load_model(&settings.material_path, &settings.geometry_path);
        let show_light_helper = viewer.light_helper_visible();

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                settings,
                window: None,
                render_engine: None,
                ui_manager: None,
                viewer,
                config: ViewportConfig::default(),
                show_light_helper,
                clicks: ClickTracker::default(),
            },
        })
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> Result<(), EventLoopError> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)
    }
}

impl AppState {
    fn handle_click(&mut self, position: PhysicalPosition<f64>) {
        let Some(render_engine) = self.render_engine.as_ref() else {
            return;
        };
        let (width, height) = render_engine.get_surface_size();

        if let Some(hit) = self.viewer.pick_at(
            position.x as f32,
            position.y as f32,
            width as f32,
            height as f32,
        ) {
            let square = self.viewer.highlight(hit.point);
            log::debug!("Highlighted square at {:?}", square);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(render_engine), Some(ui_manager)) = (
            self.window.as_ref(),
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
        ) else {
            return;
        };

        self.viewer.poll_model_load();

        let viewer = &self.viewer;
        let config = &mut self.config;
        let show_light_helper = &mut self.show_light_helper;
        ui_manager.update_logic(window, |ui| {
            let status = PanelStatus {
                node_count: viewer.scene().len(),
                load_status: viewer.load_status(),
                last_pick: viewer.last_pick(),
            };
            viewport_panel(ui, config, show_light_helper, status);
        });

        self.viewer.set_light_helper_visible(self.show_light_helper);

        let mut renderer = OverlayRenderer {
            engine: &mut *render_engine,
            ui: &mut *ui_manager,
        };
        match self.viewer.on_frame(&self.config, &mut renderer) {
            Ok(()) => {}
            Err(RenderError::Frame(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface lost, reconfiguring");
                render_engine.reconfigure();
            }
            Err(RenderError::Frame(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Skipped frame: {}", e),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.settings.window_size;
        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(LogicalSize::new(width, height));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let PhysicalSize { width, height } = window.inner_size();
        let vsync = self.settings.vsync;
        let window_clone = window.clone();
        let renderer = match pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, vsync).await
        }) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        let (surface_width, surface_height) = renderer.get_surface_size();
        ui_manager.update_display_size(surface_width, surface_height);
        self.viewer.resize(surface_width, surface_height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        self.clicks.observe(&event);

        // Handle UI input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                if matches!(event, WindowEvent::MouseInput { .. }) {
                    self.clicks.cancel();
                    self.viewer.camera_manager_mut().set_dragging(false);
                }
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                self.viewer
                    .camera_manager_mut()
                    .process_keyboard_event(&key_event);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                self.viewer.camera_manager_mut().set_dragging(pressed);
                if pressed {
                    self.clicks.press();
                } else if let Some(position) = self.clicks.release() {
                    self.handle_click(position);
                }
            }
            WindowEvent::Focused(false) => {
                self.clicks.cancel();
                self.viewer.camera_manager_mut().set_dragging(false);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.viewer.resize(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Don't orbit while the pointer is over the panel
        if self
            .ui_manager
            .as_ref()
            .is_some_and(|ui_manager| ui_manager.wants_mouse())
        {
            return;
        }

        self.viewer.camera_manager_mut().process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> PhysicalPosition<f64> {
        PhysicalPosition::new(x, y)
    }

    #[test]
    fn test_small_travel_is_a_click() {
        let mut clicks = ClickTracker::default();
        clicks.cursor_moved(at(100.0, 100.0));
        clicks.press();
        clicks.cursor_moved(at(102.0, 103.0));

        assert_eq!(clicks.release(), Some(at(102.0, 103.0)));
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut clicks = ClickTracker::default();
        clicks.cursor_moved(at(100.0, 100.0));
        clicks.press();
        clicks.cursor_moved(at(140.0, 100.0));

        assert_eq!(clicks.release(), None);
    }

    #[test]
    fn test_release_without_press_or_cursor() {
        let mut clicks = ClickTracker::default();
        assert_eq!(clicks.release(), None);

        // Press before the cursor ever moved has no origin
        clicks.press();
        clicks.cursor_moved(at(1.0, 1.0));
        assert_eq!(clicks.release(), None);
    }

    #[test]
    fn test_observe_tracks_cursor_events() {
        let mut clicks = ClickTracker::default();
        // SAFETY: the id is only compared, never handed to a platform backend
        let device_id = unsafe { winit::event::DeviceId::dummy() };

        clicks.observe(&WindowEvent::CursorMoved { device_id, position: at(300.0, 200.0) });
        clicks.press();
        clicks.observe(&WindowEvent::Focused(true));
        clicks.observe(&WindowEvent::CursorMoved { device_id, position: at(301.0, 201.0) });

        assert_eq!(clicks.release(), Some(at(301.0, 201.0)));
    }

    #[test]
    fn test_cancel_drops_pending_press() {
        let mut clicks = ClickTracker::default();
        clicks.cursor_moved(at(10.0, 10.0));
        clicks.press();
        clicks.cancel();

        assert_eq!(clicks.release(), None);
    }
}
