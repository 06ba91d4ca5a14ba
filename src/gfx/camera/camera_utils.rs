use cgmath::{Matrix4, SquareMatrix};
use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

/// The board camera together with the controls that steer it
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Feeds a raw motion or wheel delta to the controls, redrawing if the
    /// camera moved
    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        if self.controller.process_events(event, &mut self.camera) {
            window.request_redraw();
        }
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller.process_keyed_events(event, &mut self.camera);
    }

    /// Starts or ends an orbit drag from the window's left button
    pub fn set_dragging(&mut self, pressed: bool) {
        self.controller.set_dragging(pressed);
    }
}

/// Anything that can produce a clip-space transform for the renderer
pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

/// Camera block of the global uniform, uploaded once per frame
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// Eye position; `w` pads the block to 16 bytes
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::<f32>::identity().into(),
        }
    }
}
