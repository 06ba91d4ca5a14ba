use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Orbit controls for the board camera.
///
/// Left drag orbits, shift plus left drag pans and the wheel zooms. The drag
/// state comes from the window's left button, because raw device button ids
/// differ between platforms and Wayland reports none. Raw device events only
/// supply motion and wheel deltas.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    shift_held: bool,
    dragging: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            shift_held: false,
            dragging: false,
        }
    }

    /// Follows the window-level left button
    pub fn set_dragging(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Applies a raw motion or wheel delta to `camera`.
    ///
    /// Returns `true` when the camera moved.
    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            DeviceEvent::MouseWheel { delta } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, lines) => *lines,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32,
                };
                camera.add_distance(-notches * self.zoom_speed);
                true
            }
            DeviceEvent::MouseMotion { delta: (dx, dy) } if self.dragging => {
                let (dx, dy) = (*dx as f32, *dy as f32);
                if self.shift_held {
                    camera.pan((-dx * self.pan_speed, dy * self.pan_speed));
                } else {
                    camera.add_yaw(-dx * self.rotate_speed);
                    camera.add_pitch(dy * self.rotate_speed);
                }
                true
            }
            _ => false,
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event.physical_key {
            PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight) => {
                let held = event.state == ElementState::Pressed;
                if held != self.shift_held {
                    log::trace!("shift held: {}", held);
                }
                self.shift_held = held;
            }
            // Shift+C puts the camera back where it started
            PhysicalKey::Code(KeyCode::KeyC)
                if event.state == ElementState::Pressed && self.shift_held =>
            {
                log::info!("resetting camera to default position");
                camera.reset_to_default();
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, Zero};

    fn camera() -> OrbitCamera {
        OrbitCamera::new(20.0, 0.5, 0.0, Vector3::zero(), 1.5)
    }

    fn motion(dx: f64, dy: f64) -> DeviceEvent {
        DeviceEvent::MouseMotion { delta: (dx, dy) }
    }

    #[test]
    fn test_motion_without_button_does_not_orbit() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();

        assert!(!controller.process_events(&motion(40.0, 10.0), &mut camera));
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.5);
    }

    #[test]
    fn test_drag_follows_window_left_button() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();

        controller.set_dragging(true);
        assert!(controller.is_dragging());
        assert!(controller.process_events(&motion(40.0, 10.0), &mut camera));
        assert!((camera.yaw + 0.2).abs() < 1e-6);
        assert!((camera.pitch - 0.55).abs() < 1e-6);

        controller.set_dragging(false);
        let yaw = camera.yaw;
        assert!(!controller.process_events(&motion(40.0, 0.0), &mut camera));
        assert_eq!(camera.yaw, yaw);
    }

    #[test]
    fn test_wheel_zooms_without_drag() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();

        let wheel = DeviceEvent::MouseWheel {
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
        };
        assert!(controller.process_events(&wheel, &mut camera));
        assert!(camera.distance < 20.0);
    }
}
