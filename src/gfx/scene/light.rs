//! Light sources stored as scene nodes
//!
//! Lights follow physically based conventions: a spot light's intensity is in
//! candela and falls off with `distance^decay`.

use cgmath::{perspective, InnerSpace, Matrix4, Point3, Rad, Vector3};

use crate::config::ViewportConfig;
use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;

/// Smallest cone angle the shadow frustum is built for
const MIN_SHADOW_FOV: f32 = 0.05;

/// A cone light aimed at a world-space target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Cone half-angle in radians
    pub angle: f32,
    /// Fraction of the cone over which light fades to zero
    pub penumbra: f32,
    pub decay: f32,
    pub target: Vector3<f32>,
    pub cast_shadow: bool,
    pub shadow_near: f32,
    pub shadow_far: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            decay: 2.0,
            target: Vector3::new(0.0, 0.0, 0.0),
            cast_shadow: false,
            shadow_near: 0.5,
            shadow_far: 500.0,
        }
    }
}

impl SpotLight {
    /// Copies the tunable cone parameters from the viewport configuration.
    pub fn apply_viewport(&mut self, config: &ViewportConfig) {
        self.angle = config.light_angle;
        self.penumbra = config.light_penumbra;
        self.intensity = config.light_intensity;
    }

    /// Cosines of the outer cone edge and the start of the penumbra falloff.
    ///
    /// The inner cosine is kept strictly above the outer one so the shader's
    /// `smoothstep` never sees equal edges.
    pub fn cone_cosines(&self) -> (f32, f32) {
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra.clamp(0.0, 1.0))).cos();
        (outer, inner.max(outer + 1e-4))
    }

    /// Unit vector from `position` toward the target; -Y if they coincide.
    pub fn direction_from(&self, position: Vector3<f32>) -> Vector3<f32> {
        let offset = self.target - position;
        if offset.magnitude2() <= f32::EPSILON {
            -Vector3::unit_y()
        } else {
            offset.normalize()
        }
    }

    /// World-to-light view matrix looking from `position` toward the target
    pub fn view_matrix(&self, position: Vector3<f32>) -> Matrix4<f32> {
        let direction = self.direction_from(position);
        let up = if direction.y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };

        Matrix4::look_to_rh(Point3::new(position.x, position.y, position.z), direction, up)
    }

    /// View-projection of the shadow frustum, in wgpu clip space.
    pub fn shadow_view_proj(&self, position: Vector3<f32>) -> Matrix4<f32> {
        let fov = (self.angle * 2.0).clamp(MIN_SHADOW_FOV, std::f32::consts::PI - MIN_SHADOW_FOV);
        let proj = perspective(Rad(fov), 1.0, self.shadow_near, self.shadow_far);

        OPENGL_TO_WGPU_MATRIX * proj * self.view_matrix(position)
    }
}

/// Uniform light applied to every lit surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl AmbientLight {
    pub fn radiance(&self) -> [f32; 3] {
        self.color.map(|c| c * self.intensity)
    }
}

/// Per-frame light state gathered from the scene graph for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingState {
    pub ambient: [f32; 3],
    pub spot: Option<SpotState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotState {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
    pub cos_outer: f32,
    pub cos_inner: f32,
    pub decay: f32,
    pub cast_shadow: bool,
    pub view_proj: Matrix4<f32>,
}

impl SpotState {
    pub fn new(light: &SpotLight, position: Vector3<f32>) -> Self {
        let (cos_outer, cos_inner) = light.cone_cosines();
        Self {
            position,
            direction: light.direction_from(position),
            color: light.color,
            intensity: light.intensity,
            cos_outer,
            cos_inner,
            decay: light.decay,
            cast_shadow: light.cast_shadow,
            view_proj: light.shadow_view_proj(position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cone_cosines_hard_edge() {
        let light = SpotLight {
            angle: 0.4,
            penumbra: 0.0,
            ..Default::default()
        };
        let (outer, inner) = light.cone_cosines();
        assert!((outer - 0.4f32.cos()).abs() < 1e-6);
        assert!(inner > outer);
    }

    #[test]
    fn test_cone_cosines_full_penumbra() {
        let light = SpotLight {
            angle: 0.4,
            penumbra: 1.0,
            ..Default::default()
        };
        let (_, inner) = light.cone_cosines();
        assert_eq!(inner, 1.0);
    }

    #[test]
    fn test_apply_viewport() {
        let mut light = SpotLight::default();
        let config = ViewportConfig {
            light_angle: 0.7,
            light_penumbra: 0.25,
            light_intensity: 120.0,
            ..Default::default()
        };
        light.apply_viewport(&config);
        assert_eq!(light.angle, 0.7);
        assert_eq!(light.penumbra, 0.25);
        assert_eq!(light.intensity, 120.0);
    }

    #[test]
    fn test_shadow_frustum_centers_target() {
        let light = SpotLight {
            angle: 0.4,
            ..Default::default()
        };
        let position = Vector3::new(50.0, 50.0, 50.0);
        let clip = light.shadow_view_proj(position) * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
