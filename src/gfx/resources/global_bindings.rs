//! Global uniform bindings for camera and scene data
//!
//! Manages the per-frame uniform shared by every draw: camera matrices, the
//! ambient term and the spot light used for lighting and shadow mapping.

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    gfx::{
        camera::camera_utils::CameraUniform,
        scene::LightingState,
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    /// w = 1 when a spot light is present
    pub light_position: [f32; 4],
    pub light_direction: [f32; 4],
    /// rgb = color, a = intensity
    pub light_color: [f32; 4],
    pub ambient_color: [f32; 4],
    /// x = cos outer, y = cos inner, z = decay, w = shadows enabled
    pub spot_params: [f32; 4],
}
// Total: 2 * 64 + 6 * 16 = 224 bytes

impl GlobalUniform {
    pub fn new(camera: &CameraUniform, lighting: &LightingState) -> Self {
        let [ar, ag, ab] = lighting.ambient;
        let mut content = Self {
            view_proj: camera.view_proj,
            light_view_proj: Matrix4::<f32>::identity().into(),
            view_position: camera.view_position,
            light_position: [0.0; 4],
            light_direction: [0.0, -1.0, 0.0, 0.0],
            light_color: [0.0; 4],
            ambient_color: [ar, ag, ab, 1.0],
            spot_params: [1.0, 1.0, 2.0, 0.0],
        };

        if let Some(spot) = &lighting.spot {
            let [r, g, b] = spot.color;
            content.light_view_proj = spot.view_proj.into();
            content.light_position = spot.position.extend(1.0).into();
            content.light_direction = spot.direction.extend(0.0).into();
            content.light_color = [r, g, b, spot.intensity];
            content.spot_params = [
                spot.cos_outer,
                spot.cos_inner,
                spot.decay,
                if spot.cast_shadow { 1.0 } else { 0.0 },
            ];
        }

        content
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Writes this frame's camera and light data into the global uniform buffer
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: &CameraUniform,
    lighting: &LightingState,
) {
    ubo.update_content(queue, GlobalUniform::new(camera, lighting));
}

/// Bind group for the global uniform, bound to slot 0 in every pipeline
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform()) // camera + lights
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    /// Used when creating render pipelines that need access to global uniforms.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{SpotLight, SpotState};
    use cgmath::Vector3;

    #[test]
    fn test_layout_size_matches_shader() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 224);
    }

    #[test]
    fn test_without_spot_light_only_ambient_remains() {
        let lighting = LightingState {
            ambient: [0.2, 0.2, 0.2],
            spot: None,
        };
        let content = GlobalUniform::new(&CameraUniform::default(), &lighting);

        assert_eq!(content.ambient_color, [0.2, 0.2, 0.2, 1.0]);
        assert_eq!(content.light_position[3], 0.0);
        assert_eq!(content.light_color[3], 0.0);
        assert_eq!(content.spot_params[3], 0.0);
    }

    #[test]
    fn test_spot_light_fields_are_packed() {
        let light = SpotLight {
            intensity: 800.0,
            angle: 0.4,
            cast_shadow: true,
            ..Default::default()
        };
        let spot = SpotState::new(&light, Vector3::new(0.0, 10.0, 0.0));
        let lighting = LightingState {
            ambient: [0.0; 3],
            spot: Some(spot),
        };
        let content = GlobalUniform::new(&CameraUniform::default(), &lighting);

        assert_eq!(content.light_position, [0.0, 10.0, 0.0, 1.0]);
        assert_eq!(content.light_direction, [0.0, -1.0, 0.0, 0.0]);
        assert_eq!(content.light_color, [1.0, 1.0, 1.0, 800.0]);
        assert_eq!(content.spot_params[0], spot.cos_outer);
        assert_eq!(content.spot_params[3], 1.0);
    }
}
