//! Per-node uniform bindings
//!
//! Every drawable node owns a small uniform buffer with its world transform
//! and material, bound to slot 1.

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    gfx::scene::{node::NodeGpuResources, NodeMaterial},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

/// MUST match the `Object` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x = unlit, y = receives shadows
    pub flags: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: Matrix4<f32>, material: &NodeMaterial, receive_shadow: bool) -> Self {
        let [r, g, b] = material.color;
        let flag = |on: bool| if on { 1.0 } else { 0.0 };

        Self {
            model: world.into(),
            color: [r, g, b, 1.0],
            flags: [flag(material.unlit), flag(receive_shadow), 0.0, 0.0],
        }
    }
}

pub struct ObjectBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl ObjectBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Object Bind Group Layout");

        Self { bind_group_layout }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Creates the buffer and bind group a node keeps for its lifetime
    pub fn create_node_resources(&self, device: &wgpu::Device, content: &ObjectUniform) -> NodeGpuResources {
        let object_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Uniform Buffer"),
            contents: bytemuck::bytes_of(content),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = BindGroupBuilder::new(&self.bind_group_layout)
            .resource(object_buffer.as_entire_binding())
            .create(device, "Object Bind Group");

        NodeGpuResources {
            object_buffer,
            bind_group,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_size_matches_shader() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 96);
    }

    #[test]
    fn test_flags_follow_material() {
        let material = NodeMaterial {
            color: [0.4, 0.9, 0.7],
            wireframe: false,
            unlit: true,
        };
        let uniform = ObjectUniform::new(Matrix4::from_scale(2.0), &material, false);

        assert_eq!(uniform.color, [0.4, 0.9, 0.7, 1.0]);
        assert_eq!(uniform.flags, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.model[0][0], 2.0);
    }
}
