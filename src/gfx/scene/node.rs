use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};

use super::{
    light::{AmbientLight, SpotLight},
    mesh::Mesh,
};

/// Index of a node in [`Scene`](super::Scene); stable because nodes are never removed
pub type NodeId = usize;

/// Name that marks the one node pointer picks may report
pub const INTERACTABLE_TAG: &str = "interactable";

/// What a node contributes to the frame
#[derive(Debug)]
pub enum NodeKind {
    /// Pure transform parent, draws nothing
    Group,
    Mesh(Mesh),
    SpotLight(SpotLight),
    AmbientLight(AmbientLight),
}

/// Surface parameters for mesh nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMaterial {
    pub color: [f32; 3],
    /// Draw triangle edges only
    pub wireframe: bool,
    /// Skip lighting; used by helpers and line sets
    pub unlit: bool,
}

impl Default for NodeMaterial {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8],
            wireframe: false,
            unlit: false,
        }
    }
}

// GPU resources struct to hold the per-node uniform buffer and bind group
#[derive(Debug)]
pub struct NodeGpuResources {
    pub object_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub transform: Matrix4<f32>, // local transform, relative to parent
    pub kind: NodeKind,
    pub material: NodeMaterial,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
    pub gpu_resources: Option<NodeGpuResources>, // None until the render engine prepares it
}

impl SceneNode {
    fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            transform: Matrix4::identity(),
            kind,
            material: NodeMaterial::default(),
            cast_shadow: false,
            receive_shadow: false,
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn group(name: &str) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: &str, mesh: Mesh) -> Self {
        Self::with_kind(name, NodeKind::Mesh(mesh))
    }

    /// A line-set node; always unlit
    pub fn lines(name: &str, mesh: Mesh) -> Self {
        let mut node = Self::with_kind(name, NodeKind::Mesh(mesh));
        node.material.unlit = true;
        node
    }

    pub fn spot_light(name: &str, light: SpotLight) -> Self {
        let mut node = Self::with_kind(name, NodeKind::SpotLight(light));
        node.cast_shadow = light.cast_shadow;
        node
    }

    pub fn ambient_light(name: &str, light: AmbientLight) -> Self {
        Self::with_kind(name, NodeKind::AmbientLight(light))
    }

    /// Builder pattern: set the local transform
    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    /// Builder pattern: set the surface color
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.material.color = color;
        self
    }

    pub fn with_cast_shadow(mut self, cast: bool) -> Self {
        self.cast_shadow = cast;
        self
    }

    pub fn with_receive_shadow(mut self, receive: bool) -> Self {
        self.receive_shadow = receive;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Apply rotation around X axis
    pub fn rotate_x(&mut self, angle: Deg<f32>) {
        self.transform = self.transform * Matrix4::from_angle_x(angle);
    }

    /// Replace the translation column, keeping rotation and scale
    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform.w = translation.extend(1.0);
    }

    pub fn mesh_ref(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_interactable(&self) -> bool {
        self.name == INTERACTABLE_TAG
    }

    /// Get the bind group holding this node's object uniform
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|res| &res.bind_group)
    }
}
