use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{assets::ModelPatch, gfx::camera::camera_utils::CameraManager};

use super::{
    light::{LightingState, SpotState},
    node::{NodeId, NodeKind, SceneNode},
};

/// Main scene containing the node graph and the camera
///
/// Nodes are append-only: a [`NodeId`] handed out once stays valid for the
/// scene's lifetime.
pub struct Scene {
    pub camera_manager: CameraManager,
    nodes: Vec<SceneNode>,
}

impl Scene {
    /// Creates a new scene with the given camera manager
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            nodes: Vec::new(),
        }
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
    }

    /// Appends a top-level node
    pub fn add_node(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Appends a node under an existing parent
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        node.parent = (parent < self.nodes.len()).then_some(parent);
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Appends a root and its direct children in one step
    ///
    /// The whole subtree lands with a single `extend`, so no frame ever sees
    /// the root without its parts.
    pub fn append_subtree(&mut self, mut root: SceneNode, children: Vec<SceneNode>) -> NodeId {
        let root_id = self.nodes.len();
        root.parent = None;

        let subtree = std::iter::once(root).chain(children.into_iter().map(|mut child| {
            child.parent = Some(root_id);
            child
        }));

        self.nodes.extend(subtree);
        root_id
    }

    /// Appends a loaded model; returns the id of its root
    pub fn apply_patch(&mut self, patch: ModelPatch) -> NodeId {
        self.append_subtree(patch.root, patch.parts)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [SceneNode] {
        &mut self.nodes
    }

    /// Gets the total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|node| node.name == name)
    }

    /// Ids of `root` and every node below it
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = vec![root];
        // Parents always precede children, so one forward sweep is enough
        for id in root + 1..self.nodes.len() {
            if self.nodes[id].parent.is_some_and(|parent| ids.contains(&parent)) {
                ids.push(id);
            }
        }
        ids
    }

    /// Composes parent transforms down to `id`
    pub fn world_transform(&self, id: NodeId) -> Matrix4<f32> {
        let mut transform = Matrix4::identity();
        let mut current = Some(id);

        while let Some(index) = current {
            let Some(node) = self.nodes.get(index) else {
                break;
            };
            transform = node.transform * transform;
            current = node.parent.filter(|parent| *parent < index);
        }

        transform
    }

    /// Visible if the node and all its ancestors are visible
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(index) = current {
            let Some(node) = self.nodes.get(index) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            current = node.parent.filter(|parent| *parent < index);
        }
        true
    }

    /// World-space position of a node's origin
    pub fn world_position(&self, id: NodeId) -> Vector3<f32> {
        self.world_transform(id).w.truncate()
    }

    /// Gathers ambient and spot light contributions for the renderer
    ///
    /// Ambient lights add up; the first visible spot light drives lighting
    /// and the shadow map.
    pub fn lighting(&self) -> LightingState {
        let mut ambient = [0.0f32; 3];
        let mut spot = None;

        for (id, node) in self.nodes.iter().enumerate() {
            if !self.is_visible(id) {
                continue;
            }
            match &node.kind {
                NodeKind::AmbientLight(light) => {
                    let radiance = light.radiance();
                    for (total, add) in ambient.iter_mut().zip(radiance) {
                        *total += add;
                    }
                }
                NodeKind::SpotLight(light) if spot.is_none() => {
                    spot = Some(SpotState::new(light, self.world_position(id)));
                }
                _ => {}
            }
        }

        LightingState { ambient, spot }
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let meshes = self.nodes.iter().filter_map(SceneNode::mesh_ref);

        let (mesh_count, total_vertices, total_indices) =
            meshes.fold((0, 0, 0), |(count, vertices, indices), mesh| {
                (count + 1, vertices + mesh.vertex_count(), indices + mesh.indices().len())
            });

        SceneStatistics {
            node_count: self.nodes.len(),
            mesh_count,
            total_vertices,
            total_indices,
        }
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub node_count: usize,
    pub mesh_count: usize,
    pub total_vertices: usize,
    pub total_indices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        camera::{CameraController, OrbitCamera},
        scene::light::{AmbientLight, SpotLight},
    };

    fn empty_scene() -> Scene {
        let camera = OrbitCamera::new(10.0, 0.5, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)))
    }

    #[test]
    fn test_append_subtree_parents_children() {
        let mut scene = empty_scene();
        scene.add_node(SceneNode::group("ground"));

        let root = scene.append_subtree(
            SceneNode::group("model"),
            vec![SceneNode::group("part_a"), SceneNode::group("part_b")],
        );

        assert_eq!(root, 1);
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.node(2).and_then(|n| n.parent), Some(1));
        assert_eq!(scene.descendants(root), vec![1, 2, 3]);
    }

    #[test]
    fn test_world_transform_composes_parents() {
        let mut scene = empty_scene();
        let parent = scene.add_node(
            SceneNode::group("parent").with_transform(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))),
        );
        let child = scene.add_child(
            parent,
            SceneNode::group("child").with_transform(Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0))),
        );

        assert_eq!(scene.world_position(child), Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_hidden_parent_hides_child() {
        let mut scene = empty_scene();
        let parent = scene.add_node(SceneNode::group("parent").with_visible(false));
        let child = scene.add_child(parent, SceneNode::group("child"));
        assert!(!scene.is_visible(child));
    }

    #[test]
    fn test_lighting_sums_ambient_and_picks_first_spot() {
        let mut scene = empty_scene();
        scene.add_node(SceneNode::ambient_light(
            "ambient",
            AmbientLight {
                color: [0.2, 0.2, 0.2],
                intensity: 1.0,
            },
        ));
        scene.add_node(
            SceneNode::spot_light(
                "spot",
                SpotLight {
                    intensity: 800.0,
                    ..Default::default()
                },
            )
            .with_transform(Matrix4::from_translation(Vector3::new(0.0, 10.0, 0.0))),
        );

        let lighting = scene.lighting();
        assert_eq!(lighting.ambient, [0.2, 0.2, 0.2]);
        let spot = lighting.spot.expect("spot light present");
        assert_eq!(spot.intensity, 800.0);
        assert_eq!(spot.position, Vector3::new(0.0, 10.0, 0.0));
        assert_eq!(spot.direction, Vector3::new(0.0, -1.0, 0.0));
    }
}
