//! # Scene Management Module
//!
//! The scene graph behind the viewer: an append-only list of nodes with
//! parent links, local transforms, materials, shadow flags and lights.
//!
//! ## Key Components
//!
//! - [`Scene`] - Node container that also owns the camera
//! - [`SceneNode`] - A mesh, line set, light or grouping node
//! - [`Mesh`] - Triangle or line geometry with lazily uploaded GPU buffers
//! - [`Vertex3D`] - GPU vertex layout
//!
//! ## Usage
//!
//! ```no_run
//! use pawnview::gfx::geometry::generate_plane;
//! use pawnview::gfx::scene::{Mesh, SceneNode};
//!
//! let board = SceneNode::mesh("interactable", Mesh::from_geometry(&generate_plane(64.0, 64.0, 1, 1)))
//!     .with_receive_shadow(true);
//! // scene.add_node(board);
//! ```

pub mod light;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use light::{AmbientLight, LightingState, SpotLight, SpotState};
pub use mesh::{DrawMesh, Mesh, Topology};
pub use node::{NodeId, NodeKind, NodeMaterial, SceneNode, INTERACTABLE_TAG};
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex3D;
