//! # Graphics Module
//!
//! Camera, scene graph, geometry, picking and the wgpu renderer.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Orbit camera with drag, pan and zoom controls
//! - **Geometry** ([`geometry`]) - Procedural planes, grids, axes and helper cones
//! - **Picking** ([`picking`]) - Pointer-to-world raycasts against scene meshes
//! - **Rendering Pipeline** ([`rendering`]) - Spot light shadow mapping and lit/line pipelines
//! - **Resource Management** ([`resources`]) - Uniform buffers, bind groups and depth textures
//! - **Scene Management** ([`scene`]) - Node hierarchy, meshes and lights
//!
//! Only [`rendering`] and [`resources`] touch the GPU. Everything else runs
//! without a device, which is what the unit tests rely on.

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
