//! # Procedural Geometry Generation
//!
//! Generates the viewer's built-in shapes so that only the pawn itself has to
//! come from a model file.
//!
//! ## Supported Shapes
//!
//! - **Plane**: flat, subdivided quad used for the board and highlight marker
//! - **Grid**: line-list grid helper
//! - **Axes**: one line per world axis
//! - **Cone**: line-list outline of a spot light cone
//!
//! ## Usage
//!
//! ```rust
//! use pawnview::gfx::geometry::{generate_grid, generate_plane};
//!
//! let board = generate_plane(64.0, 64.0, 1, 1);
//! let grid = generate_grid(64.0, 10);
//! assert_eq!(board.triangle_count(), 2);
//! assert_eq!(grid.line_count(), 22);
//! ```

pub mod primitives;

pub use primitives::*;

use std::collections::HashSet;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding) or line pairs
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles when the indices form a triangle list
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of segments when the indices form a line list
    pub fn line_count(&self) -> usize {
        self.indices.len() / 2
    }

    /// Flattens positions into the `[x, y, z, x, y, z, ...]` layout used by meshes
    pub fn flat_positions(&self) -> Vec<f32> {
        self.vertices.iter().flatten().copied().collect()
    }

    /// Flattens normals, substituting +Y for missing entries
    pub fn flat_normals(&self) -> Vec<f32> {
        (0..self.vertices.len())
            .flat_map(|i| self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]))
            .collect()
    }
}

/// Builds a line list containing every unique edge of a triangle list.
pub fn triangle_edges(indices: &[u32]) -> Vec<u32> {
    let mut seen = HashSet::new();
    let mut edges = Vec::with_capacity(indices.len() * 2);

    for triangle in indices.chunks_exact(3) {
        for (a, b) in [
            (triangle[0], triangle[1]),
            (triangle[1], triangle[2]),
            (triangle[2], triangle[0]),
        ] {
            let key = (a.min(b), a.max(b));
            if seen.insert(key) {
                edges.push(key.0);
                edges.push(key.1);
            }
        }
    }

    edges
}
