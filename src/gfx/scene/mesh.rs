use std::ops::Range;

use wgpu::{util::DeviceExt, Device};

use super::vertex::Vertex3D;
use crate::gfx::geometry::{triangle_edges, GeometryData};

/// How a mesh's index buffer is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// GPU copies of a mesh, created lazily by the render engine
#[derive(Debug)]
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    /// Unique triangle edges for wireframe drawing; `None` for line meshes
    pub edge_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
    pub edge_count: u32,
}

#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    edge_indices: Vec<u32>,
    topology: Topology,
    buffers: Option<MeshBuffers>,
    dirty: bool,
}

impl Mesh {
    /// Creates a triangle mesh from flat position/normal arrays
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let vertices = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .map(|(p, n)| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
            })
            .collect();

        Self::with_topology(vertices, indices, Topology::Triangles)
    }

    /// Creates a triangle mesh from generated geometry
    pub fn from_geometry(data: &GeometryData) -> Self {
        Self::new(data.flat_positions(), data.flat_normals(), data.indices.clone())
    }

    /// Creates a line-list mesh from generated geometry
    pub fn lines(data: &GeometryData) -> Self {
        let vertices = data
            .vertices
            .iter()
            .map(|&position| Vertex3D {
                position,
                normal: [0.0; 3],
            })
            .collect();

        Self::with_topology(vertices, data.indices.clone(), Topology::Lines)
    }

    fn with_topology(vertices: Vec<Vertex3D>, indices: Vec<u32>, topology: Topology) -> Self {
        let edge_indices = match topology {
            Topology::Triangles => triangle_edges(&indices),
            Topology::Lines => Vec::new(),
        };

        Self {
            vertices,
            indices,
            edge_indices,
            topology,
            buffers: None,
            dirty: true,
        }
    }

    /// Replaces the line geometry in place; buffers are re-uploaded before the next draw
    pub fn replace_lines(&mut self, data: &GeometryData) {
        *self = Self::lines(data);
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterates the local-space corners of each triangle. Empty for line meshes.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        let chunks = match self.topology {
            Topology::Triangles => self.indices.chunks_exact(3),
            Topology::Lines => self.indices[..0].chunks_exact(3),
        };

        chunks.filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?.position;
            let b = self.vertices.get(tri[1] as usize)?.position;
            let c = self.vertices.get(tri[2] as usize)?.position;
            Some([a, b, c])
        })
    }

    pub fn needs_upload(&self) -> bool {
        self.dirty || self.buffers.is_none()
    }

    pub fn buffers(&self) -> Option<&MeshBuffers> {
        self.buffers.as_ref()
    }

    /// Uploads vertex, index and edge buffers if missing or stale
    pub fn upload(&mut self, device: &Device) {
        if !self.needs_upload() {
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let edge_buffer = (!self.edge_indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Edge Index Buffer"),
                contents: bytemuck::cast_slice(&self.edge_indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        self.buffers = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
            edge_buffer,
            index_count: self.indices.len() as u32,
            edge_count: self.edge_indices.len() as u32,
        });
        self.dirty = false;
    }

    /// Smooth per-vertex normals for OBJ files that ship without them
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0f32; positions.len()];

        let corner = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            if i0.max(i1).max(i2) >= vertex_count {
                continue;
            }

            let (v0, v1, v2) = (corner(i0), corner(i1), corner(i2));
            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

            // Unnormalized cross product, so larger faces weigh more
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for vertex_idx in [i0, i1, i2] {
                for axis in 0..3 {
                    normals[vertex_idx * 3 + axis] += face_normal[axis];
                }
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|n| *n /= length);
            }
        }

        normals
    }
}

/// Draw helpers for meshes on a render pass
pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_edges(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_edges(&mut self, mesh: &'b Mesh) {
        let Some(buffers) = mesh.buffers() else {
            return;
        };
        let Some(edge_buffer) = &buffers.edge_buffer else {
            return;
        };

        self.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        self.set_index_buffer(edge_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..buffers.edge_count, 0, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        // Skip drawing if not uploaded
        let Some(buffers) = mesh.buffers() else {
            return;
        };

        self.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        self.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..buffers.index_count, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::{generate_grid, generate_plane};

    #[test]
    fn test_face_normals_point_along_winding() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = Mesh::calculate_face_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_face_normals_skip_out_of_range_indices() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = Mesh::calculate_face_normals(&positions, &[0, 1, 7]);
        assert!(normals.iter().all(|n| *n == 0.0));
    }

    #[test]
    fn test_triangles_iterates_plane() {
        let mesh = Mesh::from_geometry(&generate_plane(2.0, 2.0, 1, 1));
        assert_eq!(mesh.triangles().count(), 2);
        assert_eq!(mesh.topology(), Topology::Triangles);
        assert!(mesh.needs_upload());
    }

    #[test]
    fn test_line_mesh_has_no_triangles() {
        let mesh = Mesh::lines(&generate_grid(4.0, 2));
        assert_eq!(mesh.topology(), Topology::Lines);
        assert_eq!(mesh.triangles().count(), 0);
        assert_eq!(mesh.vertex_count(), 12);
    }
}
