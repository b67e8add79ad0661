//! Inward-facing UV sphere for equirectangular projection.
//!
//! Vertices are laid out in rows from the north pole (`v = 0`) to the south
//! pole (`v = 1`), each row running once around the sphere (`u = 0..1`).
//! `u = 0` lies on +x and `u = 0.25` on +z, so the texture reads left to
//! right from inside.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::PI;

/// Sphere radius used by the viewer.
pub const DEFAULT_RADIUS: f32 = 500.0;
/// Segments around the equator.
pub const DEFAULT_WIDTH_SEGMENTS: u32 = 60;
/// Segments from pole to pole.
pub const DEFAULT_HEIGHT_SEGMENTS: u32 = 40;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl SphereVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// CPU-side sphere geometry.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    /// Build a sphere with the viewer's default resolution.
    pub fn panorama() -> Self {
        Self::inward(DEFAULT_RADIUS, DEFAULT_WIDTH_SEGMENTS, DEFAULT_HEIGHT_SEGMENTS)
    }

    /// Build an inward-facing sphere.
    ///
    /// Segment counts below 3 (width) or 2 (height) are raised to those minimums.
    pub fn inward(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let row_len = width_segments + 1;

        let mut vertices = Vec::with_capacity((row_len * (height_segments + 1)) as usize);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * 2.0 * PI;
                vertices.push(SphereVertex {
                    position: [
                        radius * phi.cos() * theta.sin(),
                        radius * theta.cos(),
                        radius * phi.sin() * theta.sin(),
                    ],
                    tex_coords: [u, v],
                });
            }
        }

        // The pole rows collapse to a point, so they only get one triangle per quad.
        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row_len + ix + 1;
                let b = iy * row_len + ix;
                let c = (iy + 1) * row_len + ix;
                let d = (iy + 1) * row_len + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn length(p: [f32; 3]) -> f32 {
        (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt()
    }

    #[test]
    fn test_vertex_and_index_counts() {
        let mesh = SphereMesh::inward(1.0, 60, 40);
        assert_eq!(mesh.vertices.len(), 61 * 41);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(mesh.indices.len(), (60 * 40 * 2 - 2 * 60) * 3);
    }

    #[test]
    fn test_all_vertices_on_sphere() {
        let mesh = SphereMesh::panorama();
        for vertex in &mesh.vertices {
            assert!((length(vertex.position) - DEFAULT_RADIUS).abs() < 0.01);
        }
    }

    #[test]
    fn test_indices_in_range() {
        let mesh = SphereMesh::inward(2.0, 8, 6);
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn test_north_pole_maps_to_top_of_texture() {
        let mesh = SphereMesh::inward(1.0, 8, 4);
        let first = mesh.vertices[0];
        assert!((first.position[1] - 1.0).abs() < EPSILON);
        assert_eq!(first.tex_coords[1], 0.0);
        let last = mesh.vertices[mesh.vertices.len() - 1];
        assert!((last.position[1] + 1.0).abs() < EPSILON);
        assert_eq!(last.tex_coords[1], 1.0);
    }

    #[test]
    fn test_seam_faces_positive_x() {
        // u = 0 on the equator sits on +x, u = 0.25 on +z.
        let mesh = SphereMesh::inward(1.0, 4, 2);
        let equator = &mesh.vertices[5..10];
        assert!((equator[0].position[0] - 1.0).abs() < EPSILON);
        assert_eq!(equator[0].tex_coords[0], 0.0);
        assert!((equator[1].position[2] - 1.0).abs() < EPSILON);
        assert_eq!(equator[1].tex_coords[0], 0.25);
    }

    #[test]
    fn test_minimum_segments() {
        let mesh = SphereMesh::inward(1.0, 0, 0);
        assert_eq!(mesh.vertices.len(), 4 * 3);
        assert!(!mesh.indices.is_empty());
    }
}
