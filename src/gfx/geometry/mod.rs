//! # Geometry
//!
//! Indexed triangle geometry plus procedural generators for the shapes the
//! viewer needs: a UV sphere for spherical panoramas and a box with one
//! material group per face for cube panoramas.
//!
//! ## Usage
//!
//! ```rust
//! use orbview::gfx::geometry::{generate_box, generate_sphere, Geometry};
//!
//! let sphere = Geometry::new(generate_sphere(500.0, 100, 100));
//!
//! // Flip one axis so the faces point inwards
//! let mut cube = Geometry::new(generate_box(10.0, 10.0, 10.0));
//! cube.scale(1.0, 1.0, -1.0);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::{resources::ResourceId, scene::vertex::Vertex3D};

/// A run of indices drawn with one material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    /// First index of the run
    pub start: u32,
    /// Number of indices in the run
    pub count: u32,
    /// Index into the owning mesh's material list
    pub material_index: usize,
}

/// Raw geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub positions: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (u, v), v pointing up
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
    /// Material groups; empty means one group covering every index
    pub groups: Vec<GeometryGroup>,
}

impl GeometryData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn add_group(&mut self, start: u32, count: u32, material_index: usize) {
        self.groups.push(GeometryGroup {
            start,
            count,
            material_index,
        });
    }

    /// Computes smooth per-vertex normals from the triangle list
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![[0.0f32; 3]; self.positions.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let (p0, p1, p2) = (self.positions[a], self.positions[b], self.positions[c]);
            let e1 = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
            let e2 = [p2[0] - p0[0], p2[1] - p0[1], p2[2] - p0[2]];
            let face = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            for vertex in [a, b, c] {
                for axis in 0..3 {
                    normals[vertex][axis] += face[axis];
                }
            }
        }

        for normal in normals.iter_mut() {
            *normal = normalize(*normal);
        }
        self.normals = normals;
    }

    /// Interleaves positions, normals and uvs into GPU vertices
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.positions.len())
            .map(|i| Vertex3D {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: self.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

/// Geometry with an identity, so its GPU buffers can be released
#[derive(Debug)]
pub struct Geometry {
    id: ResourceId,
    data: GeometryData,
}

impl Geometry {
    pub fn new(data: GeometryData) -> Self {
        Self {
            id: ResourceId::next(),
            data,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn data(&self) -> &GeometryData {
        &self.data
    }

    /// Scales vertex positions in place.
    ///
    /// Normals are transformed with the inverse scale and renormalized. A
    /// negative factor on one axis mirrors the geometry, which reverses the
    /// apparent winding of every triangle: outward faces become inward ones.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        for position in self.data.positions.iter_mut() {
            position[0] *= x;
            position[1] *= y;
            position[2] *= z;
        }
        for normal in self.data.normals.iter_mut() {
            *normal = normalize([normal[0] / x, normal[1] / y, normal[2] / z]);
        }
    }

    /// The index ranges to draw, each with its material slot
    pub fn draw_groups(&self) -> Vec<GeometryGroup> {
        if self.data.groups.is_empty() {
            vec![GeometryGroup {
                start: 0,
                count: self.data.indices.len() as u32,
                material_index: 0,
            }]
        } else {
            self.data.groups.clone()
        }
    }
}

pub(crate) fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length > 0.0 {
        [v[0] / length, v[1] / length, v[2] / length]
    } else {
        v
    }
}
