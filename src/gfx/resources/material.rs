//! Material definitions
//!
//! A [`Material`] describes how a mesh surface is shaded. Two kinds exist:
//! [`MaterialKind::Basic`] is unlit (used for panorama backgrounds) and
//! [`MaterialKind::Standard`] is lit by the scene lights (used for models).
//! GPU resources for a material live in the renderer, keyed by its id.

use super::{texture::Texture, ResourceId};

/// Which faces of a mesh are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Front faces only (counter-clockwise winding)
    #[default]
    Front,
    /// Back faces only, for viewing a mesh from the inside
    Back,
    /// Both faces
    Double,
}

impl Side {
    /// The face to cull when rasterizing with this side
    pub fn cull_face(self) -> Option<wgpu::Face> {
        match self {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Unlit: colour and texture only
    Basic,
    /// Lit by ambient and directional lights
    Standard,
}

/// GPU uniform data for materials
///
/// MUST match the `MaterialUniform` struct in `viewer.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub uv_row0: [f32; 4],
    pub uv_row1: [f32; 4],
    /// x = lit flag, y = metallic, z = roughness, w = unused
    pub params: [f32; 4],
}

/// Surface description shared by every draw that references it
#[derive(Debug)]
pub struct Material {
    id: ResourceId,
    pub name: String,
    pub kind: MaterialKind,
    pub color: [f32; 4],
    pub map: Option<Texture>,
    pub side: Side,
    pub metallic: f32,
    pub roughness: f32,
}

impl Material {
    /// Creates an unlit material
    pub fn basic(name: &str) -> Self {
        Self::with_kind(name, MaterialKind::Basic)
    }

    /// Creates a lit material with the given base colour
    pub fn standard(name: &str, color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Self::with_kind(name, MaterialKind::Standard)
        }
    }

    fn with_kind(name: &str, kind: MaterialKind) -> Self {
        Self {
            id: ResourceId::next(),
            name: name.to_string(),
            kind,
            color: [1.0, 1.0, 1.0, 1.0],
            map: None,
            side: Side::Front,
            metallic: 0.0,
            roughness: 1.0,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Builder pattern: set the colour texture
    pub fn with_map(mut self, map: Texture) -> Self {
        self.map = Some(map);
        self
    }

    /// Builder pattern: set which faces are drawn
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Builds the uniform block uploaded to the GPU
    pub fn uniform(&self) -> MaterialUniform {
        let [row0, row1] = self
            .map
            .as_ref()
            .map(Texture::uv_transform)
            .unwrap_or([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

        MaterialUniform {
            color: self.color,
            uv_row0: [row0[0], row0[1], row0[2], 0.0],
            uv_row1: [row1[0], row1[1], row1[2], 0.0],
            params: [
                match self.kind {
                    MaterialKind::Basic => 0.0,
                    MaterialKind::Standard => 1.0,
                },
                self.metallic,
                self.roughness,
                0.0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::TextureData;

    #[test]
    fn back_side_culls_front_faces() {
        assert_eq!(Side::Back.cull_face(), Some(wgpu::Face::Front));
        assert_eq!(Side::Front.cull_face(), Some(wgpu::Face::Back));
        assert_eq!(Side::Double.cull_face(), None);
    }

    #[test]
    fn uniform_carries_lit_flag_and_uv_transform() {
        let lit = Material::standard("lit", [0.5, 0.5, 0.5, 1.0], 2.0, 0.25);
        assert_eq!(lit.uniform().params[0], 1.0);
        assert_eq!(lit.metallic, 1.0);

        let unlit = Material::basic("panorama").with_map(
            Texture::new(TextureData::solid([255; 4], "white"))
                .with_rotation([0.5, 0.5], std::f32::consts::PI),
        );
        let uniform = unlit.uniform();
        assert_eq!(uniform.params[0], 0.0);
        assert!((uniform.uv_row0[0] + 1.0).abs() < 1e-5);
        assert!((uniform.uv_row0[2] - 1.0).abs() < 1e-5);
    }
}
