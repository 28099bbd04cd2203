//! CPU-side textures
//!
//! [`TextureData`] is decoded RGBA8 pixel data as produced by a texture
//! loader. [`Texture`] wraps it with a [`ResourceId`] and the UV transform
//! (center + rotation) used when sampling.

use std::sync::Arc;

use super::ResourceId;

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first
    pub rgba: Vec<u8>,
    /// Where the image came from, for logging
    pub source: String,
}

impl TextureData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>, source: impl Into<String>) -> Self {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            rgba,
            source: source.into(),
        }
    }

    /// A single-colour 1x1 image
    pub fn solid(color: [u8; 4], source: impl Into<String>) -> Self {
        Self::new(1, 1, color.to_vec(), source)
    }
}

/// A texture as referenced by a material
#[derive(Debug)]
pub struct Texture {
    id: ResourceId,
    pub image: Arc<TextureData>,
    /// Pivot of the rotation, in UV space
    pub center: [f32; 2],
    /// Rotation in radians around `center`
    pub rotation: f32,
    pub offset: [f32; 2],
    pub repeat: [f32; 2],
}

impl Texture {
    pub fn new(image: impl Into<Arc<TextureData>>) -> Self {
        Self {
            id: ResourceId::next(),
            image: image.into(),
            center: [0.0, 0.0],
            rotation: 0.0,
            offset: [0.0, 0.0],
            repeat: [1.0, 1.0],
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Builder pattern: rotate the texture around a pivot
    pub fn with_rotation(mut self, center: [f32; 2], rotation: f32) -> Self {
        self.center = center;
        self.rotation = rotation;
        self
    }

    /// Returns the top two rows of the 3x3 UV transform matrix.
    ///
    /// The third row is always `[0, 0, 1]`. A UV coordinate `(u, v)` maps to
    /// `(row0 · (u, v, 1), row1 · (u, v, 1))`.
    pub fn uv_transform(&self) -> [[f32; 3]; 2] {
        let [tx, ty] = self.offset;
        let [sx, sy] = self.repeat;
        let [cx, cy] = self.center;
        let (s, c) = self.rotation.sin_cos();

        [
            [sx * c, sx * s, -sx * (c * cx + s * cy) + cx + tx],
            [-sy * s, sy * c, -sy * (-s * cx + c * cy) + cy + ty],
        ]
    }

    /// Applies [`Texture::uv_transform`] to a single coordinate
    pub fn transform_uv(&self, uv: [f32; 2]) -> [f32; 2] {
        let [row0, row1] = self.uv_transform();
        [
            row0[0] * uv[0] + row0[1] * uv[1] + row0[2],
            row1[0] * uv[0] + row1[1] * uv[1] + row1[2],
        ]
    }
}
