// src/gfx/resources/mod.rs
//! Scene resources: textures, materials and the GPU-side bindings for them.
//!
//! CPU-side resources ([`Texture`], [`Material`], and geometry in
//! [`crate::gfx::geometry`]) each carry a [`ResourceId`]. The renderer caches
//! its GPU copies under that id and releases them when told to dispose it.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod global_bindings;
pub mod material;
pub mod texture;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalUniform, LightUniform, MAX_DIRECTIONAL_LIGHTS};
pub use material::{Material, MaterialKind, Side};
pub use texture::{Texture, TextureData};
pub use texture_resource::TextureResource;

/// Identifies a disposable resource (geometry, material or texture)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Allocates a fresh, process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}
