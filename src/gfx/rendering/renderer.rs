//! The renderer seam
//!
//! [`crate::session::RenderSession`] drives a [`Renderer`] without knowing
//! whether it talks to a GPU. [`super::WgpuRenderer`] is the real one; tests
//! substitute a recording implementation.

use crate::{
    error::Result,
    gfx::{camera::PerspectiveCamera, resources::ResourceId, scene::Scene},
};

/// Options used when a renderer is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    /// Multisample the colour target
    pub antialias: bool,
    /// Clear to transparent instead of opaque black
    pub alpha: bool,
    /// Logical drawing size
    pub width: u32,
    pub height: u32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            alpha: true,
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
        }
    }
}

/// Draws a scene into a drawing surface and owns the GPU copies of scene
/// resources.
///
/// GPU copies are created lazily on first draw and live until the matching
/// `dispose_*` call, or until the renderer itself is disposed.
pub trait Renderer {
    /// Sets the logical drawing size
    fn set_size(&mut self, width: u32, height: u32);

    fn set_pixel_ratio(&mut self, ratio: f64);

    /// Logical drawing size
    fn size(&self) -> (u32, u32);

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()>;

    fn dispose_geometry(&mut self, id: ResourceId);

    fn dispose_material(&mut self, id: ResourceId);

    fn dispose_texture(&mut self, id: ResourceId);

    /// Releases the underlying graphics context right away
    fn force_context_loss(&mut self);

    /// Releases everything the renderer still holds. Rendering after this
    /// is a no-op.
    fn dispose(&mut self);
}

/// The render target an overlay draws into, after the scene pass
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    /// Physical size of `view`
    pub size: (u32, u32),
}

/// Something drawn on top of every frame, such as the control panel
pub trait FrameOverlay {
    fn draw(&mut self, target: OverlayTarget<'_>);
}
