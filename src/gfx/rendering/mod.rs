//! Core rendering functionality
//!
//! The [`Renderer`] trait is what the session talks to; [`WgpuRenderer`]
//! implements it on top of wgpu with one forward pass per frame plus an
//! optional [`FrameOverlay`].

pub mod gpu_cache;
pub mod pipeline_manager;
pub mod render_engine;
pub mod renderer;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::WgpuRenderer;
pub use renderer::{FrameOverlay, OverlayTarget, Renderer, RendererSettings};
