//! # User Interface Module
//!
//! A Dear ImGui control panel drawn on top of the rendered scene.
//!
//! - [`UiManager`] integrates ImGui with winit and wgpu and implements
//!   [`FrameOverlay`](crate::gfx::rendering::FrameOverlay), so the renderer
//!   draws it after the scene pass of every frame.
//! - [`panel`] builds the panel: page navigation, model and panorama
//!   pickers, camera toggles and a status line.
//!
//! While the UI has mouse or keyboard focus, input is not forwarded to the
//! orbit controls.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{PanelState, UiAction};
