//! orbview
//!
//! A viewer for 3D models (glTF, OBJ) and 360° panoramas, built on wgpu and
//! winit. The core is [`session::RenderSession`], which owns a scene, camera,
//! renderer and orbit controls for one view and swaps models and
//! backgrounds in and out of it. [`app::ViewerApp`] hosts a session in a
//! window with a small ImGui panel, a router and a shared store.

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gfx;
pub mod loaders;
pub mod prelude;
pub mod router;
pub mod session;
pub mod store;
pub mod ui;
pub mod wgpu_utils;

pub use app::ViewerApp;
pub use error::{Result, ViewerError};
