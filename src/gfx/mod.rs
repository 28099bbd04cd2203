//! # Graphics Module
//!
//! Camera, scene graph, geometry, materials and the wgpu renderer.
//!
//! - **Camera** ([`camera`]) - Perspective camera and orbit controls
//! - **Geometry** ([`geometry`]) - Indexed meshes and the sphere/box generators
//! - **Rendering** ([`rendering`]) - The [`Renderer`] seam and [`WgpuRenderer`]
//! - **Resources** ([`resources`]) - Materials, textures and GPU bindings
//! - **Scene** ([`scene`]) - Objects and lights
//!
//! ## Usage
//!
//! ```no_run
//! use orbview::gfx::{camera::PerspectiveCamera, scene::Scene};
//!
//! let mut scene = Scene::new();
//! let mut camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.01, 1000.0);
//! camera.set_position(0.0, 0.0, 5.0);
//! // renderer.render(&scene, &camera)?;
//! ```
//!
//! [`Renderer`]: rendering::Renderer
//! [`WgpuRenderer`]: rendering::WgpuRenderer

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{OrbitControls, PerspectiveCamera};
pub use rendering::{Renderer, WgpuRenderer};
