//! # Scene Management Module
//!
//! The scene is a flat container of [`Object3D`]s (each a transform plus
//! meshes) and [`Light`]s. The renderer walks it every frame.
//!
//! ## Key Components
//!
//! - [`Scene`] - Objects and lights, in draw order
//! - [`Object3D`] - Transform plus meshes
//! - [`Mesh`] - Geometry with one material per geometry group
//! - [`Vertex3D`] - GPU vertex layout
//!
//! Objects handed back by [`Scene::remove`] and [`Scene::clear`] still own
//! their GPU-side resources in the renderer; release them with
//! [`crate::session::dispose_object3d`].

pub mod light;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use light::{AmbientLight, DirectionalLight, Light, LightId};
pub use object::{Mesh, NodeId, Object3D};
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex3D;
