//! # orbview Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use orbview::prelude::*;
//!
//! fn main() -> orbview::Result<()> {
//!     let catalog = Catalog::load("assets/catalog.json")?;
//!     ViewerApp::new(ViewerConfig::default(), catalog)?.run()
//! }
//! ```

pub use crate::app::{ViewerApp, WindowHost};
pub use crate::catalog::{Catalog, PanoramaEntry, PanoramaSource};
pub use crate::config::ViewerConfig;
pub use crate::error::{AssetError, Result, ViewerError};

pub use crate::gfx::camera::{ControlInput, OrbitControls, PerspectiveCamera, PointerButton};
pub use crate::gfx::rendering::{Renderer, RendererSettings, WgpuRenderer};
pub use crate::gfx::scene::{NodeId, Object3D, Scene};

pub use crate::loaders::{AssetResolver, FileModelLoader, ImageTextureLoader, ModelLoader, TextureLoader};

pub use crate::router::{Router, View};
pub use crate::session::{
    Background, InitOutcome, LoadTicket, ModelDescriptor, RenderSession, SessionCallbacks, Vec3,
    ViewHost, Viewport,
};
pub use crate::store::{SharedStore, ViewerStore};
