//! Error types for the viewer
//!
//! Asset failures are reported through [`AssetError`], wrapped into
//! [`ViewerError::AssetLoad`] together with the URL that failed. Skipped
//! operations (missing container, double init) are not errors and never
//! show up here.

use thiserror::Error;

/// Why a single asset (model or image) could not be loaded
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported asset format `{0}`")]
    UnsupportedFormat(String),

    #[error("unsupported URL scheme in `{0}`")]
    UnsupportedScheme(String),

    #[error("model contains no triangle meshes")]
    EmptyModel,

    #[error("load was cancelled before it completed")]
    Cancelled,
}

/// Errors surfaced by the viewer library
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load asset `{url}`")]
    AssetLoad {
        url: String,
        #[source]
        source: AssetError,
    },

    #[error("invalid clip planes: near={near}, far={far} (expected 0 < near < far)")]
    InvalidClipPlanes { near: f32, far: f32 },

    #[error("renderer error: {0}")]
    Renderer(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("no route matches `{0}`")]
    RouteNotFound(String),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to read catalog `{path}`")]
    Catalog {
        path: String,
        #[source]
        source: CatalogError,
    },
}

/// Failure while reading a catalog file
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ViewerError {
    pub fn asset(url: impl Into<String>, source: AssetError) -> Self {
        Self::AssetLoad {
            url: url.into(),
            source,
        }
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
