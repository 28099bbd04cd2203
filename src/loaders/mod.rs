//! # Asset Loaders
//!
//! Asynchronous loading of models and panorama images.
//!
//! The session only sees the [`ModelLoader`] and [`TextureLoader`] traits.
//! The file-backed implementations read and decode on a short-lived worker
//! thread and hand the result back through a oneshot channel, so the
//! returned futures never block the event loop.
//!
//! ## Supported formats
//!
//! - Models: `.gltf`, `.glb` (via `gltf`) and `.obj` (via `tobj`)
//! - Images: PNG, JPEG and BMP (via `image`)
//!
//! URLs are plain paths, optionally prefixed with `file://`. Relative paths
//! and paths that do not exist as given are resolved against the asset root.

mod gltf_import;
mod model;
mod obj_import;
mod texture;

use std::path::{Path, PathBuf};

use futures::{channel::oneshot, future::LocalBoxFuture, FutureExt};

use crate::{
    error::AssetError,
    gfx::{
        geometry::{Geometry, GeometryData},
        resources::{Material, Side, Texture, TextureData},
        scene::{Mesh, Object3D},
    },
};

pub use model::FileModelLoader;
pub use texture::ImageTextureLoader;

/// Loads a model by URL
pub trait ModelLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<ModelAsset, AssetError>>;
}

/// Loads an image by URL as RGBA8 pixels
pub trait TextureLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<TextureData, AssetError>>;
}

/// Surface parameters of one loaded mesh
#[derive(Debug, Clone)]
pub struct MaterialData {
    pub name: String,
    /// Linear RGBA base colour
    pub color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub double_sided: bool,
    pub texture: Option<TextureData>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            double_sided: false,
            texture: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub geometry: GeometryData,
    pub material: MaterialData,
}

/// A decoded model, not yet part of any scene
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub name: String,
    pub meshes: Vec<MeshData>,
}

impl ModelAsset {
    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| mesh.geometry.triangle_count())
            .sum()
    }

    /// Builds a scene object with lit materials
    pub fn into_object(self) -> Object3D {
        let meshes = self
            .meshes
            .into_iter()
            .map(|mesh| {
                let data = mesh.material;
                let mut material =
                    Material::standard(&data.name, data.color, data.metallic, data.roughness);
                if data.double_sided {
                    material = material.with_side(Side::Double);
                }
                if let Some(image) = data.texture {
                    material = material.with_map(Texture::new(image));
                }
                Mesh::new(Geometry::new(mesh.geometry), material)
            })
            .collect();

        Object3D::new(self.name, meshes)
    }
}

/// Maps asset URLs to files on disk
#[derive(Debug, Clone, Default)]
pub struct AssetResolver {
    root: Option<PathBuf>,
}

impl AssetResolver {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn resolve(&self, url: &str) -> Result<PathBuf, AssetError> {
        if let Some((scheme, _)) = url.split_once("://") {
            if !scheme.eq_ignore_ascii_case("file") {
                return Err(AssetError::UnsupportedScheme(url.to_string()));
            }
        }
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));

        match &self.root {
            Some(root) if !path.is_absolute() || !path.exists() => {
                let relative = path.strip_prefix("/").unwrap_or(path);
                Ok(root.join(relative))
            }
            _ => Ok(path.to_path_buf()),
        }
    }
}

/// Lowercased file extension of a URL, ignoring query and fragment
pub(crate) fn extension_of(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Runs blocking work on a worker thread and resolves with its result
pub(crate) fn spawn_blocking<T, F>(label: &str, work: F) -> LocalBoxFuture<'static, Result<T, AssetError>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AssetError> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name(format!("load {label}"))
        .spawn(move || {
            // The receiver is gone when the load was superseded
            let _ = sender.send(work());
        });

    async move {
        spawned?;
        match receiver.await {
            Ok(result) => result,
            Err(oneshot::Canceled) => Err(AssetError::Cancelled),
        }
    }
    .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_urls_are_rejected() {
        let resolver = AssetResolver::default();
        assert!(matches!(
            resolver.resolve("https://example.com/house.glb"),
            Err(AssetError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn relative_and_rooted_urls_resolve_under_the_root() {
        let resolver = AssetResolver::new(Some(PathBuf::from("/srv/assets")));

        assert_eq!(
            resolver.resolve("models/chair.glb").unwrap(),
            PathBuf::from("/srv/assets/models/chair.glb")
        );
        assert_eq!(
            resolver.resolve("file:///no/such/dir/bg.jpg").unwrap(),
            PathBuf::from("/srv/assets/no/such/dir/bg.jpg")
        );
    }

    #[test]
    fn extension_ignores_query_and_case() {
        assert_eq!(extension_of("scene.GLB?v=2").as_deref(), Some("glb"));
        assert_eq!(extension_of("textures/px.jpg#top").as_deref(), Some("jpg"));
        assert_eq!(extension_of("README"), None);
    }

    #[test]
    fn worker_panics_surface_as_cancelled() {
        let result: Result<(), _> =
            futures::executor::block_on(spawn_blocking("panicking", || panic!("decoder crashed")));
        assert!(matches!(result, Err(AssetError::Cancelled)));
    }

    #[test]
    fn asset_becomes_lit_object() {
        let asset = ModelAsset {
            name: "chair".to_string(),
            meshes: vec![MeshData {
                geometry: crate::gfx::geometry::generate_box(1.0, 1.0, 1.0),
                material: MaterialData {
                    double_sided: true,
                    ..Default::default()
                },
            }],
        };
        assert_eq!(asset.triangle_count(), 12);

        let object = asset.into_object();
        assert_eq!(object.name, "chair");
        assert_eq!(object.meshes[0].materials[0].side, Side::Double);
    }
}
