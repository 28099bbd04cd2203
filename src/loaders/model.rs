use futures::{future::LocalBoxFuture, FutureExt};

use super::{extension_of, gltf_import, obj_import, spawn_blocking, AssetResolver, ModelAsset, ModelLoader};
use crate::error::AssetError;

/// Loads models from disk, picking the importer by file extension
#[derive(Debug, Clone, Default)]
pub struct FileModelLoader {
    resolver: AssetResolver,
}

impl FileModelLoader {
    pub fn new(resolver: AssetResolver) -> Self {
        Self { resolver }
    }
}

impl ModelLoader for FileModelLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<ModelAsset, AssetError>> {
        let path = match self.resolver.resolve(url) {
            Ok(path) => path,
            Err(e) => return futures::future::ready(Err(e)).boxed_local(),
        };

        let extension = extension_of(url).unwrap_or_default();
        let import: fn(&std::path::Path) -> Result<ModelAsset, AssetError> = match extension.as_str() {
            "gltf" | "glb" => gltf_import::import,
            "obj" => obj_import::import,
            _ => {
                return futures::future::ready(Err(AssetError::UnsupportedFormat(extension)))
                    .boxed_local()
            }
        };

        log::debug!("loading model {}", path.display());
        spawn_blocking(url, move || {
            let asset = import(&path)?;
            if asset.meshes.is_empty() {
                return Err(AssetError::EmptyModel);
            }
            log::info!(
                "loaded model '{}': {} meshes, {} triangles",
                asset.name,
                asset.meshes.len(),
                asset.triangle_count()
            );
            Ok(asset)
        })
    }
}
