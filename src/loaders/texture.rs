use std::path::Path;

use futures::{future::LocalBoxFuture, FutureExt};

use super::{spawn_blocking, AssetResolver, TextureLoader};
use crate::{error::AssetError, gfx::resources::TextureData};

/// Loads panorama images from disk and decodes them to RGBA8
#[derive(Debug, Clone, Default)]
pub struct ImageTextureLoader {
    resolver: AssetResolver,
}

impl ImageTextureLoader {
    pub fn new(resolver: AssetResolver) -> Self {
        Self { resolver }
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<TextureData, AssetError>> {
        match self.resolver.resolve(url) {
            Ok(path) => spawn_blocking(url, move || decode_image_file(&path)),
            Err(e) => futures::future::ready(Err(e)).boxed_local(),
        }
    }
}

pub(super) fn decode_image_file(path: &Path) -> Result<TextureData, AssetError> {
    let image = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .into_rgba8();
    let (width, height) = image.dimensions();
    log::debug!("decoded {} ({}x{})", path.display(), width, height);

    Ok(TextureData::new(
        width,
        height,
        image.into_raw(),
        path.display().to_string(),
    ))
}
