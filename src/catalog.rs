//! Catalog files listing what the viewer can show
//!
//! ```json
//! {
//!   "models": [
//!     { "id": "1", "title": "Robot", "modelUrl": "models/robot.glb",
//!       "bg": "panoramas/sky.jpg", "cameraPosition": {"x": 0, "y": 1, "z": 4} }
//!   ],
//!   "panoramas": [
//!     { "title": "Garden", "image": "panoramas/garden.jpg" },
//!     { "title": "Living room",
//!       "faces": ["px.jpg", "nx.jpg", "py.jpg", "ny.jpg", "pz.jpg", "nz.jpg"] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{CatalogError, Result, ViewerError},
    session::ModelDescriptor,
};

/// Image source of a panorama
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PanoramaSource {
    /// One equirectangular image wrapped around a sphere
    Sphere { image: String },
    /// Six images, ordered +X, -X, +Y, -Y, +Z, -Z
    Cube { faces: [String; 6] },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanoramaEntry {
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub source: PanoramaSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
    #[serde(default)]
    pub panoramas: Vec<PanoramaEntry>,
}

impl Catalog {
    /// Reads and parses a catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let wrap = |source: CatalogError| ViewerError::Catalog {
            path: path.display().to_string(),
            source,
        };

        let text = std::fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
        let catalog = Self::parse(&text).map_err(wrap)?;
        log::info!(
            "catalog {}: {} models, {} panoramas",
            path.display(),
            catalog.models.len(),
            catalog.panoramas.len()
        );
        Ok(catalog)
    }

    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut catalog: Catalog = serde_json::from_str(text)?;
        // Entries without an id are addressed by position
        for (index, model) in catalog.models.iter_mut().enumerate() {
            if model.id.is_empty() {
                model.id = (index + 1).to_string();
            }
        }
        Ok(catalog)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.panoramas.is_empty()
    }

    pub fn model(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| model.id == id)
    }

    /// Index of the first cube panorama, the default for the panorama page
    pub fn first_cube(&self) -> Option<usize> {
        self.panoramas
            .iter()
            .position(|entry| matches!(entry.source, PanoramaSource::Cube { .. }))
    }
}
