use std::path::Path;

use super::{texture::decode_image_file, MaterialData, MeshData, ModelAsset};
use crate::{error::AssetError, gfx::geometry::GeometryData};

pub(super) fn import(path: &Path) -> Result<ModelAsset, AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("{}: ignoring material library: {e}", path.display());
        Vec::new()
    });
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let meshes = models
        .into_iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = model.mesh;
            let mut geometry = GeometryData {
                positions: mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
                normals: mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect(),
                uvs: mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect(),
                indices: mesh.indices,
                groups: Vec::new(),
            };
            // Use normals from the file if they line up, otherwise compute them
            if geometry.normals.len() != geometry.positions.len() {
                geometry.compute_vertex_normals();
            }

            let material = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|material| convert_material(material, base_dir))
                .unwrap_or_else(|| MaterialData {
                    name: model.name.clone(),
                    ..Default::default()
                });

            MeshData { geometry, material }
        })
        .collect();

    Ok(ModelAsset {
        name: file_stem(path),
        meshes,
    })
}

fn convert_material(material: &tobj::Material, base_dir: &Path) -> MaterialData {
    let [r, g, b] = material.diffuse.unwrap_or([1.0, 1.0, 1.0]);
    let alpha = material.dissolve.unwrap_or(1.0);
    let shininess = material.shininess.unwrap_or(0.0);

    let texture = material.diffuse_texture.as_ref().and_then(|name| {
        let texture_path = base_dir.join(name);
        decode_image_file(&texture_path)
            .map_err(|e| log::warn!("{}: {e}", texture_path.display()))
            .ok()
    });

    MaterialData {
        name: material.name.clone(),
        color: [r, g, b, alpha],
        metallic: 0.0,
        // Phong exponent 0..1000 mapped onto roughness 1..0
        roughness: 1.0 - (shininess / 1000.0).clamp(0.0, 1.0),
        double_sided: false,
        texture,
    }
}

pub(super) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model")
        .to_string()
}
