//! glTF 2.0 import
//!
//! Flattens the default scene into world-space meshes: node transforms are
//! baked into positions and normals, so the resulting object can be placed
//! with a single transform.

use std::path::Path;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use super::{obj_import::file_stem, MaterialData, MeshData, ModelAsset};
use crate::{
    error::AssetError,
    gfx::{geometry::GeometryData, resources::TextureData},
};

pub(super) fn import(path: &Path) -> Result<ModelAsset, AssetError> {
    let (document, buffers, images) = gltf::import(path)?;

    let mut meshes = Vec::new();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, Matrix4::identity(), &buffers, &images, &mut meshes);
            }
        }
        // No scene at all: take every mesh as-is
        None => {
            for mesh in document.meshes() {
                collect_mesh(&mesh, Matrix4::identity(), &buffers, &images, &mut meshes);
            }
        }
    }

    Ok(ModelAsset {
        name: file_stem(path),
        meshes,
    })
}

fn collect_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    out: &mut Vec<MeshData>,
) {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        collect_mesh(&mesh, world, buffers, images, out);
    }
    for child in node.children() {
        collect_node(&child, world, buffers, images, out);
    }
}

fn collect_mesh(
    mesh: &gltf::Mesh,
    world: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    out: &mut Vec<MeshData>,
) {
    let normal_matrix = normal_matrix(world);

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!(
                "skipping {:?} primitive in mesh {:?}",
                primitive.mode(),
                mesh.name()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        let Some(positions) = reader.read_positions() else {
            continue;
        };

        let positions: Vec<[f32; 3]> = positions
            .map(|p| {
                let p = world * Vector4::new(p[0], p[1], p[2], 1.0);
                [p.x, p.y, p.z]
            })
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let uvs = reader
            .read_tex_coords(0)
            .map(|coords| {
                coords
                    .into_f32()
                    // glTF puts v = 0 at the top of the image
                    .map(|[u, v]| [u, 1.0 - v])
                    .collect()
            })
            .unwrap_or_default();

        let mut geometry = GeometryData {
            positions,
            normals: Vec::new(),
            uvs,
            indices,
            groups: Vec::new(),
        };
        match reader.read_normals() {
            Some(normals) => {
                geometry.normals = normals
                    .map(|n| {
                        let n = (normal_matrix * Vector3::from(n)).normalize();
                        [n.x, n.y, n.z]
                    })
                    .collect();
            }
            None => geometry.compute_vertex_normals(),
        }
        if world.determinant() < 0.0 {
            // Mirroring transform: restore counter-clockwise winding
            for triangle in geometry.indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }

        out.push(MeshData {
            geometry,
            material: convert_material(&primitive.material(), images),
        });
    }
}

fn normal_matrix(world: Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Matrix3::identity)
}

fn convert_material(material: &gltf::Material, images: &[gltf::image::Data]) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();
    let texture = pbr.base_color_texture().and_then(|info| {
        let index = info.texture().source().index();
        let image = images.get(index)?;
        to_texture_data(image, &format!("{}#image{index}", material.name().unwrap_or("material")))
            .map_err(|e| log::warn!("skipping base colour texture {index}: {e}"))
            .ok()
    });

    MaterialData {
        name: material.name().unwrap_or("material").to_string(),
        color: pbr.base_color_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        double_sided: material.double_sided(),
        texture,
    }
}

fn to_texture_data(image: &gltf::image::Data, source: &str) -> Result<TextureData, AssetError> {
    use gltf::image::Format;

    let pixel_count = (image.width * image.height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);
    match image.format {
        Format::R8G8B8A8 => rgba.extend_from_slice(&image.pixels),
        Format::R8G8B8 => {
            for pixel in image.pixels.chunks_exact(3) {
                rgba.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
            }
        }
        Format::R8G8 => {
            for pixel in image.pixels.chunks_exact(2) {
                rgba.extend_from_slice(&[pixel[0], pixel[0], pixel[0], pixel[1]]);
            }
        }
        Format::R8 => {
            for &value in &image.pixels {
                rgba.extend_from_slice(&[value, value, value, 255]);
            }
        }
        other => return Err(AssetError::UnsupportedFormat(format!("{other:?} pixels"))),
    }

    Ok(TextureData::new(image.width, image.height, rgba, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_pixels_gain_an_opaque_alpha() {
        let image = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };

        let texture = to_texture_data(&image, "test").unwrap();
        assert_eq!(texture.rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn normal_matrix_of_uniform_scale_keeps_directions() {
        let matrix = normal_matrix(Matrix4::from_scale(3.0));
        let n = (matrix * Vector3::unit_y()).normalize();
        assert!((n - Vector3::unit_y()).magnitude() < 1e-6);
    }
}
