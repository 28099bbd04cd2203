use crate::gfx::{rendering::Renderer, scene::Object3D};

/// Releases every GPU resource an object references: geometry buffers,
/// textures and material uniforms.
///
/// Used for every replacement and at teardown. The object itself is left
/// untouched; drop it afterwards.
pub fn dispose_object3d(object: &Object3D, renderer: &mut dyn Renderer) {
    for mesh in &object.meshes {
        renderer.dispose_geometry(mesh.geometry.id());
        for material in &mesh.materials {
            if let Some(map) = &material.map {
                renderer.dispose_texture(map.id());
            }
            renderer.dispose_material(material.id());
        }
    }
    log::debug!("disposed object '{}'", object.name);
}
