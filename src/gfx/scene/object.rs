use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::{Matrix4, One, Quaternion, Vector3};

use crate::gfx::{
    geometry::Geometry,
    resources::{Material, ResourceId},
};

/// Identifies an object inside a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Geometry plus the materials its groups refer to
#[derive(Debug)]
pub struct Mesh {
    pub geometry: Geometry,
    pub materials: Vec<Material>,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            materials: vec![material],
        }
    }

    /// One material per geometry group, in group order
    pub fn with_materials(geometry: Geometry, materials: Vec<Material>) -> Self {
        Self {
            geometry,
            materials,
        }
    }

    /// Every resource id this mesh references (geometry, materials, textures)
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let mut ids = vec![self.geometry.id()];
        for material in &self.materials {
            ids.push(material.id());
            if let Some(map) = &material.map {
                ids.push(map.id());
            }
        }
        ids
    }
}

/// A positioned, scaled group of meshes
#[derive(Debug)]
pub struct Object3D {
    id: NodeId,
    pub name: String,
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    pub visible: bool,
    pub meshes: Vec<Mesh>,
}

impl Object3D {
    /// Create a new object with identity transformation
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            visible: true,
            meshes,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
    }

    /// Model matrix: translation * rotation * scale
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| mesh.geometry.data().triangle_count())
            .sum()
    }

    /// Returns the material of every mesh mutably, in mesh order
    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.meshes
            .iter_mut()
            .flat_map(|mesh| mesh.materials.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::{generate_box, Geometry};
    use cgmath::{SquareMatrix, Vector4};

    #[test]
    fn matrix_applies_scale_then_translation() {
        let mut object = Object3D::new("box", Vec::new());
        object.set_position(Vector3::new(1.0, 2.0, 3.0));
        object.set_scale(Vector3::new(2.0, 2.0, 2.0));

        let point = object.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(point, Vector4::new(3.0, 2.0, 3.0, 1.0));
        assert!(Object3D::new("empty", Vec::new()).matrix().is_identity());
    }

    #[test]
    fn resource_ids_cover_geometry_and_every_material() {
        let materials = (0..6).map(|i| Material::basic(&format!("face {i}"))).collect();
        let mesh = Mesh::with_materials(Geometry::new(generate_box(1.0, 1.0, 1.0)), materials);

        assert_eq!(mesh.resource_ids().len(), 7);
    }
}
