use super::{
    light::{Light, LightId},
    object::{NodeId, Object3D},
};

/// Scene container holding objects and lights
///
/// Objects are kept in insertion order, which is also draw order.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<Object3D>,
    lights: Vec<Light>,
}

impl Scene {
    /// Creates an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object and returns its id
    pub fn add(&mut self, object: Object3D) -> NodeId {
        let id = object.id();
        self.objects.push(object);
        id
    }

    /// Removes an object, handing it back so its resources can be released
    pub fn remove(&mut self, id: NodeId) -> Option<Object3D> {
        let index = self.objects.iter().position(|object| object.id() == id)?;
        Some(self.objects.remove(index))
    }

    pub fn get(&self, id: NodeId) -> Option<&Object3D> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Object3D> {
        self.objects.iter_mut().find(|object| object.id() == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object3D> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        self.lights.push(light);
        LightId(self.lights.len() - 1)
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id.0)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(id.0)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Removes every object and light, returning the objects
    pub fn clear(&mut self) -> Vec<Object3D> {
        self.lights.clear();
        std::mem::take(&mut self.objects)
    }

    /// Gets statistics about the scene
    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            object_count: self.objects.len(),
            light_count: self.lights.len(),
            total_triangles: self.objects.iter().map(Object3D::triangle_count).sum(),
        }
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub light_count: usize,
    pub total_triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::light::AmbientLight;

    #[test]
    fn remove_hands_back_the_object() {
        let mut scene = Scene::new();
        let first = scene.add(Object3D::new("first", Vec::new()));
        let second = scene.add(Object3D::new("second", Vec::new()));

        let removed = scene.remove(first).expect("object should be present");
        assert_eq!(removed.name, "first");
        assert!(!scene.contains(first));
        assert!(scene.contains(second));
        assert!(scene.remove(first).is_none());
    }

    #[test]
    fn clear_drops_lights_and_returns_objects() {
        let mut scene = Scene::new();
        scene.add(Object3D::new("model", Vec::new()));
        scene.add_light(Light::Ambient(AmbientLight::new([1.0; 3], 1.0)));

        let objects = scene.clear();
        assert_eq!(objects.len(), 1);
        assert_eq!(scene.statistics().object_count, 0);
        assert!(scene.lights().is_empty());
    }
}
