//! Scene lights

use cgmath::{InnerSpace, Vector3, Zero};

/// Uniform light reaching every surface equally
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: [f32; 3], intensity: f32) -> Self {
        Self { color, intensity }
    }
}

/// Parallel light shining from `position` towards the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vector3<f32>,
}

impl DirectionalLight {
    pub fn new(color: [f32; 3], intensity: f32, position: Vector3<f32>) -> Self {
        Self {
            color,
            intensity,
            position,
        }
    }

    /// Unit vector from the origin towards the light
    pub fn direction(&self) -> Vector3<f32> {
        if self.position.is_zero() {
            Vector3::unit_y()
        } else {
            self.position.normalize()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient(AmbientLight),
    Directional(DirectionalLight),
}

/// Handle to a light inside a [`super::Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub(crate) usize);
