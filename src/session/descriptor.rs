//! Model descriptors as they appear in catalogs and on the wire

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

pub const DEFAULT_CAMERA_NEAR: f32 = 0.01;
pub const DEFAULT_CAMERA_FAR: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for Vector3<f32> {
    fn from(v: Vec3) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

fn default_camera_position() -> Vec3 {
    Vec3::new(0.0, 0.0, 5.0)
}

fn default_model_scale() -> Vec3 {
    Vec3::new(1.0, 1.0, 1.0)
}

/// One viewable model plus the camera placement it is shown with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub model_url: String,
    /// Sphere panorama shown behind the model
    #[serde(default, alias = "bg")]
    pub background_url: String,
    #[serde(default = "default_camera_position")]
    pub camera_position: Vec3,
    #[serde(default, alias = "modePosition")]
    pub model_position: Vec3,
    #[serde(default = "default_model_scale", alias = "modeScale")]
    pub model_scale: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_near: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_far: Option<f32>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, model_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            model_url: model_url.into(),
            background_url: String::new(),
            camera_position: default_camera_position(),
            model_position: Vec3::default(),
            model_scale: default_model_scale(),
            camera_near: None,
            camera_far: None,
        }
    }

    /// Title if set, otherwise the id
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }

    /// Near and far clip distances, with defaults applied
    ///
    /// # Errors
    /// [`ViewerError::InvalidClipPlanes`] unless `0 < near < far`.
    pub fn clip_planes(&self) -> Result<(f32, f32)> {
        let near = self.camera_near.unwrap_or(DEFAULT_CAMERA_NEAR);
        let far = self.camera_far.unwrap_or(DEFAULT_CAMERA_FAR);
        if near > 0.0 && near < far && far.is_finite() {
            Ok((near, far))
        } else {
            Err(ViewerError::InvalidClipPlanes { near, far })
        }
    }
}
