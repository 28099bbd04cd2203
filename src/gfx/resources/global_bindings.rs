//! Global uniform bindings for camera and scene lights
//!
//! Manages the uniform buffer and bind group for per-frame state shared by
//! every draw: the camera's view-projection matrix and the scene's ambient
//! and directional lights. Bound to slot 0 in the viewer pipelines.

use crate::{
    gfx::{camera::CameraUniform, scene::light::Light},
    wgpu_utils::uniform_buffer::UniformBuffer,
};

/// Upper bound on directional lights forwarded to the shader
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// One directional light as seen by the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Unit vector pointing from the scene towards the light; w = intensity
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

/// Global uniform buffer content
///
/// MUST match the `Globals` struct in `viewer.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    /// Summed ambient contribution (rgb), w unused
    pub ambient: [f32; 4],
    pub directional: [LightUniform; MAX_DIRECTIONAL_LIGHTS],
    /// x = number of valid entries in `directional`
    pub light_count: [u32; 4],
}

impl GlobalUniform {
    /// Builds the uniform from a camera and the scene's lights.
    ///
    /// Directional lights shine from their position towards the origin.
    /// Lights beyond [`MAX_DIRECTIONAL_LIGHTS`] are ignored.
    pub fn new<'a>(camera: CameraUniform, lights: impl IntoIterator<Item = &'a Light>) -> Self {
        let mut ambient = [0.0f32; 3];
        let mut directional = [LightUniform::default(); MAX_DIRECTIONAL_LIGHTS];
        let mut count = 0usize;

        for light in lights {
            match light {
                Light::Ambient(light) => {
                    for (sum, channel) in ambient.iter_mut().zip(light.color) {
                        *sum += channel * light.intensity;
                    }
                }
                Light::Directional(light) => {
                    if count == MAX_DIRECTIONAL_LIGHTS {
                        log::warn!("ignoring directional light beyond the first {MAX_DIRECTIONAL_LIGHTS}");
                        continue;
                    }
                    let direction = light.direction();
                    directional[count] = LightUniform {
                        direction: [direction.x, direction.y, direction.z, light.intensity],
                        color: [light.color[0], light.color[1], light.color[2], 1.0],
                    };
                    count += 1;
                }
            }
        }

        Self {
            view_proj: camera.view_proj,
            view_position: camera.view_position,
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
            directional,
            light_count: [count as u32, 0, 0, 0],
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Bind group layout and bind group for [`GlobalUBO`]
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        Self {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::light::{AmbientLight, DirectionalLight};
    use cgmath::Vector3;

    #[test]
    fn lights_are_packed_into_the_uniform() {
        let lights = vec![
            Light::Ambient(AmbientLight::new([1.0, 1.0, 1.0], 1.0)),
            Light::Directional(DirectionalLight::new(
                [1.0, 1.0, 1.0],
                0.8,
                Vector3::new(0.0, 10.0, 0.0),
            )),
        ];

        let uniform = GlobalUniform::new(CameraUniform::default(), &lights);

        assert_eq!(uniform.ambient, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniform.light_count[0], 1);
        assert_eq!(uniform.directional[0].direction, [0.0, 1.0, 0.0, 0.8]);
    }

    #[test]
    fn uniform_size_is_a_multiple_of_sixteen() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
    }
}
