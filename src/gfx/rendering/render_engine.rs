//! wgpu implementation of [`Renderer`]
//!
//! Owns the surface, device and queue, plus GPU copies of every geometry,
//! material and texture it has drawn. Copies are created lazily the first
//! time a resource is drawn and released when the session disposes it.

use std::{cell::RefCell, collections::HashMap, rc::Rc, sync::Arc};

use wgpu::{Device, TextureFormat};

use crate::{
    error::{Result, ViewerError},
    gfx::{
        camera::PerspectiveCamera,
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO},
            GlobalUniform, Material, ResourceId, Side, TextureData, TextureResource,
        },
        scene::{NodeId, Scene},
    },
};

use super::{
    gpu_cache::{
        material_bind_group_layout, transform_bind_group_layout, GpuGeometry, GpuMaterial,
        GpuTransform, TransformUniform,
    },
    pipeline_manager::{pipeline_name, PipelineConfig, PipelineManager},
    renderer::{FrameOverlay, OverlayTarget, Renderer, RendererSettings},
};

const MSAA_SAMPLES: u32 = 4;

/// Everything tied to the graphics context. Dropped on context loss.
struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: Arc<Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    sample_count: u32,
    depth_texture: TextureResource,
    msaa_target: Option<TextureResource>,
    pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    transform_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    fallback_texture: TextureResource,

    geometries: HashMap<ResourceId, GpuGeometry>,
    textures: HashMap<ResourceId, TextureResource>,
    materials: HashMap<ResourceId, GpuMaterial>,
    transforms: HashMap<NodeId, GpuTransform>,
}

impl GpuContext {
    fn configure(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            self.sample_count,
            "depth_texture",
        );
        self.msaa_target = (self.sample_count > 1).then(|| {
            TextureResource::create_msaa_target(&self.device, &self.config, self.sample_count)
        });
    }

    /// Uploads whatever the scene references that is not on the GPU yet
    fn prepare(&mut self, scene: &Scene) {
        let mut live_nodes = Vec::with_capacity(scene.object_count());

        for object in scene.objects() {
            live_nodes.push(object.id());
            let model = object.matrix();
            match self.transforms.get_mut(&object.id()) {
                Some(transform) => transform
                    .ubo
                    .update_content(&self.queue, TransformUniform::new(model)),
                None => {
                    let transform = GpuTransform::new(&self.device, &self.transform_layout, model);
                    self.transforms.insert(object.id(), transform);
                }
            }

            for mesh in &object.meshes {
                let geometry = &mesh.geometry;
                if !self.geometries.contains_key(&geometry.id()) {
                    self.geometries
                        .insert(geometry.id(), GpuGeometry::upload(&self.device, geometry));
                }
                for material in &mesh.materials {
                    self.prepare_material(material);
                }
            }
        }

        // Transforms of objects that left the scene
        self.transforms.retain(|id, _| live_nodes.contains(id));
    }

    fn prepare_material(&mut self, material: &Material) {
        let texture_id = material.map.as_ref().map(|map| map.id());
        if let Some(map) = &material.map {
            if !self.textures.contains_key(&map.id()) {
                let label = format!("Texture {}", map.image.source);
                let resource =
                    TextureResource::create_from_image(&self.device, &self.queue, &map.image, &label);
                self.textures.insert(map.id(), resource);
            }
        }

        let uniform = material.uniform();
        let up_to_date = self
            .materials
            .get(&material.id())
            .is_some_and(|gpu| gpu.texture_id == texture_id);
        if up_to_date {
            if let Some(gpu) = self.materials.get_mut(&material.id()) {
                gpu.ubo.update_content(&self.queue, uniform);
            }
            return;
        }

        // First draw, or the map changed since the bind group was built
        let texture = texture_id
            .and_then(|id| self.textures.get(&id))
            .unwrap_or(&self.fallback_texture);
        let gpu = GpuMaterial::new(
            &self.device,
            &self.material_layout,
            &uniform,
            texture,
            texture_id,
        );
        if let Some(stale) = self.materials.insert(material.id(), gpu) {
            stale.ubo.destroy();
        }
    }

    fn release_all(&mut self) {
        for (_, geometry) in self.geometries.drain() {
            geometry.destroy();
        }
        for (_, texture) in self.textures.drain() {
            texture.destroy();
        }
        for (_, material) in self.materials.drain() {
            material.ubo.destroy();
        }
        for (_, transform) in self.transforms.drain() {
            transform.ubo.destroy();
        }
        self.global_ubo.destroy();
        self.fallback_texture.destroy();
        self.depth_texture.destroy();
        if let Some(target) = self.msaa_target.take() {
            target.destroy();
        }
    }
}

/// Forward renderer drawing a [`Scene`] into a window surface
pub struct WgpuRenderer {
    gpu: Option<GpuContext>,
    settings: RendererSettings,
    overlay: Option<Rc<RefCell<dyn FrameOverlay>>>,
}

impl WgpuRenderer {
    /// Creates a renderer for the given surface target
    ///
    /// # Errors
    /// Fails when no adapter or device is available, or the surface cannot
    /// be created.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        settings: RendererSettings,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .map_err(|e| ViewerError::Renderer(format!("failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::Renderer(format!("failed to request adapter: {e}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| ViewerError::Renderer(format!("failed to request device: {e}")))?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| ViewerError::Renderer("surface has no supported formats".into()))?;

        let alpha_mode = if settings.alpha {
            [
                wgpu::CompositeAlphaMode::PreMultiplied,
                wgpu::CompositeAlphaMode::PostMultiplied,
            ]
            .into_iter()
            .find(|mode| capabilities.alpha_modes.contains(mode))
            .unwrap_or(capabilities.alpha_modes[0])
        } else {
            capabilities.alpha_modes[0]
        };

        let sample_count = if settings.antialias
            && adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            1
        };

        let (width, height) = physical_size(&settings);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, sample_count, "depth_texture");
        let msaa_target = (sample_count > 1)
            .then(|| TextureResource::create_msaa_target(&device, &config, sample_count));

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let transform_layout = transform_bind_group_layout(&device);
        let material_layout = material_bind_group_layout(&device);
        let fallback_texture = TextureResource::create_from_image(
            &device,
            &queue,
            &TextureData::solid([255, 255, 255, 255], "fallback"),
            "Fallback Texture",
        );

        let device: Arc<Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("viewer", include_str!("viewer.wgsl"));

        for side in [Side::Front, Side::Back, Side::Double] {
            pipeline_manager.register_pipeline(
                pipeline_name(side),
                PipelineConfig::default()
                    .with_label(pipeline_name(side))
                    .with_shader("viewer")
                    .with_cull_mode(side.cull_face())
                    .with_depth_format(TextureResource::DEPTH_FORMAT)
                    .with_sample_count(sample_count)
                    .with_color_format(format)
                    .with_bind_group_layouts(vec![
                        global_bindings.bind_group_layout().clone(),
                        transform_layout.clone(),
                        material_layout.clone(),
                    ]),
            );
        }
        pipeline_manager
            .create_all_pipelines()
            .map_err(|errors| ViewerError::Renderer(errors.join("; ")))?;

        log::info!(
            "renderer ready: {:?} {}x{} format={:?} samples={}",
            adapter.get_info().backend,
            width,
            height,
            format,
            sample_count
        );

        Ok(Self {
            gpu: Some(GpuContext {
                surface,
                device,
                queue,
                config,
                format,
                sample_count,
                depth_texture,
                msaa_target,
                pipeline_manager,
                global_ubo,
                global_bindings,
                transform_layout,
                material_layout,
                fallback_texture,
                geometries: HashMap::new(),
                textures: HashMap::new(),
                materials: HashMap::new(),
                transforms: HashMap::new(),
            }),
            settings,
            overlay: None,
        })
    }

    /// Draws `overlay` on top of every frame
    pub fn set_overlay(&mut self, overlay: Rc<RefCell<dyn FrameOverlay>>) {
        self.overlay = Some(overlay);
    }

    /// Physical size of the drawing surface
    pub fn surface_size(&self) -> (u32, u32) {
        physical_size(&self.settings)
    }

    pub fn surface_format(&self) -> Option<TextureFormat> {
        self.gpu.as_ref().map(|gpu| gpu.format)
    }

    /// Device and queue, until the context is lost
    pub fn device_and_queue(&self) -> Option<(Arc<Device>, Arc<wgpu::Queue>)> {
        self.gpu
            .as_ref()
            .map(|gpu| (gpu.device.clone(), gpu.queue.clone()))
    }

    fn reconfigure(&mut self) {
        let (width, height) = physical_size(&self.settings);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.configure(width, height);
        }
    }
}

fn physical_size(settings: &RendererSettings) -> (u32, u32) {
    let scale = |logical: u32| ((logical as f64 * settings.pixel_ratio).round() as u32).max(1);
    (scale(settings.width), scale(settings.height))
}

impl Renderer for WgpuRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        if (width, height) == (self.settings.width, self.settings.height) {
            return;
        }
        self.settings.width = width;
        self.settings.height = height;
        self.reconfigure();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        if ratio <= 0.0 || ratio == self.settings.pixel_ratio {
            return;
        }
        self.settings.pixel_ratio = ratio;
        self.reconfigure();
    }

    fn size(&self) -> (u32, u32) {
        (self.settings.width, self.settings.height)
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        let Some(gpu) = self.gpu.as_mut() else {
            log::debug!("render skipped: graphics context released");
            return Ok(());
        };

        let surface_texture = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = (gpu.config.width, gpu.config.height);
                gpu.configure(width, height);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, dropping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.global_ubo.update_content(
            &gpu.queue,
            GlobalUniform::new(camera.uniform(), scene.lights()),
        );
        gpu.prepare(scene);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let clear = if self.settings.alpha {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        };
        let (view, resolve_target) = match &gpu.msaa_target {
            Some(msaa) => (&msaa.view, Some(&surface_view)),
            None => (&surface_view, None),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, gpu.global_bindings.bind_group(), &[]);

            for object in scene.objects().filter(|object| object.visible) {
                let Some(transform) = gpu.transforms.get(&object.id()) else {
                    continue;
                };
                render_pass.set_bind_group(1, &transform.bind_group, &[]);

                for mesh in &object.meshes {
                    let Some(geometry) = gpu.geometries.get(&mesh.geometry.id()) else {
                        continue;
                    };
                    render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    for group in mesh.geometry.draw_groups() {
                        let Some(material) = mesh.materials.get(group.material_index) else {
                            continue;
                        };
                        let (Some(gpu_material), Some(pipeline)) = (
                            gpu.materials.get(&material.id()),
                            gpu.pipeline_manager.pipeline(pipeline_name(material.side)),
                        ) else {
                            continue;
                        };
                        render_pass.set_pipeline(pipeline);
                        render_pass.set_bind_group(2, &gpu_material.bind_group, &[]);
                        render_pass.draw_indexed(group.start..group.start + group.count, 0, 0..1);
                    }
                }
            }
        }

        if let Some(overlay) = &self.overlay {
            overlay.borrow_mut().draw(OverlayTarget {
                device: &gpu.device,
                queue: &gpu.queue,
                format: gpu.format,
                encoder: &mut encoder,
                view: &surface_view,
                size: (gpu.config.width, gpu.config.height),
            });
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn dispose_geometry(&mut self, id: ResourceId) {
        if let Some(geometry) = self.gpu.as_mut().and_then(|gpu| gpu.geometries.remove(&id)) {
            geometry.destroy();
        }
    }

    fn dispose_material(&mut self, id: ResourceId) {
        if let Some(material) = self.gpu.as_mut().and_then(|gpu| gpu.materials.remove(&id)) {
            material.ubo.destroy();
        }
    }

    fn dispose_texture(&mut self, id: ResourceId) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if let Some(texture) = gpu.textures.remove(&id) {
            // Bind groups still pointing at it are rebuilt on next use
            gpu.materials
                .retain(|_, material| material.texture_id != Some(id));
            texture.destroy();
        }
    }

    fn force_context_loss(&mut self) {
        if let Some(mut gpu) = self.gpu.take() {
            gpu.release_all();
            gpu.device.destroy();
            log::debug!("graphics context released");
        }
    }

    fn dispose(&mut self) {
        if let Some(mut gpu) = self.gpu.take() {
            gpu.release_all();
        }
        self.overlay = None;
    }
}
