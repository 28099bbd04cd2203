//! In-memory host, renderer and loaders for exercising sessions without a
//! window or GPU.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    io,
    path::Path,
    rc::Rc,
};

use futures::{channel::oneshot, future::LocalBoxFuture, FutureExt};

use super::{
    host::{FrameHandle, ListenerToken, ViewHost, Viewport},
    render_session::RenderSession,
};
use crate::{
    error::{AssetError, Result, ViewerError},
    gfx::{
        camera::PerspectiveCamera,
        geometry::GeometryData,
        rendering::{Renderer, RendererSettings},
        resources::{ResourceId, TextureData},
        scene::Scene,
    },
    loaders::{MaterialData, MeshData, ModelAsset, ModelLoader, TextureLoader},
};

/// Everything a [`RecordingRenderer`] was asked to do
#[derive(Debug, Default)]
pub struct RendererLog {
    pub renders: usize,
    pub disposed_geometries: Vec<ResourceId>,
    pub disposed_materials: Vec<ResourceId>,
    pub disposed_textures: Vec<ResourceId>,
    pub context_lost: bool,
    pub disposed: bool,
    pub size: (u32, u32),
    pub pixel_ratio: f64,
}

pub struct RecordingRenderer {
    log: Rc<RefCell<RendererLog>>,
}

impl RecordingRenderer {
    pub fn new(size: (u32, u32)) -> (Self, Rc<RefCell<RendererLog>>) {
        let log = Rc::new(RefCell::new(RendererLog {
            size,
            pixel_ratio: 1.0,
            ..Default::default()
        }));
        (Self { log: log.clone() }, log)
    }

    fn with_log(log: Rc<RefCell<RendererLog>>) -> Self {
        Self { log }
    }
}

impl Renderer for RecordingRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().size = (width, height);
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.log.borrow_mut().pixel_ratio = ratio;
    }

    fn size(&self) -> (u32, u32) {
        self.log.borrow().size
    }

    fn render(&mut self, _scene: &Scene, _camera: &PerspectiveCamera) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if !log.disposed {
            log.renders += 1;
        }
        Ok(())
    }

    fn dispose_geometry(&mut self, id: ResourceId) {
        self.log.borrow_mut().disposed_geometries.push(id);
    }

    fn dispose_material(&mut self, id: ResourceId) {
        self.log.borrow_mut().disposed_materials.push(id);
    }

    fn dispose_texture(&mut self, id: ResourceId) {
        self.log.borrow_mut().disposed_textures.push(id);
    }

    fn force_context_loss(&mut self) {
        self.log.borrow_mut().context_lost = true;
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed = true;
    }
}

/// A host with a fixed set of containers and a manual frame clock
pub struct TestHost {
    pub viewport: Viewport,
    pub containers: HashSet<String>,
    pub fail_renderer: bool,
    pub renderers_created: usize,
    pub containers_cleared: usize,
    pub last_settings: Option<RendererSettings>,
    pub cancelled: Vec<FrameHandle>,
    pub renderer_log: Rc<RefCell<RendererLog>>,
    scheduled: Option<FrameHandle>,
    listeners: Vec<ListenerToken>,
    children: HashMap<String, usize>,
    next_handle: u64,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            viewport: Viewport {
                width: 800,
                height: 600,
                pixel_ratio: 1.0,
            },
            containers: HashSet::new(),
            fail_renderer: false,
            renderers_created: 0,
            containers_cleared: 0,
            last_settings: None,
            cancelled: Vec::new(),
            renderer_log: Rc::new(RefCell::new(RendererLog::default())),
            scheduled: None,
            listeners: Vec::new(),
            children: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn with_container(id: &str) -> Self {
        let mut host = Self::new();
        host.containers.insert(id.to_string());
        host
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn container_children(&self, id: &str) -> usize {
        self.children.get(id).copied().unwrap_or(0)
    }

    /// Hands out the scheduled frame, as the display refresh would
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        self.scheduled.take()
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl ViewHost for TestHost {
    fn has_container(&self, container_id: &str) -> bool {
        self.containers.contains(container_id)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_renderer(
        &mut self,
        container_id: &str,
        settings: &RendererSettings,
    ) -> Result<Box<dyn Renderer>> {
        if self.fail_renderer {
            return Err(ViewerError::Renderer("no adapter".to_string()));
        }
        self.renderers_created += 1;
        self.last_settings = Some(*settings);
        *self.children.entry(container_id.to_string()).or_default() += 1;

        {
            let mut log = self.renderer_log.borrow_mut();
            log.size = (settings.width, settings.height);
            log.pixel_ratio = settings.pixel_ratio;
            log.context_lost = false;
            log.disposed = false;
        }
        Ok(Box::new(RecordingRenderer::with_log(self.renderer_log.clone())))
    }

    fn clear_container(&mut self, container_id: &str) {
        self.children.insert(container_id.to_string(), 0);
        self.containers_cleared += 1;
    }

    fn request_animation_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.scheduled = Some(handle);
        handle
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        if self.scheduled == Some(handle) {
            self.scheduled = None;
        }
        self.cancelled.push(handle);
    }

    fn add_resize_listener(&mut self) -> ListenerToken {
        let token = ListenerToken(self.next_handle());
        self.listeners.push(token);
        token
    }

    fn remove_resize_listener(&mut self, token: ListenerToken) {
        self.listeners.retain(|&t| t != token);
    }
}

/// Delivers the scheduled frame to the session. Returns false when no
/// frame was scheduled.
pub fn run_frame(session: &mut RenderSession, host: &mut TestHost) -> bool {
    match host.take_frame() {
        Some(frame) => {
            session.animate(host, frame);
            true
        }
        None => false,
    }
}

/// A one-triangle model named after the URL's file stem
pub fn tiny_model(url: &str) -> ModelAsset {
    let name = Path::new(url)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model")
        .to_string();
    let mut geometry = GeometryData {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: Vec::new(),
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        indices: vec![0, 1, 2],
        groups: Vec::new(),
    };
    geometry.compute_vertex_normals();

    ModelAsset {
        name: name.clone(),
        meshes: vec![MeshData {
            geometry,
            material: MaterialData {
                name,
                ..Default::default()
            },
        }],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Immediate,
    Deferred,
}

type Pending<T> = (String, oneshot::Sender<std::result::Result<T, AssetError>>);

struct StubState<T> {
    mode: Mode,
    make: Box<dyn Fn(&str) -> T>,
    requests: Vec<String>,
    pending: Vec<Pending<T>>,
}

/// A loader producing values from a closure. URLs containing `missing`
/// fail. Deferred loaders hold each request until [`StubLoader::complete`].
pub struct StubLoader<T> {
    state: Rc<RefCell<StubState<T>>>,
}

impl<T> Clone for StubLoader<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: 'static> StubLoader<T> {
    pub fn immediate(make: impl Fn(&str) -> T + 'static) -> Self {
        Self::with_mode(Mode::Immediate, make)
    }

    pub fn deferred(make: impl Fn(&str) -> T + 'static) -> Self {
        Self::with_mode(Mode::Deferred, make)
    }

    fn with_mode(mode: Mode, make: impl Fn(&str) -> T + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(StubState {
                mode,
                make: Box::new(make),
                requests: Vec::new(),
                pending: Vec::new(),
            })),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }

    /// Finishes the oldest pending request for `url`
    pub fn complete(&self, url: &str) {
        let mut state = self.state.borrow_mut();
        let Some(index) = state.pending.iter().position(|(u, _)| u == url) else {
            panic!("no pending request for {url}");
        };
        let (url, sender) = state.pending.remove(index);
        let result = Self::produce(&state, &url);
        // The session may have dropped the request
        let _ = sender.send(result);
    }

    fn produce(state: &StubState<T>, url: &str) -> std::result::Result<T, AssetError> {
        if url.contains("missing") {
            Err(AssetError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{url} not found"),
            )))
        } else {
            Ok((state.make)(url))
        }
    }

    fn request(&self, url: &str) -> LocalBoxFuture<'static, std::result::Result<T, AssetError>> {
        let mut state = self.state.borrow_mut();
        state.requests.push(url.to_string());
        match state.mode {
            Mode::Immediate => futures::future::ready(Self::produce(&state, url)).boxed_local(),
            Mode::Deferred => {
                let (sender, receiver) = oneshot::channel();
                state.pending.push((url.to_string(), sender));
                async move { receiver.await.unwrap_or(Err(AssetError::Cancelled)) }.boxed_local()
            }
        }
    }
}

impl ModelLoader for StubLoader<ModelAsset> {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, std::result::Result<ModelAsset, AssetError>> {
        self.request(url)
    }
}

impl TextureLoader for StubLoader<TextureData> {
    fn load(
        &self,
        url: &str,
    ) -> LocalBoxFuture<'static, std::result::Result<TextureData, AssetError>> {
        self.request(url)
    }
}
