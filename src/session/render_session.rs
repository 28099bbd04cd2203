use std::{f32::consts::PI, rc::Rc};

use cgmath::{Vector3, Zero};
use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    executor::LocalPool,
    future::{try_join_all, LocalBoxFuture},
    task::LocalSpawnExt,
    FutureExt, StreamExt,
};

use super::{
    descriptor::ModelDescriptor,
    disposal::dispose_object3d,
    host::{FrameHandle, ListenerToken, ViewHost},
};
use crate::{
    error::{AssetError, Result, ViewerError},
    gfx::{
        camera::{ControlInput, OrbitControls, PerspectiveCamera},
        geometry::{generate_box, generate_sphere, Geometry},
        rendering::{Renderer, RendererSettings},
        resources::{Material, Side, Texture, TextureData},
        scene::{AmbientLight, DirectionalLight, Light, LightId, Mesh, NodeId, Object3D, Scene},
    },
    loaders::{
        AssetResolver, FileModelLoader, ImageTextureLoader, ModelAsset, ModelLoader, TextureLoader,
    },
};

const CAMERA_FOV: f32 = 75.0;
const SPHERE_RADIUS: f32 = 500.0;
const SPHERE_SEGMENTS: u32 = 100;
const CUBE_SIZE: f32 = 10.0;

/// Why an operation did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingContainer,
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSlot {
    Model,
    Background,
}

/// Identifies one load request. Only the latest request per slot is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub slot: LoadSlot,
    pub seq: u64,
}

/// The panorama currently behind the content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Sphere(NodeId),
    Cube(NodeId),
}

impl Background {
    pub fn node(self) -> NodeId {
        match self {
            Background::Sphere(node) | Background::Cube(node) => node,
        }
    }
}

type ModelLoadedCallback = Box<dyn FnMut(&Object3D)>;
type ErrorCallback = Box<dyn FnMut(&ViewerError)>;

/// Notifications raised while applying finished loads
#[derive(Default)]
pub struct SessionCallbacks {
    on_model_loaded: Option<ModelLoadedCallback>,
    on_error: Option<ErrorCallback>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_model_loaded(mut self, callback: impl FnMut(&Object3D) + 'static) -> Self {
        self.on_model_loaded = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&ViewerError) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    fn model_loaded(&mut self, object: &Object3D) {
        if let Some(callback) = self.on_model_loaded.as_mut() {
            callback(object);
        }
    }

    fn error(&mut self, error: &ViewerError) {
        if let Some(callback) = self.on_error.as_mut() {
            callback(error);
        }
    }
}

/// Model placement captured when the load was requested
#[derive(Debug, Clone, Copy)]
struct Placement {
    position: Vector3<f32>,
    scale: Vector3<f32>,
}

enum LoadOutcome {
    Model {
        seq: u64,
        url: String,
        placement: Placement,
        result: std::result::Result<ModelAsset, AssetError>,
    },
    SphereTexture {
        url: String,
        node: NodeId,
        result: std::result::Result<TextureData, AssetError>,
    },
    CubeFaces {
        seq: u64,
        result: Result<Vec<TextureData>>,
    },
}

/// Everything built by `init` and torn down by `destroy`
struct Engine {
    scene: Scene,
    camera: PerspectiveCamera,
    renderer: Box<dyn Renderer>,
    controls: OrbitControls,
    key_light: LightId,
}

/// Displays one model and one panorama inside a host container
///
/// ```no_run
/// # use orbview::session::{RenderSession, SessionCallbacks, ModelDescriptor, ViewHost};
/// # fn run(host: &mut dyn ViewHost) -> orbview::error::Result<()> {
/// let mut session = RenderSession::new(
///     "viewer",
///     SessionCallbacks::new().on_error(|e| eprintln!("{e}")),
/// );
/// let descriptor = ModelDescriptor::new("robot", "models/robot.glb");
/// session.init(host, &descriptor)?;
/// session.update_model(&descriptor);
/// session.update_panorama("panoramas/sky.jpg");
/// # Ok(())
/// # }
/// ```
pub struct RenderSession {
    container_id: String,
    callbacks: SessionCallbacks,
    model_loader: Rc<dyn ModelLoader>,
    texture_loader: Rc<dyn TextureLoader>,
    antialias: bool,

    engine: Option<Engine>,
    current_model: Option<NodeId>,
    current_background: Option<Background>,
    loading: bool,
    animation_frame: Option<FrameHandle>,
    resize_listener: Option<ListenerToken>,
    model_seq: u64,
    background_seq: u64,

    pool: LocalPool,
    outcome_sender: UnboundedSender<LoadOutcome>,
    outcome_receiver: UnboundedReceiver<LoadOutcome>,
}

impl RenderSession {
    /// Creates an uninitialized session drawing into `container_id`.
    ///
    /// Assets load from disk relative to the working directory until other
    /// loaders are installed.
    pub fn new(container_id: impl Into<String>, callbacks: SessionCallbacks) -> Self {
        let (outcome_sender, outcome_receiver) = mpsc::unbounded();
        Self {
            container_id: container_id.into(),
            callbacks,
            model_loader: Rc::new(FileModelLoader::new(AssetResolver::default())),
            texture_loader: Rc::new(ImageTextureLoader::new(AssetResolver::default())),
            antialias: true,
            engine: None,
            current_model: None,
            current_background: None,
            loading: false,
            animation_frame: None,
            resize_listener: None,
            model_seq: 0,
            background_seq: 0,
            pool: LocalPool::new(),
            outcome_sender,
            outcome_receiver,
        }
    }

    pub fn with_model_loader(mut self, loader: impl ModelLoader + 'static) -> Self {
        self.model_loader = Rc::new(loader);
        self
    }

    pub fn with_texture_loader(mut self, loader: impl TextureLoader + 'static) -> Self {
        self.texture_loader = Rc::new(loader);
        self
    }

    /// Multisampling for renderers created by later `init` calls
    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// True while the most recently requested model is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.engine.as_ref().map(|engine| &engine.scene)
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.engine.as_ref().map(|engine| &engine.camera)
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.engine.as_ref().map(|engine| &engine.controls)
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.engine.as_mut().map(|engine| &mut engine.controls)
    }

    pub fn current_model(&self) -> Option<NodeId> {
        self.current_model
    }

    pub fn current_background(&self) -> Option<Background> {
        self.current_background
    }

    /// The frame the session expects to be animated next
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.animation_frame
    }

    pub fn resize_listener(&self) -> Option<ListenerToken> {
        self.resize_listener
    }

    /// Builds the scene, camera, renderer, lights and controls and starts
    /// the animate loop. Does not load any content.
    ///
    /// # Errors
    /// Invalid clip planes in `descriptor`, or a renderer the host could not
    /// create. The session stays uninitialized in both cases.
    pub fn init(
        &mut self,
        host: &mut dyn ViewHost,
        descriptor: &ModelDescriptor,
    ) -> Result<InitOutcome> {
        if self.engine.is_some() {
            log::debug!("init skipped: session already initialized");
            return Ok(InitOutcome::Skipped(SkipReason::AlreadyInitialized));
        }
        if !host.has_container(&self.container_id) {
            log::debug!("init skipped: no container '{}'", self.container_id);
            return Ok(InitOutcome::Skipped(SkipReason::MissingContainer));
        }

        let (near, far) = descriptor.clip_planes()?;
        let viewport = host.viewport();

        let mut scene = Scene::new();

        let mut camera = PerspectiveCamera::new(CAMERA_FOV, viewport.aspect(), near, far);
        camera.position = descriptor.camera_position.into();
        camera.look_at(Vector3::zero());

        let settings = RendererSettings {
            antialias: self.antialias,
            alpha: true,
            width: viewport.width,
            height: viewport.height,
            pixel_ratio: viewport.pixel_ratio,
        };
        let renderer = host.create_renderer(&self.container_id, &settings)?;

        let white = [1.0, 1.0, 1.0];
        scene.add_light(Light::Ambient(AmbientLight::new(white, 1.0)));
        let key_light = scene.add_light(Light::Directional(DirectionalLight::new(
            white,
            0.8,
            Vector3::new(5.0, 10.0, 7.5),
        )));
        scene.add_light(Light::Directional(DirectionalLight::new(
            white,
            0.3,
            Vector3::new(-5.0, -10.0, -7.5),
        )));

        let mut controls = OrbitControls::new(&camera);
        controls.enable_zoom = true;
        controls.auto_rotate = true;
        controls.auto_rotate_speed = 1.0;
        controls.enable_damping = true;
        controls.damping_factor = 0.05;
        controls.process_input(ControlInput::ViewportHeight(viewport.height as f32), &camera);

        self.engine = Some(Engine {
            scene,
            camera,
            renderer,
            controls,
            key_light,
        });
        self.animation_frame = Some(host.request_animation_frame());
        self.resize_listener = Some(host.add_resize_listener());

        log::info!(
            "session '{}' initialized ({}x{} @{}x)",
            self.container_id,
            viewport.width,
            viewport.height,
            viewport.pixel_ratio
        );
        Ok(InitOutcome::Initialized)
    }

    /// Replaces the current model with the one `descriptor` points at.
    ///
    /// The previous model leaves the scene immediately. Returns `None` when
    /// the session is not initialized.
    pub fn update_model(&mut self, descriptor: &ModelDescriptor) -> Option<LoadTicket> {
        let Some(engine) = self.engine.as_mut() else {
            log::debug!("update_model skipped: session not initialized");
            return None;
        };

        self.loading = true;
        if let Some(previous) = self.current_model.take() {
            if let Some(object) = engine.scene.remove(previous) {
                dispose_object3d(&object, engine.renderer.as_mut());
            }
        }

        self.model_seq += 1;
        let seq = self.model_seq;
        let url = descriptor.model_url.clone();
        let placement = Placement {
            position: descriptor.model_position.into(),
            scale: descriptor.model_scale.into(),
        };
        log::info!("loading model {url}");

        let load = self.model_loader.load(&url);
        let sender = self.outcome_sender.clone();
        self.spawn(
            async move {
                let result = load.await;
                let _ = sender.unbounded_send(LoadOutcome::Model {
                    seq,
                    url,
                    placement,
                    result,
                });
            }
            .boxed_local(),
        );

        Some(LoadTicket {
            slot: LoadSlot::Model,
            seq,
        })
    }

    /// Replaces the background with an inward-facing sphere and starts
    /// loading its texture.
    ///
    /// The sphere enters the scene right away, untextured; the image is
    /// attached once it has loaded.
    pub fn update_panorama(&mut self, url: &str) -> Option<LoadTicket> {
        if self.engine.is_none() {
            log::debug!("update_panorama skipped: session not initialized");
            return None;
        }
        self.dispose_background();

        let engine = self.engine.as_mut()?;
        let geometry = Geometry::new(generate_sphere(
            SPHERE_RADIUS,
            SPHERE_SEGMENTS,
            SPHERE_SEGMENTS,
        ));
        let material = Material::basic("sphere panorama").with_side(Side::Back);
        let node = engine.scene.add(Object3D::new(
            "sphere panorama",
            vec![Mesh::new(geometry, material)],
        ));
        self.current_background = Some(Background::Sphere(node));

        self.background_seq += 1;
        let seq = self.background_seq;
        let url = url.to_string();
        log::info!("loading panorama {url}");

        let load = self.texture_loader.load(&url);
        let sender = self.outcome_sender.clone();
        self.spawn(
            async move {
                let result = load.await;
                let _ = sender.unbounded_send(LoadOutcome::SphereTexture {
                    url,
                    node,
                    result,
                });
            }
            .boxed_local(),
        );

        Some(LoadTicket {
            slot: LoadSlot::Background,
            seq,
        })
    }

    /// Loads six face images and, once all of them succeed, replaces the
    /// background with a cube showing them on its inside.
    ///
    /// Faces are ordered +X, -X, +Y, -Y, +Z, -Z. The controls are reset
    /// immediately. If any face fails the previous background stays.
    pub fn update_cube_panorama(&mut self, urls: &[String; 6]) -> Option<LoadTicket> {
        let Some(engine) = self.engine.as_mut() else {
            log::debug!("update_cube_panorama skipped: session not initialized");
            return None;
        };
        engine.controls.reset(&mut engine.camera);

        self.background_seq += 1;
        let seq = self.background_seq;
        log::info!("loading cube panorama {}", urls.join(", "));

        let faces: Vec<LocalBoxFuture<'static, Result<TextureData>>> = urls
            .iter()
            .map(|url| {
                let load = self.texture_loader.load(url);
                let url = url.clone();
                async move { load.await.map_err(|source| ViewerError::asset(url, source)) }
                    .boxed_local()
            })
            .collect();
        let sender = self.outcome_sender.clone();
        self.spawn(
            async move {
                let result = try_join_all(faces).await;
                let _ = sender.unbounded_send(LoadOutcome::CubeFaces { seq, result });
            }
            .boxed_local(),
        );

        Some(LoadTicket {
            slot: LoadSlot::Background,
            seq,
        })
    }

    /// Moves the camera to the descriptor's position, looking at the origin
    pub fn update_camera(&mut self, descriptor: &ModelDescriptor) {
        let Some(engine) = self.engine.as_mut() else {
            log::debug!("update_camera skipped: session not initialized");
            return;
        };
        engine.camera.position = descriptor.camera_position.into();
        engine.camera.look_at(Vector3::zero());
    }

    /// Puts the camera back where the controls were created
    pub fn reset_camera(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.controls.reset(&mut engine.camera);
        }
    }

    /// True if `ticket` belongs to the newest request of its slot
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        match ticket.slot {
            LoadSlot::Model => ticket.seq == self.model_seq,
            LoadSlot::Background => ticket.seq == self.background_seq,
        }
    }

    /// One step of the animate loop.
    ///
    /// Ignored unless `frame` is the frame this session scheduled.
    pub fn animate(&mut self, host: &mut dyn ViewHost, frame: FrameHandle) {
        if self.animation_frame != Some(frame) {
            return;
        }
        self.animation_frame = Some(host.request_animation_frame());

        self.process_pending_loads();

        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.controls.update(&mut engine.camera);
        if let Some(Light::Directional(light)) = engine.scene.light_mut(engine.key_light) {
            light.position = engine.camera.position;
        }
        if let Err(e) = engine.renderer.render(&engine.scene, &engine.camera) {
            log::error!("render failed: {e}");
        }
    }

    /// Matches camera and renderer to the host's current viewport
    pub fn handle_resize(&mut self, host: &dyn ViewHost) {
        if self.resize_listener.is_none() {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        let viewport = host.viewport();
        engine.camera.aspect = viewport.aspect();
        engine.camera.update_projection_matrix();
        engine.renderer.set_pixel_ratio(viewport.pixel_ratio);
        engine.renderer.set_size(viewport.width, viewport.height);
        engine.controls.process_input(
            ControlInput::ViewportHeight(viewport.height as f32),
            &engine.camera,
        );
        log::debug!("resized to {}x{}", viewport.width, viewport.height);
    }

    /// Forwards pointer, wheel and modifier input to the orbit controls
    pub fn handle_input(&mut self, input: ControlInput) {
        if let Some(engine) = self.engine.as_mut() {
            engine.controls.process_input(input, &engine.camera);
        }
    }

    /// Runs in-flight loads as far as they can go without blocking and
    /// applies every load that has finished.
    pub fn process_pending_loads(&mut self) {
        self.pool.run_until_stalled();
        while let Some(Some(outcome)) = self.outcome_receiver.next().now_or_never() {
            self.apply(outcome);
        }
    }

    /// Tears everything down. The session can be initialized again
    /// afterwards; calling this twice is harmless.
    pub fn destroy(&mut self, host: &mut dyn ViewHost) {
        if let Some(frame) = self.animation_frame.take() {
            host.cancel_animation_frame(frame);
        }
        if let Some(token) = self.resize_listener.take() {
            host.remove_resize_listener(token);
        }

        if let Some(mut engine) = self.engine.take() {
            for object in engine.scene.objects() {
                dispose_object3d(object, engine.renderer.as_mut());
            }
            engine.renderer.force_context_loss();
            engine.renderer.dispose();
            engine.scene.clear();
            engine.controls.dispose();
            host.clear_container(&self.container_id);
            log::info!("session '{}' destroyed", self.container_id);
        }

        // Dropping the pool cancels loads still in flight
        let (outcome_sender, outcome_receiver) = mpsc::unbounded();
        self.pool = LocalPool::new();
        self.outcome_sender = outcome_sender;
        self.outcome_receiver = outcome_receiver;
        self.current_model = None;
        self.current_background = None;
        self.loading = false;
        self.model_seq = 0;
        self.background_seq = 0;
    }

    fn spawn(&mut self, task: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.pool.spawner().spawn_local(task) {
            log::error!("failed to start load: {e}");
        }
    }

    fn dispose_background(&mut self) {
        let Some(background) = self.current_background.take() else {
            return;
        };
        if let Some(engine) = self.engine.as_mut() {
            if let Some(object) = engine.scene.remove(background.node()) {
                dispose_object3d(&object, engine.renderer.as_mut());
            }
        }
    }

    fn apply(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Model {
                seq,
                url,
                placement,
                result,
            } => {
                if seq != self.model_seq {
                    log::debug!("dropping superseded model load {url}");
                    return;
                }
                self.loading = false;
                let Some(engine) = self.engine.as_mut() else {
                    return;
                };
                match result {
                    Ok(asset) => {
                        let mut object = asset.into_object();
                        object.set_position(placement.position);
                        object.set_scale(placement.scale);
                        let node = engine.scene.add(object);
                        self.current_model = Some(node);
                        if let Some(object) = engine.scene.get(node) {
                            self.callbacks.model_loaded(object);
                        }
                    }
                    Err(source) => self.report(ViewerError::asset(url, source)),
                }
            }
            LoadOutcome::SphereTexture { url, node, result } => {
                // A pending cube does not supersede the sphere until it commits
                if self.current_background != Some(Background::Sphere(node)) {
                    log::debug!("dropping superseded panorama load {url}");
                    return;
                }
                match result {
                    Ok(image) => {
                        let object = self
                            .engine
                            .as_mut()
                            .and_then(|engine| engine.scene.get_mut(node));
                        if let Some(material) =
                            object.and_then(|object| object.materials_mut().next())
                        {
                            material.map = Some(Texture::new(image));
                        }
                    }
                    Err(source) => self.report(ViewerError::asset(url, source)),
                }
            }
            LoadOutcome::CubeFaces { seq, result } => {
                if seq != self.background_seq {
                    log::debug!("dropping superseded cube panorama load");
                    return;
                }
                match result {
                    Ok(images) => self.install_cube(images),
                    Err(error) => self.report(error),
                }
            }
        }
    }

    fn install_cube(&mut self, images: Vec<TextureData>) {
        self.dispose_background();
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        let materials = images
            .into_iter()
            .enumerate()
            .map(|(face, image)| {
                let mut texture = Texture::new(image);
                // The top and bottom images are stored upside down
                if face == 2 || face == 3 {
                    texture = texture.with_rotation([0.5, 0.5], PI);
                }
                Material::basic(&format!("cube face {face}")).with_map(texture)
            })
            .collect();

        let mut geometry = Geometry::new(generate_box(CUBE_SIZE, CUBE_SIZE, CUBE_SIZE));
        geometry.scale(1.0, 1.0, -1.0);
        let node = engine.scene.add(Object3D::new(
            "cube panorama",
            vec![Mesh::with_materials(geometry, materials)],
        ));
        self.current_background = Some(Background::Cube(node));

        engine.controls.min_distance = 0.1;
        engine.controls.max_distance = 3.0;
        engine.controls.enable_pan = false;
    }

    fn report(&mut self, error: ViewerError) {
        match std::error::Error::source(&error) {
            Some(source) => log::error!("{error}: {source}"),
            None => log::error!("{error}"),
        }
        self.callbacks.error(&error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        descriptor::Vec3,
        host::Viewport,
        test_support::{run_frame, tiny_model, StubLoader, TestHost},
    };
    use std::cell::RefCell;

    const CONTAINER: &str = "viewer";

    struct Harness {
        host: TestHost,
        session: RenderSession,
        models: StubLoader<ModelAsset>,
        textures: StubLoader<TextureData>,
        loaded: Rc<RefCell<Vec<String>>>,
        errors: Rc<RefCell<Vec<String>>>,
    }

    fn harness(models: StubLoader<ModelAsset>, textures: StubLoader<TextureData>) -> Harness {
        let loaded = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let callbacks = SessionCallbacks::new()
            .on_model_loaded({
                let loaded = loaded.clone();
                move |object| loaded.borrow_mut().push(object.name.clone())
            })
            .on_error({
                let errors = errors.clone();
                move |error| errors.borrow_mut().push(error.to_string())
            });

        let session = RenderSession::new(CONTAINER, callbacks)
            .with_model_loader(models.clone())
            .with_texture_loader(textures.clone());

        Harness {
            host: TestHost::with_container(CONTAINER),
            session,
            models,
            textures,
            loaded,
            errors,
        }
    }

    fn immediate() -> Harness {
        harness(
            StubLoader::immediate(tiny_model),
            StubLoader::immediate(|url| TextureData::solid([255; 4], url)),
        )
    }

    fn deferred() -> Harness {
        harness(
            StubLoader::deferred(tiny_model),
            StubLoader::deferred(|url| TextureData::solid([255; 4], url)),
        )
    }

    fn descriptor(url: &str) -> ModelDescriptor {
        ModelDescriptor::new(url, url)
    }

    fn faces(prefix: &str) -> [String; 6] {
        ["px", "nx", "py", "ny", "pz", "nz"].map(|face| format!("{prefix}/{face}.jpg"))
    }

    fn initialized(mut h: Harness) -> Harness {
        let outcome = h.session.init(&mut h.host, &descriptor("init.glb")).unwrap();
        assert_eq!(outcome, InitOutcome::Initialized);
        h
    }

    fn object_count(h: &Harness) -> usize {
        h.session.scene().map_or(0, Scene::object_count)
    }

    #[test]
    fn init_builds_everything_once() {
        let mut h = initialized(immediate());

        let outcome = h.session.init(&mut h.host, &descriptor("again.glb")).unwrap();
        assert_eq!(outcome, InitOutcome::Skipped(SkipReason::AlreadyInitialized));
        assert_eq!(h.host.renderers_created, 1);
        assert_eq!(h.host.active_listeners(), 1);
        assert_eq!(h.session.scene().unwrap().lights().len(), 3);
        assert!(h.session.pending_frame().is_some());
        // No content is loaded by init
        assert_eq!(object_count(&h), 0);
        assert!(h.models.requests().is_empty());
    }

    #[test]
    fn init_without_container_does_nothing() {
        let mut h = immediate();
        h.host = TestHost::new();

        let outcome = h.session.init(&mut h.host, &descriptor("a.glb")).unwrap();

        assert_eq!(outcome, InitOutcome::Skipped(SkipReason::MissingContainer));
        assert!(!h.session.is_initialized());
        assert_eq!(h.host.renderers_created, 0);
        assert!(h.session.pending_frame().is_none());
    }

    #[test]
    fn init_configures_camera_renderer_and_controls() {
        let mut h = immediate();
        h.host.viewport = Viewport {
            width: 1600,
            height: 900,
            pixel_ratio: 2.0,
        };
        let mut d = descriptor("a.glb");
        d.camera_position = Vec3::new(0.0, 1.0, 4.0);
        d.camera_far = Some(200.0);
        h.session.init(&mut h.host, &d).unwrap();

        let camera = h.session.camera().unwrap();
        assert_eq!(camera.fov, cgmath::Deg(75.0));
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!((camera.near, camera.far), (0.01, 200.0));
        assert_eq!(camera.position, Vector3::new(0.0, 1.0, 4.0));
        assert_eq!(camera.target(), Vector3::zero());

        let settings = h.host.last_settings.unwrap();
        assert!(settings.antialias && settings.alpha);
        assert_eq!((settings.width, settings.height), (1600, 900));
        assert_eq!(settings.pixel_ratio, 2.0);

        let controls = h.session.controls().unwrap();
        assert!(controls.enable_zoom && controls.auto_rotate && controls.enable_damping);
        assert_eq!(controls.auto_rotate_speed, 1.0);
        assert_eq!(controls.damping_factor, 0.05);
    }

    #[test]
    fn invalid_clip_planes_leave_session_uninitialized() {
        let mut h = immediate();
        let mut d = descriptor("a.glb");
        d.camera_near = Some(5.0);
        d.camera_far = Some(1.0);

        assert!(h.session.init(&mut h.host, &d).is_err());
        assert!(!h.session.is_initialized());
        assert_eq!(h.host.renderers_created, 0);
    }

    #[test]
    fn renderer_failure_is_returned() {
        let mut h = immediate();
        h.host.fail_renderer = true;

        let result = h.session.init(&mut h.host, &descriptor("a.glb"));
        assert!(matches!(result, Err(ViewerError::Renderer(_))));
        assert!(!h.session.is_initialized());
        assert!(h.session.pending_frame().is_none());
    }

    #[test]
    fn updates_before_init_are_skipped() {
        let mut h = immediate();

        assert!(h.session.update_model(&descriptor("a.glb")).is_none());
        assert!(h.session.update_panorama("bg.jpg").is_none());
        assert!(h.session.update_cube_panorama(&faces("cube")).is_none());
        h.session.update_camera(&descriptor("a.glb"));

        assert!(!h.session.is_loading());
        assert!(h.models.requests().is_empty());
    }

    #[test]
    fn model_swap_keeps_exactly_one_model() {
        let mut h = initialized(immediate());
        let mut d = descriptor("first.glb");
        d.model_position = Vec3::new(0.0, -1.0, 0.0);
        d.model_scale = Vec3::new(2.0, 2.0, 2.0);

        h.session.update_model(&d);
        assert!(h.session.is_loading());
        h.session.process_pending_loads();

        assert!(!h.session.is_loading());
        assert_eq!(object_count(&h), 1);
        let first = h.session.current_model().unwrap();
        let object = h.session.scene().unwrap().get(first).unwrap();
        assert_eq!(object.position, Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(object.scale, Vector3::new(2.0, 2.0, 2.0));

        h.session.update_model(&descriptor("second.glb"));
        h.session.process_pending_loads();

        assert_eq!(object_count(&h), 1);
        let scene = h.session.scene().unwrap();
        assert!(!scene.contains(first));
        assert!(scene.contains(h.session.current_model().unwrap()));
        assert_eq!(*h.loaded.borrow(), vec!["first", "second"]);
        // The first model's resources were released
        assert_eq!(h.host.renderer_log.borrow().disposed_geometries.len(), 1);
    }

    #[test]
    fn model_failure_reports_and_leaves_no_model() {
        let mut h = initialized(immediate());
        h.session.update_model(&descriptor("ok.glb"));
        h.session.process_pending_loads();

        h.session.update_model(&descriptor("missing.glb"));
        h.session.process_pending_loads();

        assert!(!h.session.is_loading());
        assert_eq!(object_count(&h), 0);
        assert!(h.session.current_model().is_none());
        let errors = h.errors.borrow();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("missing.glb"));
    }

    #[test]
    fn stale_model_never_replaces_newer_request() {
        let mut h = initialized(deferred());
        let first = h.session.update_model(&descriptor("slow.glb")).unwrap();
        let second = h.session.update_model(&descriptor("fast.glb")).unwrap();
        assert!(!h.session.is_current(first));
        assert!(h.session.is_current(second));

        h.models.complete("fast.glb");
        h.session.process_pending_loads();
        assert!(!h.session.is_loading());

        h.models.complete("slow.glb");
        h.session.process_pending_loads();

        assert_eq!(object_count(&h), 1);
        assert_eq!(*h.loaded.borrow(), vec!["fast"]);
    }

    #[test]
    fn loading_flag_follows_latest_request() {
        let mut h = initialized(deferred());
        h.session.update_model(&descriptor("a.glb"));
        h.session.update_model(&descriptor("b.glb"));

        h.models.complete("a.glb");
        h.session.process_pending_loads();
        assert!(h.session.is_loading());

        h.models.complete("b.glb");
        h.session.process_pending_loads();
        assert!(!h.session.is_loading());
    }

    #[test]
    fn sphere_panorama_replaces_and_releases_previous() {
        let mut h = initialized(immediate());

        h.session.update_panorama("one.jpg");
        assert_eq!(object_count(&h), 1);
        let first = h.session.current_background().unwrap();
        assert!(matches!(first, Background::Sphere(_)));
        h.session.process_pending_loads();

        let (geometry, material, texture) = {
            let scene = h.session.scene().unwrap();
            let mesh = &scene.get(first.node()).unwrap().meshes[0];
            let material = &mesh.materials[0];
            assert_eq!(material.side, Side::Back);
            let map = material.map.as_ref().expect("texture attached");
            (mesh.geometry.id(), material.id(), map.id())
        };

        h.session.update_panorama("two.jpg");

        assert_eq!(object_count(&h), 1);
        assert_ne!(h.session.current_background(), Some(first));
        let log = h.host.renderer_log.borrow();
        assert!(log.disposed_geometries.contains(&geometry));
        assert!(log.disposed_materials.contains(&material));
        assert!(log.disposed_textures.contains(&texture));
    }

    #[test]
    fn sphere_is_visible_before_its_texture_arrives() {
        let mut h = initialized(deferred());
        h.session.update_panorama("sky.jpg");
        h.session.process_pending_loads();

        let node = h.session.current_background().unwrap().node();
        let material = |h: &Harness| {
            h.session.scene().unwrap().get(node).unwrap().meshes[0].materials[0]
                .map
                .is_some()
        };
        assert!(!material(&h));

        h.textures.complete("sky.jpg");
        h.session.process_pending_loads();
        assert!(material(&h));
    }

    #[test]
    fn sphere_texture_failure_keeps_untextured_sphere() {
        let mut h = initialized(immediate());
        h.session.update_panorama("missing.jpg");
        h.session.process_pending_loads();

        assert_eq!(object_count(&h), 1);
        assert_eq!(h.errors.borrow().len(), 1);
    }

    #[test]
    fn cube_panorama_builds_six_faces_with_rotated_caps() {
        let mut h = initialized(immediate());
        h.session.update_cube_panorama(&faces("house"));
        h.session.process_pending_loads();

        let background = h.session.current_background().unwrap();
        assert!(matches!(background, Background::Cube(_)));
        let object = h.session.scene().unwrap().get(background.node()).unwrap();
        let mesh = &object.meshes[0];
        assert_eq!(mesh.materials.len(), 6);
        assert_eq!(mesh.geometry.draw_groups().len(), 6);
        for (face, material) in mesh.materials.iter().enumerate() {
            let map = material.map.as_ref().unwrap();
            if face == 2 || face == 3 {
                assert_eq!(map.rotation, PI);
                assert_eq!(map.center, [0.5, 0.5]);
            } else {
                assert_eq!(map.rotation, 0.0);
            }
        }

        let controls = h.session.controls().unwrap();
        assert_eq!(controls.min_distance, 0.1);
        assert_eq!(controls.max_distance, 3.0);
        assert!(!controls.enable_pan);
    }

    #[test]
    fn failing_cube_face_keeps_previous_background() {
        let mut h = initialized(immediate());
        h.session.update_panorama("sky.jpg");
        h.session.process_pending_loads();
        let sphere = h.session.current_background();

        let mut urls = faces("house");
        urls[4] = "house/missing.jpg".to_string();
        h.session.update_cube_panorama(&urls);
        h.session.process_pending_loads();

        assert_eq!(h.session.current_background(), sphere);
        assert_eq!(object_count(&h), 1);
        let errors = h.errors.borrow();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("house/missing.jpg"));
    }

    #[test]
    fn sphere_texture_lands_after_a_failed_cube_swap() {
        let mut h = initialized(deferred());
        h.session.update_panorama("sky.jpg");
        let sphere = h.session.current_background().unwrap();

        let mut urls = faces("house");
        urls[4] = "house/missing.jpg".to_string();
        h.session.update_cube_panorama(&urls);
        for url in &urls {
            h.textures.complete(url);
        }
        h.session.process_pending_loads();
        h.textures.complete("sky.jpg");
        h.session.process_pending_loads();

        assert_eq!(h.session.current_background(), Some(sphere));
        let object = h.session.scene().unwrap().get(sphere.node()).unwrap();
        assert!(object.meshes[0].materials[0].map.is_some());
        assert_eq!(h.errors.borrow().len(), 1);
    }

    #[test]
    fn sphere_texture_is_dropped_once_a_cube_replaces_it() {
        let mut h = initialized(deferred());
        h.session.update_panorama("sky.jpg");
        h.session.update_cube_panorama(&faces("house"));
        for url in faces("house") {
            h.textures.complete(&url);
        }
        h.session.process_pending_loads();
        h.textures.complete("sky.jpg");
        h.session.process_pending_loads();

        assert!(matches!(
            h.session.current_background(),
            Some(Background::Cube(_))
        ));
        assert_eq!(object_count(&h), 1);
        assert!(h.errors.borrow().is_empty());
    }

    #[test]
    fn failing_cube_face_without_previous_background_inserts_nothing() {
        let mut h = initialized(immediate());
        let mut urls = faces("house");
        urls[0] = "missing.jpg".to_string();

        h.session.update_cube_panorama(&urls);
        h.session.process_pending_loads();

        assert!(h.session.current_background().is_none());
        assert_eq!(object_count(&h), 0);
    }

    #[test]
    fn cube_swap_releases_previous_cube_materials() {
        let mut h = initialized(immediate());
        h.session.update_cube_panorama(&faces("a"));
        h.session.process_pending_loads();
        h.session.update_cube_panorama(&faces("b"));
        h.session.process_pending_loads();

        assert_eq!(object_count(&h), 1);
        let log = h.host.renderer_log.borrow();
        assert_eq!(log.disposed_materials.len(), 6);
        assert_eq!(log.disposed_textures.len(), 6);
    }

    #[test]
    fn stale_cube_result_is_dropped() {
        let mut h = initialized(deferred());
        h.session.update_cube_panorama(&faces("old"));
        h.session.update_panorama("new.jpg");

        for url in faces("old") {
            h.textures.complete(&url);
        }
        h.session.process_pending_loads();

        assert!(matches!(
            h.session.current_background(),
            Some(Background::Sphere(_))
        ));
        assert_eq!(object_count(&h), 1);
    }

    #[test]
    fn cube_request_resets_controls_immediately() {
        let mut h = initialized(deferred());
        for _ in 0..20 {
            run_frame(&mut h.session, &mut h.host);
        }
        let start = Vector3::new(0.0, 0.0, 5.0);
        assert_ne!(h.session.camera().unwrap().position, start);

        h.session.update_cube_panorama(&faces("house"));
        assert_eq!(h.session.camera().unwrap().position, start);
    }

    #[test]
    fn update_camera_sets_exact_position_toward_origin() {
        let mut h = initialized(immediate());
        for _ in 0..10 {
            run_frame(&mut h.session, &mut h.host);
        }

        let mut d = descriptor("a.glb");
        d.camera_position = Vec3::new(1.0, 2.0, 3.0);
        h.session.update_camera(&d);

        let camera = h.session.camera().unwrap();
        assert_eq!(camera.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.target(), Vector3::zero());
    }

    #[test]
    fn animate_reschedules_renders_and_moves_key_light() {
        let mut h = initialized(immediate());
        assert!(run_frame(&mut h.session, &mut h.host));
        assert!(run_frame(&mut h.session, &mut h.host));

        assert_eq!(h.host.renderer_log.borrow().renders, 2);
        let camera_position = h.session.camera().unwrap().position;
        let scene = h.session.scene().unwrap();
        let key = scene
            .lights()
            .iter()
            .filter_map(|light| match light {
                Light::Directional(light) => Some(light),
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!(key.position, camera_position);
    }

    #[test]
    fn animate_applies_finished_loads() {
        let mut h = initialized(immediate());
        h.session.update_model(&descriptor("robot.glb"));

        run_frame(&mut h.session, &mut h.host);
        assert_eq!(object_count(&h), 1);
    }

    #[test]
    fn stale_frame_handles_are_ignored() {
        let mut h = initialized(immediate());
        let stale = h.session.pending_frame().unwrap();
        run_frame(&mut h.session, &mut h.host);

        h.session.animate(&mut h.host, stale);
        assert_eq!(h.host.renderer_log.borrow().renders, 1);
    }

    #[test]
    fn resize_updates_camera_and_renderer() {
        let mut h = initialized(immediate());
        h.host.viewport = Viewport {
            width: 400,
            height: 200,
            pixel_ratio: 1.5,
        };
        h.session.handle_resize(&h.host);

        assert_eq!(h.session.camera().unwrap().aspect, 2.0);
        let log = h.host.renderer_log.borrow();
        assert_eq!(log.size, (400, 200));
        assert_eq!(log.pixel_ratio, 1.5);
    }

    #[test]
    fn destroy_stops_loop_and_clears_everything() {
        let mut h = initialized(immediate());
        h.session.update_model(&descriptor("robot.glb"));
        h.session.update_panorama("sky.jpg");
        h.session.process_pending_loads();
        run_frame(&mut h.session, &mut h.host);
        let pending = h.session.pending_frame().unwrap();

        h.session.destroy(&mut h.host);

        assert!(!h.session.is_initialized());
        assert!(h.session.current_model().is_none());
        assert!(h.session.current_background().is_none());
        assert!(!h.session.is_loading());
        assert!(h.host.cancelled.contains(&pending));
        assert_eq!(h.host.active_listeners(), 0);
        assert_eq!(h.host.container_children(CONTAINER), 0);
        {
            let log = h.host.renderer_log.borrow();
            assert!(log.context_lost && log.disposed);
            assert_eq!(log.disposed_geometries.len(), 2);
        }

        // Frames delivered after teardown do nothing
        h.session.animate(&mut h.host, pending);
        assert!(!run_frame(&mut h.session, &mut h.host));
        assert_eq!(h.host.renderer_log.borrow().renders, 1);

        // Inert after destroy
        h.session.handle_resize(&h.host);
        h.session.destroy(&mut h.host);
        assert_eq!(h.host.containers_cleared, 1);
    }

    #[test]
    fn in_flight_loads_are_dropped_by_destroy() {
        let mut h = initialized(deferred());
        h.session.update_model(&descriptor("robot.glb"));
        h.session.process_pending_loads();
        h.session.destroy(&mut h.host);

        h.models.complete("robot.glb");
        h.session.process_pending_loads();
        assert!(h.loaded.borrow().is_empty());
    }

    #[test]
    fn destroyed_session_can_be_initialized_again() {
        let mut h = initialized(immediate());
        h.session.update_model(&descriptor("robot.glb"));
        h.session.process_pending_loads();
        h.session.destroy(&mut h.host);

        let outcome = h.session.init(&mut h.host, &descriptor("again.glb")).unwrap();
        assert_eq!(outcome, InitOutcome::Initialized);
        assert_eq!(h.host.renderers_created, 2);
        assert_eq!(object_count(&h), 0);
        assert_eq!(h.host.active_listeners(), 1);

        h.session.update_model(&descriptor("second.glb"));
        h.session.process_pending_loads();
        assert_eq!(object_count(&h), 1);
        assert!(run_frame(&mut h.session, &mut h.host));
    }

    #[test]
    fn input_reaches_the_controls() {
        let mut h = initialized(immediate());
        h.session.controls_mut().unwrap().enable_damping = false;
        h.session.controls_mut().unwrap().auto_rotate = false;

        h.session.handle_input(ControlInput::Wheel { delta_y: -3.0 });
        run_frame(&mut h.session, &mut h.host);

        let distance = h.session.camera().unwrap().position.z;
        assert!(distance < 5.0);
    }
}
