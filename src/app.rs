//! The windowed application
//!
//! [`WindowHost`] is the [`ViewHost`] backed by a winit window: the window is
//! the only container, animation frames are redraw requests and the resize
//! listener is fed from window events. [`ViewerApp`] wires one
//! [`RenderSession`] to the router, the store and the ImGui panel.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::Arc,
};

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    catalog::{Catalog, PanoramaSource},
    config::ViewerConfig,
    error::{Result, ViewerError},
    gfx::{
        camera::{ControlInput, PointerButton},
        rendering::{Renderer, RendererSettings, WgpuRenderer},
    },
    loaders::{AssetResolver, FileModelLoader, ImageTextureLoader},
    router::{Router, View},
    session::{
        FrameHandle, InitOutcome, ListenerToken, ModelDescriptor, RenderSession, SessionCallbacks,
        ViewHost, Viewport,
    },
    store::{SharedStore, ViewerStore},
    ui::{UiAction, UiManager},
};

const CONTAINER_ID: &str = "viewer";

/// Pixels of touchpad scrolling counted as one wheel line
const PIXELS_PER_LINE: f64 = 40.0;

/// A [`ViewHost`] backed by a single winit window
pub struct WindowHost {
    window: Arc<Window>,
    ui: Option<Rc<RefCell<UiManager>>>,
    scheduled: Option<FrameHandle>,
    resize_listener: Option<ListenerToken>,
    next_handle: u64,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            ui: None,
            scheduled: None,
            resize_listener: None,
            next_handle: 0,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// The panel of the current renderer, if one exists
    pub fn ui(&self) -> Option<&Rc<RefCell<UiManager>>> {
        self.ui.as_ref()
    }

    pub fn has_resize_listener(&self) -> bool {
        self.resize_listener.is_some()
    }

    pub fn has_scheduled_frame(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Hands out the scheduled frame when the window is redrawn
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        self.scheduled.take()
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl ViewHost for WindowHost {
    fn has_container(&self, container_id: &str) -> bool {
        container_id == CONTAINER_ID
    }

    fn viewport(&self) -> Viewport {
        let scale = self.window.scale_factor();
        let logical: LogicalSize<f64> = self.window.inner_size().to_logical(scale);
        Viewport {
            width: logical.width.round() as u32,
            height: logical.height.round() as u32,
            pixel_ratio: scale,
        }
    }

    fn create_renderer(
        &mut self,
        container_id: &str,
        settings: &RendererSettings,
    ) -> Result<Box<dyn Renderer>> {
        if !self.has_container(container_id) {
            return Err(ViewerError::Renderer(format!(
                "no container '{container_id}'"
            )));
        }

        let mut renderer = pollster::block_on(WgpuRenderer::new(self.window.clone(), *settings))?;

        if let (Some((device, queue)), Some(format)) =
            (renderer.device_and_queue(), renderer.surface_format())
        {
            let ui = Rc::new(RefCell::new(UiManager::new(
                &device,
                &queue,
                format,
                self.window.clone(),
            )));
            renderer.set_overlay(ui.clone());
            self.ui = Some(ui);
        }
        Ok(Box::new(renderer))
    }

    fn clear_container(&mut self, _container_id: &str) {
        // The panel's GPU resources belong to the renderer that was just disposed
        self.ui = None;
        self.window.request_redraw();
    }

    fn request_animation_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.scheduled = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        if self.scheduled == Some(handle) {
            self.scheduled = None;
        }
    }

    fn add_resize_listener(&mut self) -> ListenerToken {
        let token = ListenerToken(self.next_handle());
        self.resize_listener = Some(token);
        token
    }

    fn remove_resize_listener(&mut self, token: ListenerToken) {
        if self.resize_listener == Some(token) {
            self.resize_listener = None;
        }
    }
}

pub struct ViewerApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig, catalog: Catalog) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            event_loop,
            app_state: AppState::new(config, catalog),
        })
    }

    /// Shared viewer state, readable while the application runs
    pub fn store(&self) -> SharedStore {
        self.app_state.store.clone()
    }

    /// Runs the event loop until the window is closed
    pub fn run(self) -> Result<()> {
        let Self {
            event_loop,
            mut app_state,
        } = self;
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop.run_app(&mut app_state)?;
        Ok(())
    }
}

struct AppState {
    config: ViewerConfig,
    catalog: Catalog,
    router: Router,
    store: SharedStore,
    session: RenderSession,
    host: Option<WindowHost>,
    mounted: Option<View>,
    selected_model: Option<usize>,
    selected_panorama: Option<usize>,
    last_error: Rc<RefCell<Option<String>>>,
    triangles: Rc<Cell<usize>>,
    cursor: Option<PhysicalPosition<f64>>,
}

impl AppState {
    fn new(config: ViewerConfig, catalog: Catalog) -> Self {
        let last_error = Rc::new(RefCell::new(None));
        let triangles = Rc::new(Cell::new(0));

        let callbacks = SessionCallbacks::new()
            .on_model_loaded({
                let last_error = last_error.clone();
                let triangles = triangles.clone();
                move |object| {
                    triangles.set(object.triangle_count());
                    *last_error.borrow_mut() = None;
                }
            })
            .on_error({
                let last_error = last_error.clone();
                move |error| *last_error.borrow_mut() = Some(error_chain(error))
            });

        let resolver = AssetResolver::new(config.asset_root());
        let session = RenderSession::new(CONTAINER_ID, callbacks)
            .with_model_loader(FileModelLoader::new(resolver.clone()))
            .with_texture_loader(ImageTextureLoader::new(resolver))
            .with_antialias(!config.no_antialias);

        let selected_model = (!catalog.models.is_empty()).then_some(0);
        let selected_panorama = catalog
            .first_cube()
            .or_else(|| (!catalog.panoramas.is_empty()).then_some(0));

        Self {
            router: Router::new(&config.base),
            config,
            catalog,
            store: ViewerStore::shared(),
            session,
            host: None,
            mounted: None,
            selected_model,
            selected_panorama,
            last_error,
            triangles,
            cursor: None,
        }
    }

    fn selected_descriptor(&self) -> Option<ModelDescriptor> {
        self.selected_model
            .and_then(|index| self.catalog.models.get(index))
            .cloned()
    }

    fn navigate(&mut self, path: &str) {
        match self.router.push(path) {
            Ok(route) => {
                let view = route.view;
                self.mount(view);
            }
            Err(e) => log::error!("{e}"),
        }
    }

    fn navigate_to(&mut self, view: View) {
        let name = match view {
            View::ModelViewer => "3dModel",
            View::PanoramaViewer => "house360",
        };
        match self.router.push_named(name) {
            Ok(_) => self.mount(view),
            Err(e) => log::error!("{e}"),
        }
    }

    fn go_back(&mut self) {
        if let Some(view) = self.router.back().map(|route| route.view) {
            if self.mounted != Some(view) {
                self.mount(view);
            }
        }
    }

    /// Tears the current page down and builds `view` in a fresh session
    fn mount(&mut self, view: View) {
        let descriptor = match view {
            View::ModelViewer => self.selected_descriptor(),
            View::PanoramaViewer => None,
        }
        .unwrap_or_else(|| ModelDescriptor::new("empty", ""));

        let Some(host) = self.host.as_mut() else {
            return;
        };
        self.session.destroy(host);
        self.mounted = None;
        self.triangles.set(0);
        *self.last_error.borrow_mut() = None;

        match self.session.init(host, &descriptor) {
            Ok(InitOutcome::Initialized) => {}
            Ok(InitOutcome::Skipped(reason)) => {
                log::warn!("viewer not started: {reason:?}");
                return;
            }
            Err(e) => {
                log::error!("failed to start viewer: {}", error_chain(&e));
                *self.last_error.borrow_mut() = Some(e.to_string());
                return;
            }
        }
        host.window().set_title(&format!("orbview - {}", view.title()));
        self.mounted = Some(view);

        match view {
            View::ModelViewer => self.show_model(),
            View::PanoramaViewer => self.show_panorama(),
        }
    }

    fn show_model(&mut self) {
        let Some(descriptor) = self.selected_descriptor() else {
            return;
        };
        if descriptor.model_url.is_empty() {
            return;
        }

        self.session.update_camera(&descriptor);
        self.session.update_model(&descriptor);
        if !descriptor.background_url.is_empty() {
            self.session.update_panorama(&descriptor.background_url);
        }

        let mut store = self.store.borrow_mut();
        store.set_loading(self.session.is_loading());
        store.set_current_model(descriptor);
    }

    fn show_panorama(&mut self) {
        let Some(entry) = self
            .selected_panorama
            .and_then(|index| self.catalog.panoramas.get(index))
        else {
            return;
        };
        match &entry.source {
            PanoramaSource::Sphere { image } => {
                self.session.update_panorama(image);
            }
            PanoramaSource::Cube { faces } => {
                self.session.update_cube_panorama(faces);
            }
        }
    }

    /// Moves the selection on the current page by `step`, wrapping around
    fn cycle_selection(&mut self, step: isize) {
        let (len, selected) = match self.mounted {
            Some(View::ModelViewer) => (self.catalog.models.len(), self.selected_model),
            Some(View::PanoramaViewer) => (self.catalog.panoramas.len(), self.selected_panorama),
            None => return,
        };
        if len == 0 {
            return;
        }
        let current = selected.unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len as isize) as usize;
        match self.mounted {
            Some(View::ModelViewer) => self.apply_action(UiAction::SelectModel(next)),
            Some(View::PanoramaViewer) => self.apply_action(UiAction::SelectPanorama(next)),
            None => {}
        }
    }

    fn apply_action(&mut self, action: UiAction) {
        log::debug!("ui action {action:?}");
        match action {
            UiAction::Navigate(view) => self.navigate_to(view),
            UiAction::Back => self.go_back(),
            UiAction::SelectModel(index) => {
                self.selected_model = Some(index);
                if self.mounted == Some(View::ModelViewer) {
                    self.show_model();
                }
            }
            UiAction::SelectPanorama(index) => {
                self.selected_panorama = Some(index);
                if self.mounted == Some(View::PanoramaViewer) {
                    self.show_panorama();
                }
            }
            UiAction::SetAutoRotate(enabled) => {
                if let Some(controls) = self.session.controls_mut() {
                    controls.auto_rotate = enabled;
                }
            }
            UiAction::ResetCamera => self.session.reset_camera(),
        }
    }

    fn sync_panel(&mut self) {
        let Some(ui) = self.host.as_ref().and_then(WindowHost::ui) else {
            return;
        };
        let mut ui = ui.borrow_mut();
        let panel = ui.panel_mut();

        panel.view = self.mounted.unwrap_or(View::ModelViewer);
        panel.models = self
            .catalog
            .models
            .iter()
            .map(|model| model.display_name().to_string())
            .collect();
        panel.panoramas = self
            .catalog
            .panoramas
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry.title.as_str() {
                "" => format!("Panorama {}", index + 1),
                title => title.to_string(),
            })
            .collect();
        panel.selected_model = self.selected_model;
        panel.selected_panorama = self.selected_panorama;
        panel.loading = self.store.borrow().loading;
        panel.auto_rotate = self
            .session
            .controls()
            .is_some_and(|controls| controls.auto_rotate);
        panel.triangles = self.triangles.get();
        panel.last_error = self.last_error.borrow().clone();
    }

    fn redraw(&mut self) {
        let Some(frame) = self.host.as_mut().and_then(WindowHost::take_frame) else {
            return;
        };

        let actions = self
            .host
            .as_ref()
            .and_then(WindowHost::ui)
            .map(|ui| ui.borrow_mut().take_actions())
            .unwrap_or_default();
        for action in actions {
            self.apply_action(action);
        }
        self.sync_panel();

        let Some(host) = self.host.as_mut() else {
            return;
        };
        self.session.animate(host, frame);
        self.store.borrow_mut().set_loading(self.session.is_loading());
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Digit1 => self.apply_action(UiAction::Navigate(View::ModelViewer)),
            KeyCode::Digit2 => self.apply_action(UiAction::Navigate(View::PanoramaViewer)),
            KeyCode::Backspace => self.apply_action(UiAction::Back),
            KeyCode::KeyR => self.apply_action(UiAction::ResetCamera),
            KeyCode::Space => {
                let enabled = self
                    .session
                    .controls()
                    .is_some_and(|controls| controls.auto_rotate);
                self.apply_action(UiAction::SetAutoRotate(!enabled));
            }
            KeyCode::ArrowRight => self.cycle_selection(1),
            KeyCode::ArrowLeft => self.cycle_selection(-1),
            _ => {}
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title("orbview")
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        match event_loop.create_window(attributes) {
            Ok(window) => {
                self.host = Some(WindowHost::new(Arc::new(window)));
                let route = self.router.href(&self.config.route);
                self.navigate(&route);
                if self.router.current().is_none() {
                    self.navigate("/");
                }
            }
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(host) = self.host.as_ref() else {
            return;
        };
        let scale = host.window().scale_factor();

        // UI sees input first
        let ui_captured = host
            .ui()
            .is_some_and(|ui| ui.borrow_mut().handle_input(window_id, &event));

        match event {
            WindowEvent::CloseRequested => {
                if let Some(host) = self.host.as_mut() {
                    self.session.destroy(host);
                }
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if host.has_resize_listener() {
                    self.session.handle_resize(host);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !ui_captured => self.handle_key(key_code, event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(position);
                if let (Some(previous), false) = (previous, ui_captured) {
                    self.session.handle_input(ControlInput::PointerMove {
                        dx: ((position.x - previous.x) / scale) as f32,
                        dy: ((position.y - previous.y) / scale) as f32,
                    });
                }
            }
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return,
                };
                match state {
                    // Releases always reach the controls so drags end cleanly
                    ElementState::Released => {
                        self.session.handle_input(ControlInput::PointerUp(button))
                    }
                    ElementState::Pressed if !ui_captured => {
                        self.session.handle_input(ControlInput::PointerDown(button))
                    }
                    ElementState::Pressed => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !ui_captured => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
                };
                // winit reports scrolling up as positive
                self.session
                    .handle_input(ControlInput::Wheel { delta_y: -lines });
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.session.handle_input(ControlInput::Modifiers {
                    shift: state.shift_key(),
                    ctrl: state.control_key() || state.super_key(),
                });
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(host) = self.host.as_ref().filter(|host| host.has_scheduled_frame()) {
            host.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(host) = self.host.as_mut() {
            self.session.destroy(host);
        }
    }
}

/// An error followed by each of its causes
fn error_chain(error: &ViewerError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;

    #[test]
    fn error_chain_includes_causes() {
        let error = ViewerError::asset("sky.jpg", AssetError::EmptyModel);
        assert_eq!(
            error_chain(&error),
            "failed to load asset `sky.jpg`: model contains no triangle meshes"
        );
    }

    #[test]
    fn first_cube_panorama_is_preselected() {
        let catalog = Catalog::parse(
            r#"{"models": [{"modelUrl": "a.glb"}],
                "panoramas": [{"image": "sky.jpg"},
                              {"faces": ["1", "2", "3", "4", "5", "6"]}]}"#,
        )
        .unwrap();

        let state = AppState::new(ViewerConfig::default(), catalog);
        assert_eq!(state.selected_model, Some(0));
        assert_eq!(state.selected_panorama, Some(1));
        assert_eq!(state.selected_descriptor().unwrap().model_url, "a.glb");
    }
}
