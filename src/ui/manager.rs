//! ImGui overlay for the viewer window
//!
//! Handles ImGui integration with wgpu and winit: frame timing, input
//! capture and drawing the control panel on top of every rendered frame.

use std::{sync::Arc, time::Instant};

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use wgpu::{Device, Queue, TextureFormat};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

use super::panel::{viewer_panel, PanelState, UiAction};
use crate::gfx::rendering::{FrameOverlay, OverlayTarget};

/// ImGui UI manager
///
/// Owns the ImGui context and its wgpu renderer. The renderer is tied to the
/// device it was created with, so a new manager is needed whenever the
/// graphics context is recreated.
pub struct UiManager {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    window: Arc<Window>,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    panel: PanelState,
    actions: Vec<UiAction>,
}

impl UiManager {
    /// Sets up ImGui with locked DPI handling and the default font.
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: Arc<Window>,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), &window, HiDpiMode::Locked(1.0));

        let font_size = 18.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            window,
            last_frame: Instant::now(),
            last_cursor: None,
            panel: PanelState::default(),
            actions: Vec::new(),
        }
    }

    /// Feeds an input event to ImGui. Returns true if the UI captured it.
    pub fn handle_input(&mut self, window_id: WindowId, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::ModifiersChanged(_)
            | WindowEvent::Focused(_)
            | WindowEvent::Resized(_)
            | WindowEvent::ScaleFactorChanged { .. } => {
                let event: Event<()> = Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                };
                self.platform
                    .handle_event(self.context.io_mut(), &self.window, &event);
                self.wants_input()
            }
            _ => false,
        }
    }

    pub fn wants_input(&self) -> bool {
        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    pub fn panel_mut(&mut self) -> &mut PanelState {
        &mut self.panel
    }

    /// Actions recorded since the last call
    pub fn take_actions(&mut self) -> Vec<UiAction> {
        std::mem::take(&mut self.actions)
    }

    fn update_logic(&mut self) {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self
            .platform
            .prepare_frame(self.context.io_mut(), &self.window)
        {
            log::warn!("failed to prepare UI frame: {e}");
        }

        let ui = self.context.frame();
        viewer_panel(ui, &self.panel, &mut self.actions);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, &self.window);
        }
    }
}

impl FrameOverlay for UiManager {
    fn draw(&mut self, target: OverlayTarget<'_>) {
        self.update_logic();

        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self
            .renderer
            .render(draw_data, target.queue, target.device, &mut render_pass)
        {
            log::error!("failed to render UI: {e}");
        }
    }
}
