//! The environment a session is mounted into
//!
//! A [`ViewHost`] stands in for everything outside the session: looking up
//! the container to draw into, creating a renderer for it, scheduling
//! animation frames and delivering resize notifications.

use crate::{
    error::Result,
    gfx::rendering::{Renderer, RendererSettings},
};

/// Size of the drawing area in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// A scheduled animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// A registered resize listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

pub trait ViewHost {
    fn has_container(&self, container_id: &str) -> bool;

    fn viewport(&self) -> Viewport;

    /// Creates a renderer drawing into the container
    fn create_renderer(
        &mut self,
        container_id: &str,
        settings: &RendererSettings,
    ) -> Result<Box<dyn Renderer>>;

    /// Removes whatever the container displays
    fn clear_container(&mut self, container_id: &str);

    /// Schedules one call of the session's animate step for the next
    /// display refresh
    fn request_animation_frame(&mut self) -> FrameHandle;

    fn cancel_animation_frame(&mut self, handle: FrameHandle);

    /// Starts delivering resize notifications to the session
    fn add_resize_listener(&mut self) -> ListenerToken;

    fn remove_resize_listener(&mut self, token: ListenerToken);
}
