//! # Render Session
//!
//! A [`RenderSession`] mounts a scene, camera, renderer and orbit controls
//! into a container provided by a [`ViewHost`] and swaps a single model and a
//! single panorama in and out of it.
//!
//! ## Lifecycle
//!
//! 1. [`RenderSession::new`] creates an empty session.
//! 2. [`RenderSession::init`] builds everything and schedules the first frame.
//! 3. `update_model`, `update_panorama`, `update_cube_panorama` and
//!    `update_camera` change what is shown, any number of times.
//! 4. The host calls [`RenderSession::animate`] with each frame handle it was
//!    asked for, and [`RenderSession::handle_resize`] on viewport changes.
//! 5. [`RenderSession::destroy`] releases everything. A destroyed session can
//!    be initialized again.
//!
//! Loads run concurrently; when requests overlap, only the newest one per
//! slot (model, background) is applied.

pub mod descriptor;
pub mod disposal;
pub mod host;
pub mod render_session;

#[cfg(test)]
pub(crate) mod test_support;

pub use descriptor::{ModelDescriptor, Vec3, DEFAULT_CAMERA_FAR, DEFAULT_CAMERA_NEAR};
pub use disposal::dispose_object3d;
pub use host::{FrameHandle, ListenerToken, ViewHost, Viewport};
pub use render_session::{
    Background, InitOutcome, LoadSlot, LoadTicket, RenderSession, SessionCallbacks, SkipReason,
};
