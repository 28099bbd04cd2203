pub mod camera_utils;
pub mod orbit_controls;
pub mod perspective_camera;

// Re-export main types
pub use camera_utils::CameraUniform;
pub use orbit_controls::{ControlInput, OrbitControls, PointerButton};
pub use perspective_camera::PerspectiveCamera;
