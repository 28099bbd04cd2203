//! Orbit controls
//!
//! Rotates the camera around a target on drag, dollies on wheel and pans on
//! secondary drag (or modifier + primary drag). Optional inertial damping
//! and idle auto-rotation. The controls never own the camera: every call
//! that moves it takes the camera explicitly.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Rad, Vector3, Zero};

use super::perspective_camera::PerspectiveCamera;

const EPS: f32 = 1e-6;
/// Closest `phi` may get to a pole. Smaller angles round `cos(phi)` to 1.0 in f32.
const POLE_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Input forwarded from the window to the controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlInput {
    PointerDown(PointerButton),
    PointerUp(PointerButton),
    /// Pointer movement in logical pixels since the last event
    PointerMove { dx: f32, dy: f32 },
    /// Wheel movement in lines; negative scrolls up (zoom in)
    Wheel { delta_y: f32 },
    /// Current modifier key state
    Modifiers { shift: bool, ctrl: bool },
    /// Height of the drawing surface in pixels, used to scale drags
    ViewportHeight(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    None,
    Rotate,
    Dolly,
    Pan,
}

/// Polar coordinates around the target. `phi` is measured from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_vector(v: Vector3<f32>) -> Self {
        let radius = v.magnitude();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_vector(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keeps `phi` away from the poles, where the basis degenerates
    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(POLE_EPS, PI - POLE_EPS);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedState {
    target: Vector3<f32>,
    position: Vector3<f32>,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vector3<f32>,

    pub enable_zoom: bool,
    pub zoom_speed: f32,
    pub enable_rotate: bool,
    pub rotate_speed: f32,
    pub enable_pan: bool,
    pub pan_speed: f32,

    /// Rotate around the target while idle
    pub auto_rotate: bool,
    /// 1.0 is one full turn every 60 seconds at 60 frames per second
    pub auto_rotate_speed: f32,

    pub enable_damping: bool,
    pub damping_factor: f32,

    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    saved: SavedState,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
    state: DragState,
    shift_held: bool,
    ctrl_held: bool,
    viewport_height: f32,
    disposed: bool,
}

impl OrbitControls {
    /// Creates controls orbiting the origin and saves the camera's current
    /// placement as the reset state.
    pub fn new(camera: &PerspectiveCamera) -> Self {
        let target = Vector3::zero();
        Self {
            target,
            enable_zoom: true,
            zoom_speed: 1.0,
            enable_rotate: true,
            rotate_speed: 1.0,
            enable_pan: true,
            pan_speed: 1.0,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            saved: SavedState {
                target,
                position: camera.position,
            },
            spherical_delta: Spherical {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            },
            scale: 1.0,
            pan_offset: Vector3::zero(),
            state: DragState::None,
            shift_held: false,
            ctrl_held: false,
            viewport_height: 1.0,
            disposed: false,
        }
    }

    /// Restores the saved target and camera position and drops any
    /// pending motion.
    pub fn reset(&mut self, camera: &mut PerspectiveCamera) {
        self.target = self.saved.target;
        camera.position = self.saved.position;
        camera.look_at(self.target);

        self.spherical_delta.theta = 0.0;
        self.spherical_delta.phi = 0.0;
        self.pan_offset = Vector3::zero();
        self.scale = 1.0;
        self.state = DragState::None;
    }

    /// Stops reacting to input. The controls can still be updated.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.state = DragState::None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Distance between the camera and the target
    pub fn distance(&self, camera: &PerspectiveCamera) -> f32 {
        (camera.position - self.target).magnitude()
    }

    /// Azimuth of the camera around the target, in radians
    pub fn azimuthal_angle(&self, camera: &PerspectiveCamera) -> f32 {
        Spherical::from_vector(camera.position - self.target).theta
    }

    /// Polar angle of the camera measured from +Y, in radians
    pub fn polar_angle(&self, camera: &PerspectiveCamera) -> f32 {
        Spherical::from_vector(camera.position - self.target).phi
    }

    fn auto_rotation_angle(&self) -> f32 {
        2.0 * PI / 60.0 / 60.0 * self.auto_rotate_speed
    }

    fn zoom_scale(&self, notches: f32) -> f32 {
        0.95f32.powf(self.zoom_speed * notches.abs())
    }

    fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        let half_fov: Rad<f32> = (camera.fov / 2.0).into();
        let target_distance = offset.magnitude() * half_fov.0.tan();
        let height = self.viewport_height.max(1.0);

        let left = 2.0 * dx * target_distance / height;
        let up = 2.0 * dy * target_distance / height;
        self.pan_offset += camera.right() * -left + camera.camera_up() * up;
    }

    /// Feeds one input event into the controls
    pub fn process_input(&mut self, input: ControlInput, camera: &PerspectiveCamera) {
        if self.disposed {
            return;
        }

        match input {
            ControlInput::Modifiers { shift, ctrl } => {
                self.shift_held = shift;
                self.ctrl_held = ctrl;
            }
            ControlInput::ViewportHeight(height) => {
                self.viewport_height = height;
            }
            ControlInput::PointerDown(button) => {
                self.state = match button {
                    PointerButton::Primary if self.shift_held || self.ctrl_held => {
                        if self.enable_pan {
                            DragState::Pan
                        } else {
                            DragState::None
                        }
                    }
                    PointerButton::Primary if self.enable_rotate => DragState::Rotate,
                    PointerButton::Middle if self.enable_zoom => DragState::Dolly,
                    PointerButton::Secondary if self.enable_pan => DragState::Pan,
                    _ => DragState::None,
                };
            }
            ControlInput::PointerUp(_) => {
                self.state = DragState::None;
            }
            ControlInput::PointerMove { dx, dy } => {
                let height = self.viewport_height.max(1.0);
                match self.state {
                    DragState::Rotate => {
                        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
                        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
                    }
                    DragState::Dolly => {
                        if dy > 0.0 {
                            self.dolly_out(self.zoom_scale(1.0));
                        } else if dy < 0.0 {
                            self.dolly_in(self.zoom_scale(1.0));
                        }
                    }
                    DragState::Pan => {
                        self.pan(dx * self.pan_speed, dy * self.pan_speed, camera);
                    }
                    DragState::None => {}
                }
            }
            ControlInput::Wheel { delta_y } => {
                if !self.enable_zoom || self.state != DragState::None {
                    return;
                }
                if delta_y < 0.0 {
                    self.dolly_in(self.zoom_scale(delta_y));
                } else if delta_y > 0.0 {
                    self.dolly_out(self.zoom_scale(delta_y));
                }
            }
        }
    }

    /// Advances damping and auto-rotation and moves the camera.
    ///
    /// Call once per frame. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let last_position = camera.position;
        let last_target = self.target;

        let mut spherical = Spherical::from_vector(camera.position - self.target);

        if self.auto_rotate && self.state == DragState::None {
            self.rotate_left(self.auto_rotation_angle());
        }

        if self.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.position = self.target + spherical.to_vector();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta.theta = 0.0;
            self.spherical_delta.phi = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        (camera.position - last_position).magnitude2() > EPS
            || (self.target - last_target).magnitude2() > EPS
    }
}
