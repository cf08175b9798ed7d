//! Core shared types for `slide_core` (engine-agnostic).
// slide_core/types.rs
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub type Vec3 = Vector3<f32>;
pub type Pt3 = Point3<f32>;
pub type Rot = UnitQuaternion<f32>;

// Local basis convention: +Z forward, +X right, +Y up.
#[inline] pub fn local_forward() -> Vec3 { Vec3::new(0.0, 0.0, 1.0) }
#[inline] pub fn local_right() -> Vec3 { Vec3::new(1.0, 0.0, 0.0) }
#[inline] pub fn local_up() -> Vec3 { Vec3::new(0.0, 1.0, 0.0) }

#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[inline]
pub fn is_finite_vec(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

// ============================================
// ----- inputs -----
// ============================================

/// Latched control values, sampled once at the start of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInputs {
    pub accelerate: f32,   // {0, 1}
    pub steer: f32,        // -1..1
    pub hover_toggle: f32, // {0, 1}
}

impl ControlInputs {
    /// Normalize raw axis values coming off the wire.
    pub fn normalized(accelerate: f32, steer: f32, hover_toggle: f32) -> Self {
        let button = |v: f32| if v.is_finite() && v > 0.5 { 1.0 } else { 0.0 };
        let steer = if steer.is_finite() { steer.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            accelerate: button(accelerate),
            steer,
            hover_toggle: button(hover_toggle),
        }
    }

    pub fn accelerating(&self) -> bool {
        self.accelerate > 0.0
    }

    pub fn hover_asserted(&self) -> bool {
        self.hover_toggle > 0.0
    }
}

// ============================================
// ----- external collaborators -----
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub distance: f32,
    pub point: Pt3,
    pub normal: Vec3,
}

/// Drivable-surface ray query. `None` covers both "no surface in range" and
/// any failure of the underlying query.
pub trait GroundQuery {
    fn cast_ray(&self, origin: Pt3, direction: Vec3, max_distance: f32) -> Option<GroundHit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForceMode {
    /// Newtons / newton-metres.
    Force,
    /// Mass-independent (m/s², rad/s²).
    Acceleration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceRequest {
    AtPoint { force: Vec3, point: Pt3, mode: ForceMode },
    /// Torque expressed in the body's local frame.
    RelativeTorque { torque: Vec3, mode: ForceMode },
}

/// What the core reads from and asks of the rigid-body integrator.
pub trait RigidBodyIntegrator {
    fn world_velocity(&self) -> Vec3;
    fn orientation(&self) -> Rot;
    fn position(&self) -> Pt3;
    fn point_velocity(&self, point: Pt3) -> Vec3;

    fn apply_force_at_point(&mut self, force: Vec3, point: Pt3, mode: ForceMode);
    fn apply_relative_torque(&mut self, torque: Vec3, mode: ForceMode);
    fn set_velocity(&mut self, velocity: Vec3);
    fn set_linear_drag(&mut self, drag: f32);
}

/// Body-frame helpers shared by the stages.
#[derive(Debug, Clone, Copy)]
pub struct BodyFrame {
    pub position: Pt3,
    pub rotation: Rot,
}

impl BodyFrame {
    pub fn read<B: RigidBodyIntegrator + ?Sized>(body: &B) -> Self {
        Self { position: body.position(), rotation: body.orientation() }
    }

    #[inline] pub fn forward(&self) -> Vec3 { self.rotation * local_forward() }
    #[inline] pub fn right(&self) -> Vec3 { self.rotation * local_right() }
    #[inline] pub fn up(&self) -> Vec3 { self.rotation * local_up() }

    #[inline]
    pub fn to_world_point(&self, local: &Vec3) -> Pt3 {
        self.position + self.rotation * local
    }

    #[inline]
    pub fn to_world_dir(&self, local: &Vec3) -> Vec3 {
        self.rotation * local
    }

    #[inline]
    pub fn to_local_dir(&self, world: &Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(world)
    }

    pub fn is_finite(&self) -> bool {
        is_finite_vec(&self.position.coords)
            && self.rotation.coords.iter().all(|c| c.is_finite())
    }
}

// ============================================
// ----- modes + events -----
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DriveMode {
    #[default]
    Ground,
    Hover,
}

impl DriveMode {
    pub fn from_hovering(hovering: bool) -> Self {
        if hovering { DriveMode::Hover } else { DriveMode::Ground }
    }
}

/// One-shot notifications for visual/audio collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickEvent {
    PowerSlideStarted,
    PowerSlideEnded,
    HoverEngaged,
    HoverReleased,
    Realigned { speed: f32 },
    BackwardVelocityCancelled,
}
