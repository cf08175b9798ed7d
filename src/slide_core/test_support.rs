//! Scripted collaborators for unit tests.

use super::types::*;

/// Infinite horizontal plane at `height`.
pub struct FlatGround {
    pub height: f32,
}

impl GroundQuery for FlatGround {
    fn cast_ray(&self, origin: Pt3, direction: Vec3, max_distance: f32) -> Option<GroundHit> {
        if direction.y >= -1e-6 {
            return None;
        }
        let distance = (self.height - origin.y) / direction.y;
        if !(0.0..=max_distance).contains(&distance) {
            return None;
        }
        Some(GroundHit {
            distance,
            point: origin + direction * distance,
            normal: Vec3::new(0.0, 1.0, 0.0),
        })
    }
}

pub struct NoGround;

impl GroundQuery for NoGround {
    fn cast_ray(&self, _: Pt3, _: Vec3, _: f32) -> Option<GroundHit> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct MockBody {
    pub position: Pt3,
    pub rotation: Rot,
    pub velocity: Vec3,
    pub angvel: Vec3,
    pub forces: Vec<ForceRequest>,
    pub linear_drag: f32,
    pub drag_changes: usize,
    pub velocity_sets: usize,
}

impl MockBody {
    pub fn at_height(y: f32) -> Self {
        Self {
            position: Pt3::new(0.0, y, 0.0),
            rotation: Rot::identity(),
            velocity: Vec3::zeros(),
            angvel: Vec3::zeros(),
            forces: Vec::new(),
            linear_drag: 0.0,
            drag_changes: 0,
            velocity_sets: 0,
        }
    }

    pub fn with_velocity(mut self, v: Vec3) -> Self {
        self.velocity = v;
        self
    }
}

impl RigidBodyIntegrator for MockBody {
    fn world_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn orientation(&self) -> Rot {
        self.rotation
    }

    fn position(&self) -> Pt3 {
        self.position
    }

    fn point_velocity(&self, point: Pt3) -> Vec3 {
        self.velocity + self.angvel.cross(&(point - self.position))
    }

    fn apply_force_at_point(&mut self, force: Vec3, point: Pt3, mode: ForceMode) {
        self.forces.push(ForceRequest::AtPoint { force, point, mode });
    }

    fn apply_relative_torque(&mut self, torque: Vec3, mode: ForceMode) {
        self.forces.push(ForceRequest::RelativeTorque { torque, mode });
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.velocity_sets += 1;
    }

    fn set_linear_drag(&mut self, drag: f32) {
        self.linear_drag = drag;
        self.drag_changes += 1;
    }
}
