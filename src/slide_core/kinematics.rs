// ==============================================================================
// kinematics.rs — LOCAL-FRAME VELOCITY
// ------------------------------------------------------------------------------
// Re-expresses the body's world velocity in the vehicle basis
// (x = right, y = up, z = forward) and derives:
//     velocity_ratio = local.z / max_speed   (unclamped)
//     skid_ratio     = local.x / max_speed   (unclamped)
//     acceleration   = local - previous local (one-tick difference, no smoothing)
//
// The acceleration term is a presentation signal only; nothing downstream
// feeds it back into forces.
// ==============================================================================

use crate::slide_core::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalKinematics {
    pub local_velocity: Vec3,
    pub previous_local_velocity: Vec3,
    pub local_acceleration: Vec3,
    pub velocity_ratio: f32,
    pub skid_ratio: f32,
}

impl LocalKinematics {
    /// Next tick's kinematics. `max_speed > 0` is guaranteed by config validation.
    pub fn advance(&self, world_velocity: &Vec3, frame: &BodyFrame, max_speed: f32) -> Self {
        let local_velocity = frame.to_local_dir(world_velocity);
        let previous_local_velocity = self.local_velocity;

        Self {
            local_velocity,
            previous_local_velocity,
            local_acceleration: local_velocity - previous_local_velocity,
            velocity_ratio: local_velocity.z / max_speed,
            skid_ratio: local_velocity.x / max_speed,
        }
    }

    #[inline]
    pub fn forward_speed(&self) -> f32 {
        self.local_velocity.z
    }

    #[inline]
    pub fn lateral_speed(&self) -> f32 {
        self.local_velocity.x
    }

    pub fn is_finite(&self) -> bool {
        is_finite_vec(&self.local_velocity)
            && is_finite_vec(&self.local_acceleration)
            && self.velocity_ratio.is_finite()
            && self.skid_ratio.is_finite()
    }
}
