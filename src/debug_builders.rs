// ==============================================================================
// debug_builders.rs — DEBUG OVERLAY PRIMITIVES (SERVER -> CLIENT)
// ------------------------------------------------------------------------------
// Defines serializable debug primitives:
// - DebugRay: suspension raycasts (green on contact, red when extended)
// - DebugWheel: per-wheel numeric state (grounded, compression, spring force)
// - DebugChassis: chassis pose + box extents, one per vehicle
//
// Helpers:
// - push_wheel_debug(): converts a WheelContact into a ray + wheel entry
// - push_chassis_debug(): records the chassis box
//
// Purely visualization scaffolding; nothing here feeds back into the sim.
// ==============================================================================

use rapier3d::prelude::*;
use serde::Serialize;

use crate::slide_core::suspension::WheelContact;
use crate::slide_core::types::Pt3;

const RAY_HIT: [f32; 3] = [0.1, 0.9, 0.2];
const RAY_MISS: [f32; 3] = [0.9, 0.15, 0.1];

#[derive(Clone, Default, Serialize)]
pub struct DebugOverlay {
    pub chassis: Vec<DebugChassis>,
    pub suspension_rays: Vec<DebugRay>,
    pub wheels: Vec<DebugWheel>,
}

#[derive(Clone, Serialize)]
pub struct DebugRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Clone, Serialize)]
pub struct DebugChassis {
    pub vehicle: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (x, y, z, w)
    pub half_extents: [f32; 3],
}

#[derive(Clone, Serialize)]
pub struct DebugWheel {
    pub id: String,      // "FL", "FR", "RL", "RR"
    pub vehicle: String, // owning player

    pub center: [f32; 3], // in world space
    pub grounded: bool,
    pub compression: f32,
    pub spring_force: f32,
}

impl DebugOverlay {
    pub fn clear(&mut self) {
        self.chassis.clear();
        self.suspension_rays.clear();
        self.wheels.clear();
    }
}

#[inline]
fn arr(p: &Pt3) -> [f32; 3] {
    [p.x, p.y, p.z]
}

pub fn push_wheel_debug(
    overlay: &mut DebugOverlay,
    vehicle: &str,
    wheel_id: &str,
    contact: &WheelContact,
    probe_length: f32,
) {
    let down = -contact.axis;

    overlay.suspension_rays.push(DebugRay {
        origin: arr(&contact.mount_point),
        direction: [down.x, down.y, down.z],
        length: probe_length,
        hit: contact.contact_point.as_ref().map(arr),
        color: if contact.grounded { RAY_HIT } else { RAY_MISS },
    });

    overlay.wheels.push(DebugWheel {
        id: wheel_id.to_string(),
        vehicle: vehicle.to_string(),
        center: arr(&contact.wheel_center),
        grounded: contact.grounded,
        compression: contact.compression,
        spring_force: contact.net_force,
    });
}

pub fn push_chassis_debug(
    overlay: &mut DebugOverlay,
    vehicle: &str,
    pose: &Isometry<Real>,
    half_extents: [f32; 3],
) {
    let t = pose.translation.vector;
    let q = pose.rotation;

    overlay.chassis.push(DebugChassis {
        vehicle: vehicle.to_string(),
        position: [t.x, t.y, t.z],
        rotation: [q.i, q.j, q.k, q.w],
        half_extents,
    });
}
