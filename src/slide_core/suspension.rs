// ==============================================================================
// suspension.rs — RAYCAST SUSPENSION
// ------------------------------------------------------------------------------
// One probe per wheel mount p_i with suspension axis d_i (pointing away from
// the ground). The ray runs along -d_i for rest + travel + radius.
//
// hit at distance h:
//     compression     = clamp01((rest - (h - radius)) / travel)
//     spring_velocity = dot(v(p_i), d_i)
//     net             = compression * k - c * spring_velocity
//     force           = net * d_i, requested at p_i (ForceMode::Force)
//
// no hit (or a failed query): wheel is airborne, no force, and the wheel
// visual sits at the rest position p_i - d_i * (rest + travel).
//
// Notes:
// - This file does NOT touch the body. It pushes ForceRequests; the tick
//   applies them once every stage has succeeded.
// ==============================================================================

use crate::config::{ValidatedConfig, WheelSpec};
use crate::slide_core::types::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspensionParams {
    pub spring_stiffness: f32,
    pub damper_stiffness: f32,
    pub rest_length: f32,
    pub spring_travel: f32,
    pub wheel_radius: f32,
}

impl SuspensionParams {
    pub fn from_config(cfg: &ValidatedConfig) -> Self {
        Self {
            spring_stiffness: cfg.spring_stiffness,
            damper_stiffness: cfg.damper_stiffness,
            rest_length: cfg.rest_length,
            spring_travel: cfg.spring_travel,
            wheel_radius: cfg.wheel_radius,
        }
    }

    #[inline]
    pub fn max_length(&self) -> f32 {
        self.rest_length + self.spring_travel
    }

    #[inline]
    pub fn probe_length(&self) -> f32 {
        self.max_length() + self.wheel_radius
    }

    /// Normalized compression for a hit at `distance` along the probe.
    pub fn compression(&self, distance: f32) -> f32 {
        let spring_length = distance - self.wheel_radius;
        clamp01((self.rest_length - spring_length) / self.spring_travel)
    }

    /// Signed spring + damper force along the suspension axis.
    pub fn net_force(&self, compression: f32, spring_velocity: f32) -> f32 {
        let spring = compression * self.spring_stiffness;
        let damp = self.damper_stiffness * spring_velocity;
        spring - damp
    }
}

/// Per-wheel result, consumed within the same tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelContact {
    pub grounded: bool,
    pub compression: f32,     // 0 = fully extended, 1 = fully compressed
    pub contact_point: Option<Pt3>, // ground hit, None when airborne
    pub spring_velocity: f32,
    pub net_force: f32,       // along the suspension axis, 0 when airborne

    // probe geometry (debug + visuals)
    pub mount_point: Pt3,
    pub axis: Vec3,
    pub wheel_center: Pt3,
}

impl WheelContact {
    pub fn airborne(mount_point: Pt3, axis: Vec3, params: &SuspensionParams) -> Self {
        let rest = mount_point - axis * params.max_length();
        Self {
            grounded: false,
            compression: 0.0,
            contact_point: None,
            spring_velocity: 0.0,
            net_force: 0.0,
            mount_point,
            axis,
            wheel_center: rest,
        }
    }
}

/// Probe a single wheel. Returns the contact and the force to request, if any.
pub fn probe_wheel<G, B>(
    wheel: &WheelSpec,
    params: &SuspensionParams,
    frame: &BodyFrame,
    ground: &G,
    body: &B,
) -> (WheelContact, Option<ForceRequest>)
where
    G: GroundQuery + ?Sized,
    B: RigidBodyIntegrator + ?Sized,
{
    let mount_point = frame.to_world_point(&wheel.offset);
    let axis = frame.to_world_dir(&wheel.up);

    let hit = ground
        .cast_ray(mount_point, -axis, params.probe_length())
        .filter(|h| h.distance.is_finite() && is_finite_vec(&h.point.coords));

    let Some(hit) = hit else {
        return (WheelContact::airborne(mount_point, axis, params), None);
    };

    let compression = params.compression(hit.distance);
    let spring_velocity = body.point_velocity(mount_point).dot(&axis);
    let net_force = params.net_force(compression, spring_velocity);

    let contact = WheelContact {
        grounded: true,
        compression,
        contact_point: Some(hit.point),
        spring_velocity,
        net_force,
        mount_point,
        axis,
        wheel_center: hit.point + axis * params.wheel_radius,
    };

    let request = ForceRequest::AtPoint {
        force: axis * net_force,
        point: mount_point,
        mode: ForceMode::Force,
    };

    (contact, Some(request))
}

/// Probe every wheel, filling `contacts` (indexed by wheel) and appending
/// suspension forces. Returns the grounded wheel count.
pub fn run_suspension<G, B>(
    wheels: &[WheelSpec],
    params: &SuspensionParams,
    frame: &BodyFrame,
    ground: &G,
    body: &B,
    contacts: &mut Vec<WheelContact>,
    forces: &mut Vec<ForceRequest>,
) -> usize
where
    G: GroundQuery + ?Sized,
    B: RigidBodyIntegrator + ?Sized,
{
    contacts.clear();

    let mut grounded = 0;
    for wheel in wheels {
        let (contact, request) = probe_wheel(wheel, params, frame, ground, body);
        if contact.grounded {
            grounded += 1;
        }
        forces.extend(request);
        contacts.push(contact);
    }

    grounded
}
