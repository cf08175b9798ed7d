// ==============================================================================
// drive.rs — MODE-DEPENDENT DRIVE LAW
// ==============================================================================
// Responsibilities:
// - Turn normalized control input + local kinematics into force requests
// - Ground mode: accelerate / decelerate, curve-shaped turn, sideways drag
// - Hover mode: direct turn, forward boost thrust, one-shot launch correction
// ------------------------------------------------------------------------------
// Everything is gated by `grounded`: while airborne no drive force is
// requested at all.
//
// Ground:
//     accel  = forward * acceleration * accelerate            (at accel point)
//     decel  = -forward * deceleration * clamp(vr, -1, 1)     (no accel input)
//     turn   = up * steer_strength * steer * curve(|vr|) * sign(vr)
//     drag   = right * (-local.x * drag_coefficient)          (at accel point)
//
// Hover:
//     turn   = up * hover_steer_strength * steer
//     thrust = forward * power_boost_acceleration   (only while boost > 0)
//
// The accel point sits off the centre of mass on purpose: drive forces pitch
// the chassis.
//
// Launch correction runs once per hover engagement, on the first tick that
// actually thrusts:
//     boost >= realign threshold -> velocity = forward * |velocity|
//     boost <  threshold, local.z < 0 -> drop the forward component only
// ==============================================================================

use crate::config::ValidatedConfig;
use crate::slide_core::curve::ResponseCurve;
use crate::slide_core::kinematics::LocalKinematics;
use crate::slide_core::types::*;

#[derive(Debug, Clone)]
pub struct DriveParams {
    pub acceleration: f32,
    pub deceleration: f32,
    pub steer_strength: f32,
    pub hover_steer_strength: f32,
    pub turning_curve: ResponseCurve,
    pub drag_coefficient: f32,
    pub power_boost_acceleration: f32,
    pub boost_realign_charge_threshold: f32,
    pub acceleration_point: Vec3, // local
}

impl DriveParams {
    pub fn from_config(cfg: &ValidatedConfig) -> Self {
        Self {
            acceleration: cfg.acceleration,
            deceleration: cfg.deceleration,
            steer_strength: cfg.steer_strength,
            hover_steer_strength: cfg.hover_steer_strength,
            turning_curve: cfg.turning_curve.clone(),
            drag_coefficient: cfg.drag_coefficient,
            power_boost_acceleration: cfg.power_boost_acceleration,
            boost_realign_charge_threshold: cfg.boost_realign_charge_threshold,
            acceleration_point: cfg.acceleration_point(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DriveInput<'a> {
    pub mode: DriveMode,
    pub grounded: bool,
    pub controls: ControlInputs,
    pub kinematics: &'a LocalKinematics,
    pub frame: &'a BodyFrame,
    pub world_velocity: Vec3,
    pub boost_charge: f32,
    pub launch_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaunchCorrection {
    /// Direction snapped to forward, magnitude kept.
    Realigned { velocity: Vec3 },
    /// Backward forward-component removed, lateral/vertical kept.
    BackwardCancelled { velocity: Vec3 },
    /// Launch consumed with nothing to correct.
    Clean,
}

impl LaunchCorrection {
    pub fn velocity(&self) -> Option<Vec3> {
        match *self {
            LaunchCorrection::Realigned { velocity } | LaunchCorrection::BackwardCancelled { velocity } => Some(velocity),
            LaunchCorrection::Clean => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveOutput {
    pub launch: Option<LaunchCorrection>,
    pub thrusting: bool,
}

/// Ground: accel with input, decel (opposing forward motion) without it.
pub fn longitudinal_force(params: &DriveParams, input: &DriveInput) -> Option<ForceRequest> {
    let forward = input.frame.forward();
    let point = input.frame.to_world_point(&params.acceleration_point);

    let force = if input.controls.accelerating() {
        forward * (params.acceleration * input.controls.accelerate)
    } else {
        let vr = input.kinematics.velocity_ratio.clamp(-1.0, 1.0);
        -forward * (params.deceleration * vr)
    };

    (force.norm_squared() > 0.0).then_some(ForceRequest::AtPoint {
        force,
        point,
        mode: ForceMode::Acceleration,
    })
}

/// Yaw torque about local up.
pub fn turn_torque(params: &DriveParams, input: &DriveInput) -> Option<ForceRequest> {
    let steer = input.controls.steer;
    if steer == 0.0 {
        return None;
    }

    let yaw = match input.mode {
        DriveMode::Ground => {
            let vr = input.kinematics.velocity_ratio;
            params.steer_strength * steer * params.turning_curve.evaluate(vr.abs()) * vr.signum()
        }
        DriveMode::Hover => params.hover_steer_strength * steer,
    };

    (yaw != 0.0).then_some(ForceRequest::RelativeTorque {
        torque: local_up() * yaw,
        mode: ForceMode::Acceleration,
    })
}

/// Lateral bleed-off, opposing local x velocity.
pub fn sideways_drag(params: &DriveParams, input: &DriveInput) -> Option<ForceRequest> {
    let magnitude = -input.kinematics.lateral_speed() * params.drag_coefficient;
    if magnitude == 0.0 {
        return None;
    }

    Some(ForceRequest::AtPoint {
        force: input.frame.right() * magnitude,
        point: input.frame.to_world_point(&params.acceleration_point),
        mode: ForceMode::Acceleration,
    })
}

/// One-shot velocity fix applied before the first thrust of a hover engagement.
/// Charge exactly at the threshold counts as "above".
pub fn launch_correction(params: &DriveParams, input: &DriveInput) -> LaunchCorrection {
    let forward = input.frame.forward();
    let v = input.world_velocity;

    if input.boost_charge >= params.boost_realign_charge_threshold {
        return LaunchCorrection::Realigned { velocity: forward * v.norm() };
    }

    let forward_speed = v.dot(&forward);
    if forward_speed < 0.0 {
        return LaunchCorrection::BackwardCancelled { velocity: v - forward * forward_speed };
    }

    LaunchCorrection::Clean
}

pub fn hover_thrust(params: &DriveParams, input: &DriveInput) -> ForceRequest {
    ForceRequest::AtPoint {
        force: input.frame.forward() * params.power_boost_acceleration,
        point: input.frame.to_world_point(&params.acceleration_point),
        mode: ForceMode::Acceleration,
    }
}

/// Run the drive law for this tick, appending requests to `forces`.
pub fn run_drive(params: &DriveParams, input: &DriveInput, forces: &mut Vec<ForceRequest>) -> DriveOutput {
    let mut out = DriveOutput::default();

    if !input.grounded {
        return out;
    }

    match input.mode {
        DriveMode::Ground => {
            forces.extend(longitudinal_force(params, input));
            forces.extend(turn_torque(params, input));
            forces.extend(sideways_drag(params, input));
        }
        DriveMode::Hover => {
            forces.extend(turn_torque(params, input));

            if input.boost_charge > 0.0 {
                if input.launch_pending {
                    out.launch = Some(launch_correction(params, input));
                }
                forces.push(hover_thrust(params, input));
                out.thrusting = true;
            }
        }
    }

    out
}
