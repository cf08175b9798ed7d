// ==============================================================================
// tick.rs — PER-VEHICLE FIXED STEP
// ------------------------------------------------------------------------------
// Stage order, once per fixed step, never reordered:
//   1) suspension   probe every wheel, spring/damper forces, contact count
//   2) ground check grounded := contact count > 1
//   3) kinematics   local velocity / ratios / one-tick acceleration
//   4) modes        hover + power-slide latches (edges -> events)
//   5) drive        mode-dependent forces, launch correction
//   6) energy       buildup -> transfer/drain -> clamp
//   7) commit       drag swap, velocity fix, forces -> integrator
//
// Stages 1-6 only compute. Nothing reaches the integrator until every stage
// has produced finite values; otherwise the tick is skipped and the previous
// energy, modes and kinematics are kept.
// ==============================================================================

use serde::Serialize;

use crate::config::ValidatedConfig;
use crate::slide_core::drive::{run_drive, DriveInput, DriveParams, LaunchCorrection};
use crate::slide_core::energy::{EnergyRates, EnergyState, PowerSlideEnergyFsm};
use crate::slide_core::kinematics::LocalKinematics;
use crate::slide_core::suspension::{run_suspension, SuspensionParams, WheelContact};
use crate::slide_core::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    pub kinematics: LocalKinematics,
    pub grounded_wheel_count: usize,
}

impl VehicleState {
    /// Derived every tick, never stored on its own.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        grounded_from_count(self.grounded_wheel_count)
    }
}

#[inline]
pub fn grounded_from_count(count: usize) -> bool {
    count > 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidTimestep,
    NonFiniteBodyState,
    NonFiniteKinematics,
    NonFiniteEnergy,
    NonFiniteForce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Applied,
    Skipped { reason: SkipReason },
}

/// Read-only per-tick view for visual/audio collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    pub tick: u64,
    pub wheel_ids: Vec<String>,
    pub grounded_per_wheel: Vec<bool>,
    pub compression_per_wheel: Vec<f32>,
    pub wheel_centers: Vec<[f32; 3]>,
    pub grounded_wheel_count: usize,
    pub is_grounded: bool,
    pub static_buildup: f32,
    pub boost_charge: f32,
    pub is_power_sliding: bool,
    pub is_hovering: bool,
    pub drive_mode: DriveMode,
    pub velocity_ratio: f32,
    pub skid_ratio: f32,
    pub local_acceleration: [f32; 3],
    pub steer_angle_deg: f32,
    pub events: Vec<TickEvent>,
}

#[inline]
fn arr(p: &Pt3) -> [f32; 3] {
    [p.x, p.y, p.z]
}

pub struct VehicleTick {
    cfg: ValidatedConfig,
    suspension: SuspensionParams,
    drive: DriveParams,
    rates: EnergyRates,

    state: VehicleState,
    fsm: PowerSlideEnergyFsm,
    ticks: u64,
    last_controls: ControlInputs,

    // last applied probe; `probe` is the in-flight one, swapped in on commit
    contacts: Vec<WheelContact>,
    probe: Vec<WheelContact>,

    // per-tick scratch, reused
    forces: Vec<ForceRequest>,
    events: Vec<TickEvent>,
}

impl VehicleTick {
    pub fn new(cfg: ValidatedConfig) -> Self {
        Self::with_energy(cfg, EnergyState::default())
    }

    pub fn with_energy(cfg: ValidatedConfig, energy: EnergyState) -> Self {
        let wheels = cfg.wheel_count();
        Self {
            suspension: SuspensionParams::from_config(&cfg),
            drive: DriveParams::from_config(&cfg),
            rates: EnergyRates::from_config(&cfg),
            cfg,
            state: VehicleState::default(),
            fsm: PowerSlideEnergyFsm::new(energy),
            ticks: 0,
            last_controls: ControlInputs::default(),
            contacts: Vec::with_capacity(wheels),
            probe: Vec::with_capacity(wheels),
            forces: Vec::with_capacity(wheels + 4),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.cfg
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn energy(&self) -> EnergyState {
        self.fsm.energy()
    }

    pub fn is_hovering(&self) -> bool {
        self.fsm.is_hovering()
    }

    pub fn is_power_sliding(&self) -> bool {
        self.fsm.is_power_sliding()
    }

    pub fn drive_mode(&self) -> DriveMode {
        DriveMode::from_hovering(self.fsm.is_hovering())
    }

    /// Linear drag the body should start with.
    pub fn initial_linear_drag(&self) -> f32 {
        self.linear_drag_for(self.fsm.is_hovering())
    }

    fn linear_drag_for(&self, hovering: bool) -> f32 {
        if hovering { self.cfg.hover_linear_drag } else { self.cfg.ground_linear_drag }
    }

    /// Contacts from the last applied tick (empty before the first one).
    pub fn contacts(&self) -> &[WheelContact] {
        &self.contacts
    }

    /// Events raised by the last applied tick.
    pub fn events(&self) -> &[TickEvent] {
        &self.events
    }

    /// Forces requested by the last applied tick.
    pub fn forces(&self) -> &[ForceRequest] {
        &self.forces
    }

    pub fn step<G, B>(&mut self, dt: f32, controls: ControlInputs, ground: &G, body: &mut B) -> TickOutcome
    where
        G: GroundQuery + ?Sized,
        B: RigidBodyIntegrator + ?Sized,
    {
        self.forces.clear();
        self.events.clear();

        match self.compute(dt, controls, ground, body) {
            Ok(pending) => {
                self.commit(pending, body);
                self.ticks += 1;
                self.last_controls = controls;
                TickOutcome::Applied
            }
            Err(reason) => {
                self.forces.clear();
                self.events.clear();
                TickOutcome::Skipped { reason }
            }
        }
    }

    fn compute<G, B>(&mut self, dt: f32, controls: ControlInputs, ground: &G, body: &B) -> Result<Pending, SkipReason>
    where
        G: GroundQuery + ?Sized,
        B: RigidBodyIntegrator + ?Sized,
    {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SkipReason::InvalidTimestep);
        }

        let frame = BodyFrame::read(body);
        let world_velocity = body.world_velocity();
        if !frame.is_finite() || !is_finite_vec(&world_velocity) {
            return Err(SkipReason::NonFiniteBodyState);
        }

        // 1) + 2)
        let grounded_wheel_count = run_suspension(
            self.cfg.wheels(),
            &self.suspension,
            &frame,
            ground,
            body,
            &mut self.probe,
            &mut self.forces,
        );
        debug_assert!(grounded_wheel_count <= self.cfg.wheel_count());
        let grounded = grounded_from_count(grounded_wheel_count);

        // 3)
        let kinematics = self.state.kinematics.advance(&world_velocity, &frame, self.cfg.max_speed);
        if !kinematics.is_finite() {
            return Err(SkipReason::NonFiniteKinematics);
        }

        // 4) work on a copy so a skipped tick leaves modes untouched
        let mut fsm = self.fsm.clone();
        let hover_edge = fsm.resolve_modes(
            grounded,
            kinematics.lateral_speed(),
            controls.hover_asserted(),
            self.cfg.min_skid_side_velocity,
            &mut self.events,
        );

        // 5)
        let input = DriveInput {
            mode: DriveMode::from_hovering(fsm.is_hovering()),
            grounded,
            controls,
            kinematics: &kinematics,
            frame: &frame,
            world_velocity,
            boost_charge: fsm.energy().boost_charge,
            launch_pending: fsm.launch_pending(),
        };
        let drive = run_drive(&self.drive, &input, &mut self.forces);

        if let Some(launch) = drive.launch {
            fsm.clear_launch();
            match launch {
                LaunchCorrection::Realigned { velocity } => {
                    self.events.push(TickEvent::Realigned { speed: velocity.norm() });
                }
                LaunchCorrection::BackwardCancelled { .. } => {
                    self.events.push(TickEvent::BackwardVelocityCancelled);
                }
                LaunchCorrection::Clean => {}
            }
        }

        // 6)
        fsm.accumulate(kinematics.skid_ratio, dt, &self.rates);
        if !fsm.energy().is_finite() {
            return Err(SkipReason::NonFiniteEnergy);
        }

        if !self.forces.iter().all(force_is_finite) {
            return Err(SkipReason::NonFiniteForce);
        }
        let velocity_fix = drive.launch.and_then(|l| l.velocity());
        if velocity_fix.is_some_and(|v| !is_finite_vec(&v)) {
            return Err(SkipReason::NonFiniteForce);
        }

        Ok(Pending {
            state: VehicleState { kinematics, grounded_wheel_count },
            fsm,
            hover_edge,
            velocity_fix,
        })
    }

    // 7)
    fn commit<B: RigidBodyIntegrator + ?Sized>(&mut self, pending: Pending, body: &mut B) {
        if let Some(hovering) = pending.hover_edge {
            body.set_linear_drag(self.linear_drag_for(hovering));
        }

        if let Some(v) = pending.velocity_fix {
            body.set_velocity(v);
        }

        for req in &self.forces {
            match *req {
                ForceRequest::AtPoint { force, point, mode } => body.apply_force_at_point(force, point, mode),
                ForceRequest::RelativeTorque { torque, mode } => body.apply_relative_torque(torque, mode),
            }
        }

        std::mem::swap(&mut self.contacts, &mut self.probe);
        self.state = pending.state;
        self.fsm = pending.fsm;
        self.fsm.energy().debug_check();
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        let energy = self.fsm.energy();
        let kin = &self.state.kinematics;
        let a = kin.local_acceleration;

        VehicleSnapshot {
            tick: self.ticks,
            wheel_ids: self.cfg.wheels().iter().map(|w| w.id.clone()).collect(),
            grounded_per_wheel: self.contacts.iter().map(|c| c.grounded).collect(),
            compression_per_wheel: self.contacts.iter().map(|c| c.compression).collect(),
            wheel_centers: self.contacts.iter().map(|c| arr(&c.wheel_center)).collect(),
            grounded_wheel_count: self.state.grounded_wheel_count,
            is_grounded: self.state.is_grounded(),
            static_buildup: energy.static_buildup,
            boost_charge: energy.boost_charge,
            is_power_sliding: self.fsm.is_power_sliding(),
            is_hovering: self.fsm.is_hovering(),
            drive_mode: self.drive_mode(),
            velocity_ratio: kin.velocity_ratio,
            skid_ratio: kin.skid_ratio,
            local_acceleration: [a.x, a.y, a.z],
            steer_angle_deg: self.last_controls.steer * self.cfg.max_steering_angle_deg,
            events: self.events.clone(),
        }
    }
}

struct Pending {
    state: VehicleState,
    fsm: PowerSlideEnergyFsm,
    hover_edge: Option<bool>,
    velocity_fix: Option<Vec3>,
}

fn force_is_finite(req: &ForceRequest) -> bool {
    match req {
        ForceRequest::AtPoint { force, point, .. } => is_finite_vec(force) && is_finite_vec(&point.coords),
        ForceRequest::RelativeTorque { torque, .. } => is_finite_vec(torque),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{skiff, VehicleConfig};
    use crate::slide_core::test_support::{FlatGround, MockBody, NoGround};

    fn tick() -> VehicleTick {
        VehicleTick::new(skiff().validate().expect("valid"))
    }

    #[test]
    fn grounded_is_pure_function_of_count() {
        for n in 0..=4 {
            assert_eq!(grounded_from_count(n), n > 1);
        }
    }

    #[test]
    fn airborne_requests_no_forces_at_all() {
        let mut t = tick();
        let mut body = MockBody::at_height(20.0).with_velocity(Vec3::new(30.0, 0.0, 10.0));

        let out = t.step(1.0 / 60.0, ControlInputs::normalized(1.0, 1.0, 0.0), &NoGround, &mut body);

        assert_eq!(out, TickOutcome::Applied);
        assert!(body.forces.is_empty());
        assert!(!t.state().is_grounded());
        assert!(!t.is_power_sliding());
    }

    #[test]
    fn slide_then_hover_never_overlaps() {
        let mut t = tick();
        let ground = FlatGround { height: 0.0 };
        let mut body = MockBody::at_height(0.8).with_velocity(Vec3::new(15.0, 0.0, 20.0));

        t.step(1.0 / 60.0, ControlInputs::default(), &ground, &mut body);
        assert!(t.is_power_sliding());
        assert!(t.events().contains(&TickEvent::PowerSlideStarted));

        t.step(1.0 / 60.0, ControlInputs::normalized(0.0, 0.0, 1.0), &ground, &mut body);
        assert!(t.is_hovering());
        assert!(!t.is_power_sliding());
        assert_eq!(body.linear_drag, t.config().hover_linear_drag);
        assert_eq!(body.drag_changes, 1);

        // holding hover is not another edge
        t.step(1.0 / 60.0, ControlInputs::normalized(0.0, 0.0, 1.0), &ground, &mut body);
        assert_eq!(body.drag_changes, 1);
        assert_eq!(body.velocity_sets, 0);
    }

    #[test]
    fn skipped_tick_keeps_previous_state() {
        let mut t = tick();
        let ground = FlatGround { height: 0.0 };
        let mut body = MockBody::at_height(0.8).with_velocity(Vec3::new(15.0, 0.0, 20.0));
        t.step(1.0 / 60.0, ControlInputs::default(), &ground, &mut body);

        let energy = t.energy();
        let state = *t.state();
        let before = t.snapshot();
        body.forces.clear();
        body.velocity = Vec3::new(f32::NAN, 0.0, 0.0);

        let out = t.step(1.0 / 60.0, ControlInputs::normalized(0.0, 0.0, 1.0), &ground, &mut body);

        assert_eq!(out, TickOutcome::Skipped { reason: SkipReason::NonFiniteBodyState });
        assert!(body.forces.is_empty());
        assert_eq!(t.energy(), energy);
        assert_eq!(*t.state(), state);
        assert!(!t.is_hovering());
        assert_eq!(body.drag_changes, 0);

        let after = t.snapshot();
        assert_eq!(after.grounded_per_wheel, before.grounded_per_wheel);
        assert_eq!(after.compression_per_wheel, before.compression_per_wheel);
        assert_eq!(after.tick, before.tick);
    }

    #[test]
    fn late_skip_keeps_previous_contacts() {
        let mut t = tick();
        let mut body = MockBody::at_height(0.8);
        t.step(1.0 / 60.0, ControlInputs::default(), &NoGround, &mut body);
        assert_eq!(t.snapshot().grounded_per_wheel, vec![false; 4]);

        // finite body state that overflows once rotated into the local frame,
        // so the suspension stage has already probed the plane
        body.rotation = Rot::from_axis_angle(&Vec3::y_axis(), 0.7);
        body.velocity = Vec3::new(3.0e38, 0.0, 3.0e38);

        let out = t.step(1.0 / 60.0, ControlInputs::default(), &FlatGround { height: 0.0 }, &mut body);

        assert_eq!(out, TickOutcome::Skipped { reason: SkipReason::NonFiniteKinematics });
        let snap = t.snapshot();
        assert_eq!(snap.grounded_per_wheel, vec![false; 4]);
        assert_eq!(snap.compression_per_wheel, vec![0.0; 4]);
        assert_eq!(snap.grounded_wheel_count, 0);
        assert!(t.contacts().iter().all(|c| c.contact_point.is_none()));
        assert!(body.forces.is_empty());
    }

    #[test]
    fn charged_hover_entry_sets_velocity_once() {
        let cfg = skiff().validate().expect("valid");
        let mut t = VehicleTick::with_energy(cfg, EnergyState::new(0.0, 0.5));
        let ground = FlatGround { height: 0.0 };
        let mut body = MockBody::at_height(0.8).with_velocity(Vec3::new(4.0, 0.0, 3.0));

        t.step(1.0 / 60.0, ControlInputs::normalized(0.0, 0.0, 1.0), &ground, &mut body);
        assert_eq!(body.velocity_sets, 1);
        assert!((body.velocity - Vec3::new(0.0, 0.0, 5.0)).norm() < 1e-5);

        t.step(1.0 / 60.0, ControlInputs::normalized(0.0, 0.0, 1.0), &ground, &mut body);
        assert_eq!(body.velocity_sets, 1);
    }

    #[test]
    fn rolling_body_loads_wheels_unevenly() {
        let mut t = tick();
        let mut body = MockBody::at_height(0.8);
        // roll about forward: left side (x < 0) moves down, right side up
        body.angvel = Vec3::new(0.0, 0.0, 1.0);

        t.step(1.0 / 60.0, ControlInputs::default(), &FlatGround { height: 0.0 }, &mut body);

        let c = t.contacts();
        assert!(c[0].spring_velocity < 0.0 && c[1].spring_velocity > 0.0);
        assert!(c[0].net_force > c[1].net_force);
    }

    #[test]
    fn rejects_bad_timestep() {
        let mut t = tick();
        let mut body = MockBody::at_height(0.8);
        let out = t.step(0.0, ControlInputs::default(), &FlatGround { height: 0.0 }, &mut body);
        assert_eq!(out, TickOutcome::Skipped { reason: SkipReason::InvalidTimestep });
    }

    #[test]
    fn snapshot_reports_per_wheel_arrays() {
        let cfg = VehicleConfig::default().validate().expect("valid");
        let mut t = VehicleTick::new(cfg);
        let mut body = MockBody::at_height(0.8);
        t.step(1.0 / 60.0, ControlInputs::normalized(0.0, 0.5, 0.0), &FlatGround { height: 0.0 }, &mut body);

        let snap = t.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.grounded_per_wheel, vec![true; 4]);
        assert_eq!(snap.compression_per_wheel.len(), 4);
        assert_eq!(snap.wheel_ids, vec!["FL", "FR", "RL", "RR"]);
        assert!((snap.steer_angle_deg - 15.0).abs() < 1e-5);
        assert!(snap.is_grounded);
    }
}
