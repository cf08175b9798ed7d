use hoverslide_server::config::skiff;
use hoverslide_server::slide_core::energy::EnergyState;
use hoverslide_server::slide_core::*;

const DT: f32 = 1.0 / 60.0;

// --------------------------------------------------
// Scripted collaborators
// --------------------------------------------------
struct Plane {
    height: f32,
}

impl GroundQuery for Plane {
    fn cast_ray(&self, origin: Pt3, direction: Vec3, max_distance: f32) -> Option<GroundHit> {
        if direction.y >= 0.0 {
            return None;
        }
        let distance = (self.height - origin.y) / direction.y;
        (0.0..=max_distance).contains(&distance).then(|| GroundHit {
            distance,
            point: origin + direction * distance,
            normal: Vec3::y(),
        })
    }
}

struct Void;

impl GroundQuery for Void {
    fn cast_ray(&self, _: Pt3, _: Vec3, _: f32) -> Option<GroundHit> {
        None
    }
}

/// Records what the tick asks for; does not integrate.
struct Recorder {
    position: Pt3,
    velocity: Vec3,
    forces: Vec<ForceRequest>,
    velocity_sets: Vec<Vec3>,
    drags: Vec<f32>,
}

impl Recorder {
    fn at(y: f32, velocity: Vec3) -> Self {
        Self {
            position: Pt3::new(0.0, y, 0.0),
            velocity,
            forces: Vec::new(),
            velocity_sets: Vec::new(),
            drags: Vec::new(),
        }
    }

    fn thrust_count(&self) -> usize {
        self.forces
            .iter()
            .filter(|f| matches!(f, ForceRequest::AtPoint { mode: ForceMode::Acceleration, .. }))
            .count()
    }
}

impl RigidBodyIntegrator for Recorder {
    fn world_velocity(&self) -> Vec3 {
        self.velocity
    }
    fn orientation(&self) -> Rot {
        Rot::identity()
    }
    fn position(&self) -> Pt3 {
        self.position
    }
    fn point_velocity(&self, _point: Pt3) -> Vec3 {
        self.velocity
    }
    fn apply_force_at_point(&mut self, force: Vec3, point: Pt3, mode: ForceMode) {
        self.forces.push(ForceRequest::AtPoint { force, point, mode });
    }
    fn apply_relative_torque(&mut self, torque: Vec3, mode: ForceMode) {
        self.forces.push(ForceRequest::RelativeTorque { torque, mode });
    }
    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.velocity_sets.push(velocity);
    }
    fn set_linear_drag(&mut self, drag: f32) {
        self.drags.push(drag);
    }
}

fn hover() -> ControlInputs {
    ControlInputs::normalized(0.0, 0.0, 1.0)
}

fn tick_with(energy: EnergyState) -> VehicleTick {
    VehicleTick::with_energy(skiff().validate().expect("preset is valid"), energy)
}

// --------------------------------------------------
// Launch correction
// --------------------------------------------------
#[test]
fn charged_hover_entry_realigns_velocity_to_forward() {
    let mut t = tick_with(EnergyState::new(0.0, 0.2));
    let ground = Plane { height: 0.0 };
    let mut body = Recorder::at(0.8, Vec3::new(3.0, 0.0, -2.0));

    assert_eq!(t.step(DT, hover(), &ground, &mut body), TickOutcome::Applied);

    let speed = 13.0_f32.sqrt();
    assert_eq!(body.velocity_sets.len(), 1);
    let v = body.velocity_sets[0];
    assert!(v.x.abs() < 1e-5 && v.y.abs() < 1e-5);
    assert!((v.z - speed).abs() < 1e-4);

    assert!(t.events().contains(&TickEvent::HoverEngaged));
    assert!(t.events().iter().any(|e| matches!(e, TickEvent::Realigned { speed: s } if (s - speed).abs() < 1e-4)));
    assert_eq!(body.thrust_count(), 1);

    // one-shot per engagement
    body.forces.clear();
    t.step(DT, hover(), &ground, &mut body);
    assert_eq!(body.velocity_sets.len(), 1);
    assert_eq!(body.thrust_count(), 1);
}

#[test]
fn weak_charge_only_cancels_backward_motion() {
    let mut t = tick_with(EnergyState::new(0.0, 0.1));
    let ground = Plane { height: 0.0 };
    let mut body = Recorder::at(0.8, Vec3::new(2.0, 0.0, -5.0));

    t.step(DT, hover(), &ground, &mut body);

    assert_eq!(body.velocity_sets.len(), 1);
    let v = body.velocity_sets[0];
    assert!((v - Vec3::new(2.0, 0.0, 0.0)).norm() < 1e-5);
    assert!(t.events().contains(&TickEvent::BackwardVelocityCancelled));
}

#[test]
fn hover_without_charge_neither_thrusts_nor_corrects() {
    let mut t = tick_with(EnergyState::default());
    let ground = Plane { height: 0.0 };
    let mut body = Recorder::at(0.8, Vec3::new(0.0, 0.0, -4.0));

    t.step(DT, hover(), &ground, &mut body);

    assert!(t.is_hovering());
    assert!(body.velocity_sets.is_empty());
    assert_eq!(body.thrust_count(), 0);
    assert_eq!(t.energy().boost_charge, 0.0);
}

// --------------------------------------------------
// Energy over many ticks
// --------------------------------------------------
#[test]
fn slide_charges_then_hover_transfers_without_loss() {
    let mut t = tick_with(EnergyState::default());
    let ground = Plane { height: 0.0 };
    let mut body = Recorder::at(0.8, Vec3::new(15.0, 0.0, 20.0));

    let mut last = 0.0;
    for _ in 0..60 {
        t.step(DT, ControlInputs::default(), &ground, &mut body);
        assert!(t.is_power_sliding());
        let e = t.energy();
        assert!(e.static_buildup >= last && e.static_buildup <= 1.0);
        assert_eq!(e.boost_charge, 0.0);
        last = e.static_buildup;
    }
    assert!(last > 0.0);

    let total = t.energy().static_buildup + t.energy().boost_charge;
    for _ in 0..30 {
        t.step(DT, hover(), &ground, &mut body);
        assert!(t.is_hovering() && !t.is_power_sliding());
        let e = t.energy();
        assert!((e.static_buildup + e.boost_charge - total).abs() < 1e-4);
    }
    assert!(t.energy().boost_charge > 0.0);
    assert_eq!(body.drags, vec![t.config().hover_linear_drag]);
}

#[test]
fn boost_drains_once_hover_is_released() {
    let mut t = tick_with(EnergyState::new(0.0, 0.05));
    let ground = Plane { height: 0.0 };
    let mut body = Recorder::at(0.8, Vec3::new(0.0, 0.0, 10.0));

    t.step(DT, hover(), &ground, &mut body);
    t.step(DT, ControlInputs::default(), &ground, &mut body);
    assert!(t.events().contains(&TickEvent::HoverReleased));

    for _ in 0..600 {
        t.step(DT, ControlInputs::default(), &ground, &mut body);
    }
    assert_eq!(t.energy().boost_charge, 0.0);
    assert_eq!(body.drags.last().copied(), Some(t.config().ground_linear_drag));
}

// --------------------------------------------------
// Grounding gate
// --------------------------------------------------
#[test]
fn airborne_hover_with_charge_stays_passive() {
    let mut t = tick_with(EnergyState::new(0.5, 0.5));
    let mut body = Recorder::at(30.0, Vec3::new(0.0, -3.0, -8.0));

    t.step(DT, ControlInputs::normalized(1.0, 1.0, 1.0), &Void, &mut body);

    assert!(!t.state().is_grounded());
    assert!(body.forces.is_empty());
    assert!(body.velocity_sets.is_empty());
    // still a hover engagement, so boost is charged from buildup
    assert!(t.is_hovering());
    assert!(t.energy().boost_charge > 0.5);
}

#[test]
fn snapshot_serializes_for_clients() {
    let mut t = tick_with(EnergyState::default());
    let mut body = Recorder::at(0.8, Vec3::new(15.0, 0.0, 0.0));
    t.step(DT, ControlInputs::default(), &Plane { height: 0.0 }, &mut body);

    let json = serde_json::to_value(t.snapshot()).expect("serializable");
    assert_eq!(json["grounded_wheel_count"], 4);
    assert_eq!(json["is_power_sliding"], true);
    assert_eq!(json["events"][0]["kind"], "power_slide_started");
}
