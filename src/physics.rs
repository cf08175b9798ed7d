// src/physics.rs
//
// rapier3d world + the two collaborators the vehicle core talks to:
// - RapierGround : GroundQuery over the query pipeline (ground group only)
// - BodyProxy    : RigidBodyIntegrator over a captured body state; requests
//                  are recorded and applied to the real body after the tick

use std::collections::HashMap;

use rapier3d::prelude::*;

use crate::config::ValidatedConfig;
use crate::debug_builders::{push_chassis_debug, push_wheel_debug, DebugOverlay};
use crate::slide_core::types::{
    ForceMode, ForceRequest, GroundHit, GroundQuery, Pt3, RigidBodyIntegrator, Rot, Vec3,
};
use crate::slide_core::{ControlInputs, TickOutcome, VehicleTick};
use crate::vehicle::Vehicle;

pub const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
pub const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

const SAFE_RESET_HEIGHT: f32 = 2.0;
const WORLD_LIMIT: f32 = 1_000.0;

// --------------------------------------------------
// Ground query
// --------------------------------------------------
pub struct RapierGround<'a> {
    pub query: &'a QueryPipeline,
    pub bodies: &'a RigidBodySet,
    pub colliders: &'a ColliderSet,
    pub filter: QueryFilter<'a>,
}

impl<'a> RapierGround<'a> {
    /// Drivable-surface query that ignores the probing vehicle itself.
    pub fn for_vehicle(
        query: &'a QueryPipeline,
        bodies: &'a RigidBodySet,
        colliders: &'a ColliderSet,
        vehicle: RigidBodyHandle,
    ) -> Self {
        let filter = QueryFilter::default()
            .exclude_rigid_body(vehicle)
            .groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND));

        Self { query, bodies, colliders, filter }
    }
}

impl GroundQuery for RapierGround<'_> {
    fn cast_ray(&self, origin: Pt3, direction: Vec3, max_distance: f32) -> Option<GroundHit> {
        let ray = Ray::new(origin, direction);
        let (_collider, hit) = self.query.cast_ray_and_get_normal(
            self.bodies,
            self.colliders,
            &ray,
            max_distance,
            true,
            self.filter,
        )?;

        Some(GroundHit {
            distance: hit.time_of_impact,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
        })
    }
}

// --------------------------------------------------
// Integrator proxy
// --------------------------------------------------
#[derive(Debug, Clone)]
pub struct BodyProxy {
    position: Pt3,
    rotation: Rot,
    linvel: Vec3,
    angvel: Vec3,
    world_com: Pt3,

    forces: Vec<ForceRequest>,
    velocity: Option<Vec3>,
    linear_drag: Option<f32>,
}

impl BodyProxy {
    pub fn capture(body: &RigidBody) -> Self {
        Self {
            position: Point::from(*body.translation()),
            rotation: *body.rotation(),
            linvel: *body.linvel(),
            angvel: *body.angvel(),
            world_com: *body.center_of_mass(),
            forces: Vec::new(),
            velocity: None,
            linear_drag: None,
        }
    }

    /// Replace last tick's user forces with this tick's requests.
    pub fn apply_to(self, body: &mut RigidBody, dt: Real) {
        body.reset_forces(true);
        body.reset_torques(true);

        if let Some(drag) = self.linear_drag {
            body.set_linear_damping(drag);
        }

        if let Some(v) = self.velocity {
            body.set_linvel(v, true);
        }

        let mass = body.mass();
        for req in self.forces {
            match req {
                ForceRequest::AtPoint { force, point, mode } => {
                    let force = match mode {
                        ForceMode::Force => force,
                        ForceMode::Acceleration => force * mass,
                    };
                    body.add_force_at_point(force, point, true);
                }
                ForceRequest::RelativeTorque { torque, mode } => {
                    let world = self.rotation * torque;
                    match mode {
                        ForceMode::Force => body.add_torque(world, true),
                        ForceMode::Acceleration => {
                            // angular acceleration, inertia-independent
                            let w = *body.angvel() + world * dt;
                            body.set_angvel(w, true);
                        }
                    }
                }
            }
        }
    }
}

impl RigidBodyIntegrator for BodyProxy {
    fn world_velocity(&self) -> Vec3 {
        self.velocity.unwrap_or(self.linvel)
    }

    fn orientation(&self) -> Rot {
        self.rotation
    }

    fn position(&self) -> Pt3 {
        self.position
    }

    fn point_velocity(&self, point: Pt3) -> Vec3 {
        // v(p) = v_com + ω × (p - com)
        self.linvel + self.angvel.cross(&(point - self.world_com))
    }

    fn apply_force_at_point(&mut self, force: Vec3, point: Pt3, mode: ForceMode) {
        self.forces.push(ForceRequest::AtPoint { force, point, mode });
    }

    fn apply_relative_torque(&mut self, torque: Vec3, mode: ForceMode) {
        self.forces.push(ForceRequest::RelativeTorque { torque, mode });
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = Some(velocity);
    }

    fn set_linear_drag(&mut self, drag: f32) {
        self.linear_drag = Some(drag);
    }
}

// --------------------------------------------------
// World
// --------------------------------------------------
pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // for constraints
    pub multibody_joints: MultibodyJointSet,// for articulated bodies
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for raycasting
    pub vehicles: HashMap<String, Vehicle>, // playerId → vehicle
    pub vehicle_config: ValidatedConfig, // tuning shared by every spawned vehicle
    pub debug_overlay: DebugOverlay, // for debug visualization
}

impl PhysicsWorld {
    pub fn new(vehicle_config: ValidatedConfig) -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Big static ground slab, top surface at y = 0.
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();

        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();

        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        println!(
            "🌎 Ground inserted. Bodies = {}, Colliders = {}",
            bodies.len(),
            colliders.len()
        );

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: HashMap::new(),
            vehicle_config,
            debug_overlay: DebugOverlay::default(),
        }
    }

    /// Spawn a chassis body for this player:
    /// - dynamic body, cuboid collider in the chassis group
    /// - frictionless chassis; all grip comes from the drive model
    pub fn spawn_vehicle(&mut self, id: String, position: [f32; 3]) -> RigidBodyHandle {
        let cfg = self.vehicle_config.clone();
        let sim = VehicleTick::new(cfg.clone());

        let [hx, hy, hz] = cfg.chassis_half_extents;
        let volume = 8.0 * hx * hy * hz;
        let density = cfg.mass / volume; // ρ = m / V

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .linear_damping(sim.initial_linear_drag())
            .angular_damping(cfg.angular_drag)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .active_events(ActiveEvents::empty())
            .density(density)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);

        println!("🚗 Spawned vehicle for player {} at {:?} (body = {:?})", id, position, handle);

        self.vehicles.insert(id.clone(), Vehicle::new(id, handle, sim));
        handle
    }

    pub fn despawn_vehicle(&mut self, id: &str) {
        let Some(vehicle) = self.vehicles.remove(id) else { return };

        self.bodies.remove(
            vehicle.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );

        println!("🧹 Removed vehicle for player {}", id);
    }

    /// Latch the newest input for a player's vehicle.
    pub fn set_controls(&mut self, id: &str, controls: ControlInputs) {
        if let Some(v) = self.vehicles.get_mut(id) {
            v.controls = controls;
        }
    }

    /// Run every vehicle's fixed step, then integrate.
    fn step_vehicles(&mut self, dt: Real) {
        self.query_pipeline.update(&self.colliders);

        for vehicle in self.vehicles.values_mut() {
            let Some(body_ro) = self.bodies.get(vehicle.body) else { continue };
            let mut proxy = BodyProxy::capture(body_ro);

            let outcome = {
                let ground = RapierGround::for_vehicle(
                    &self.query_pipeline,
                    &self.bodies,
                    &self.colliders,
                    vehicle.body,
                );
                vehicle.sim.step(dt, vehicle.controls, &ground, &mut proxy)
            };

            if let TickOutcome::Skipped { reason } = outcome {
                if vehicle.last_skip != Some(reason) {
                    eprintln!("⚠️ Vehicle {} skipped tick: {:?}", vehicle.id, reason);
                }
                vehicle.last_skip = Some(reason);
            } else {
                vehicle.last_skip = None;
            }

            if let Some(body) = self.bodies.get_mut(vehicle.body) {
                proxy.apply_to(body, dt);

                push_chassis_debug(&mut self.debug_overlay, &vehicle.id, body.position(), vehicle.sim.config().chassis_half_extents);
            }

            let probe = vehicle.sim.config().probe_length();
            let wheels = vehicle.sim.config().wheels();
            for (spec, contact) in wheels.iter().zip(vehicle.sim.contacts()) {
                push_wheel_debug(&mut self.debug_overlay, &vehicle.id, &spec.id, contact, probe);
            }
        }
    }

    pub fn step(&mut self, dt: Real) {
        self.debug_overlay.clear();

        // 1) Vehicle core: suspension, drive, energy → force requests
        self.step_vehicles(dt);

        // 2) Integrate
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        // 3) Safety: prevent bodies from exploding to insane coordinates
        for (_, body) in self.bodies.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }

            let pos = *body.translation();
            let bad = !pos.iter().all(|c| c.is_finite()) || pos.iter().any(|c| c.abs() > WORLD_LIMIT);

            if bad {
                let safe = vector![0.0, SAFE_RESET_HEIGHT, 0.0];
                body.set_translation(safe, true);
                body.set_rotation(Rotation::identity(), true);
                body.set_linvel(vector![0.0, 0.0, 0.0], true);
                body.set_angvel(vector![0.0, 0.0, 0.0], true);

                println!("⚠️ Reset exploding body back to {:?}", safe);
            }
        }
    }
}
