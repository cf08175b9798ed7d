use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::debug_builders::DebugOverlay;
use crate::physics::PhysicsWorld;
use crate::slide_core::{ControlInputs, VehicleSnapshot};

#[derive(Serialize)]
pub struct VehicleView {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion (x, y, z, w)
    pub velocity: [f32; 3],
    pub sim: VehicleSnapshot,
}

#[derive(Serialize)]
pub struct Snapshot<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tick: u64,
    pub vehicles: Vec<VehicleView>,
    pub debug: &'a DebugOverlay,
}

pub struct SharedGameState {
    pub tick: u64,
    pub clients: HashMap<String, UnboundedSender<String>>,
    pub inputs: HashMap<String, ControlInputs>,
}

impl Default for SharedGameState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedGameState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            clients: HashMap::new(),
            inputs: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, player_id: &str, tx: UnboundedSender<String>) {
        self.clients.insert(player_id.to_string(), tx);
        self.inputs.insert(player_id.to_string(), ControlInputs::default());
    }

    pub fn remove_client(&mut self, player_id: &str) {
        self.clients.remove(player_id);
        self.inputs.remove(player_id);
    }

    /// Latest input wins; the tick loop reads it once per step.
    pub fn update_input(&mut self, player_id: &str, controls: ControlInputs) {
        if let Some(slot) = self.inputs.get_mut(player_id) {
            *slot = controls;
        }
    }

    pub fn build_snapshot<'a>(&self, physics: &'a PhysicsWorld) -> Snapshot<'a> {
        let mut vehicles = Vec::with_capacity(physics.vehicles.len());

        for vehicle in physics.vehicles.values() {
            let Some(body) = physics.bodies.get(vehicle.body) else { continue };
            let t = body.translation();
            let q = body.rotation();
            let v = body.linvel();

            vehicles.push(VehicleView {
                id: vehicle.id.clone(),
                position: [t.x, t.y, t.z],
                rotation: [q.i, q.j, q.k, q.w],
                velocity: [v.x, v.y, v.z],
                sim: vehicle.sim.snapshot(),
            });
        }

        Snapshot {
            kind: "snapshot",
            tick: self.tick,
            vehicles,
            debug: &physics.debug_overlay,
        }
    }

    /// Build and send a snapshot of every vehicle to all clients.
    pub fn broadcast_snapshot(&self, physics: &PhysicsWorld) {
        if self.clients.is_empty() {
            return;
        }

        let json = match serde_json::to_string(&self.build_snapshot(physics)) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("❌ Snapshot serialization failed: {}", e);
                return;
            }
        };

        for tx in self.clients.values() {
            let _ = tx.send(json.clone());
        }
    }
}
