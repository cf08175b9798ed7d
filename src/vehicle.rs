use rapier3d::prelude::*;

use crate::slide_core::tick::SkipReason;
use crate::slide_core::{ControlInputs, VehicleTick};

pub struct Vehicle {
    pub id: String,                     // owning player
    pub body: RigidBodyHandle,          // the chassis body
    pub sim: VehicleTick,               // suspension / drive / energy core
    pub controls: ControlInputs,        // latest input, held until replaced
    pub last_skip: Option<SkipReason>,  // only log a skip reason once per run
}

impl Vehicle {
    pub fn new(id: String, body: RigidBodyHandle, sim: VehicleTick) -> Self {
        Self {
            id,
            body,
            sim,
            controls: ControlInputs::default(),
            last_skip: None,
        }
    }
}
