//! slide_core - engine-agnostic hover/ground vehicle step (pure types + stages)

pub mod types;
pub mod curve;
pub mod suspension;
pub mod kinematics;
pub mod drive;
pub mod energy;
pub mod tick;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;
pub use tick::{TickOutcome, VehicleSnapshot, VehicleTick};
