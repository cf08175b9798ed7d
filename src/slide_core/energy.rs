// ==============================================================================
// energy.rs — POWER-SLIDE ENERGY STATE MACHINE
// ==============================================================================
// Two independent mode flags and two charge pools.
//
// Flags (each a two-state latch, every edge reported exactly once):
// - hovering      : level-triggered on the hover input
// - power_sliding : grounded && |local.x| > min_skid_side_velocity && !hovering
//
// Pools, both in [0,1] after every tick:
// - static_buildup : accrued while sliding
// - boost_charge   : fed from buildup while hovering, decays otherwise
//
// Per-tick energy order (must not change, it decides whether this tick's
// buildup is visible to this tick's transfer):
//   1. sliding  -> buildup += |buildup_speed * skid_ratio| * dt, clamp
//   2. hovering -> transfer = clamp01(min(charge_speed * dt, buildup))
//                  buildup -= transfer; boost += transfer
//   3. !hovering && boost > 0 -> boost -= deplete_speed * dt
//   4. clamp both
// ==============================================================================

use serde::Serialize;

use crate::config::ValidatedConfig;
use crate::slide_core::types::{clamp01, TickEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRates {
    pub wheel_static_buildup_speed: f32,
    pub power_boost_charge_speed: f32,
    pub power_boost_deplete_speed: f32,
}

impl EnergyRates {
    pub fn from_config(cfg: &ValidatedConfig) -> Self {
        Self {
            wheel_static_buildup_speed: cfg.wheel_static_buildup_speed,
            power_boost_charge_speed: cfg.power_boost_charge_speed,
            power_boost_deplete_speed: cfg.power_boost_deplete_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EnergyState {
    pub static_buildup: f32,
    pub boost_charge: f32,
}

impl EnergyState {
    pub fn new(static_buildup: f32, boost_charge: f32) -> Self {
        Self { static_buildup: clamp01(static_buildup), boost_charge: clamp01(boost_charge) }
    }

    pub fn advance(&mut self, sliding: bool, hovering: bool, skid_ratio: f32, dt: f32, rates: &EnergyRates) {
        if sliding {
            self.static_buildup += (rates.wheel_static_buildup_speed * skid_ratio).abs() * dt;
            self.static_buildup = clamp01(self.static_buildup);
        }

        if hovering {
            let transfer = clamp01((rates.power_boost_charge_speed * dt).min(self.static_buildup));
            self.static_buildup -= transfer;
            self.boost_charge += transfer;
        } else if self.boost_charge > 0.0 {
            self.boost_charge -= rates.power_boost_deplete_speed * dt;
        }

        self.static_buildup = clamp01(self.static_buildup);
        self.boost_charge = clamp01(self.boost_charge);

        self.debug_check();
    }

    pub fn is_finite(&self) -> bool {
        self.static_buildup.is_finite() && self.boost_charge.is_finite()
    }

    /// Pools out of range after the clamp step means the update logic is wrong.
    #[inline]
    pub fn debug_check(&self) {
        debug_assert!(
            (0.0..=1.0).contains(&self.static_buildup),
            "static_buildup escaped [0,1]: {}",
            self.static_buildup
        );
        debug_assert!(
            (0.0..=1.0).contains(&self.boost_charge),
            "boost_charge escaped [0,1]: {}",
            self.boost_charge
        );
    }
}

/// Boolean mode with edge reporting. Setting the current value again is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeLatch {
    active: bool,
}

impl ModeLatch {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `Some(new_value)` only when the value flips.
    pub fn set(&mut self, target: bool) -> Option<bool> {
        if self.active == target {
            return None;
        }
        self.active = target;
        Some(target)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PowerSlideEnergyFsm {
    sliding: ModeLatch,
    hovering: ModeLatch,
    energy: EnergyState,
    // one-shot launch correction for the current hover engagement
    launch_pending: bool,
}

impl PowerSlideEnergyFsm {
    pub fn new(energy: EnergyState) -> Self {
        Self { energy, ..Self::default() }
    }

    pub fn is_power_sliding(&self) -> bool {
        self.sliding.is_active()
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering.is_active()
    }

    pub fn energy(&self) -> EnergyState {
        self.energy
    }

    pub fn launch_pending(&self) -> bool {
        self.launch_pending
    }

    pub fn clear_launch(&mut self) {
        self.launch_pending = false;
    }

    /// Hover transition. Entering hover clears sliding on the same call.
    pub fn set_hovering(&mut self, hovering: bool, events: &mut Vec<TickEvent>) -> Option<bool> {
        let edge = self.hovering.set(hovering);

        match edge {
            Some(true) => {
                events.push(TickEvent::HoverEngaged);
                self.launch_pending = true;
                self.set_power_sliding(false, events);
            }
            Some(false) => {
                events.push(TickEvent::HoverReleased);
                self.launch_pending = false;
            }
            None => {}
        }

        edge
    }

    pub fn set_power_sliding(&mut self, sliding: bool, events: &mut Vec<TickEvent>) -> Option<bool> {
        // never slide while hovering
        let sliding = sliding && !self.hovering.is_active();
        let edge = self.sliding.set(sliding);

        match edge {
            Some(true) => events.push(TickEvent::PowerSlideStarted),
            Some(false) => events.push(TickEvent::PowerSlideEnded),
            None => {}
        }

        edge
    }

    /// Mode predicates for this tick. Runs before the drive model so drive
    /// sees this tick's hover flag. Returns the hover edge, if any.
    pub fn resolve_modes(
        &mut self,
        grounded: bool,
        lateral_speed: f32,
        hover_asserted: bool,
        min_skid_side_velocity: f32,
        events: &mut Vec<TickEvent>,
    ) -> Option<bool> {
        let hover = self.set_hovering(hover_asserted, events);
        let wants_slide = grounded && lateral_speed.abs() > min_skid_side_velocity;
        self.set_power_sliding(wants_slide, events);

        debug_assert!(!(self.is_hovering() && self.is_power_sliding()));

        hover
    }

    /// Energy update for this tick, after the drive model.
    pub fn accumulate(&mut self, skid_ratio: f32, dt: f32, rates: &EnergyRates) {
        let (sliding, hovering) = (self.is_power_sliding(), self.is_hovering());
        self.energy.advance(sliding, hovering, skid_ratio, dt, rates);
    }
}
