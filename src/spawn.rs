use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------
// SPAWN RESULT RETURNED TO NET
// ---------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSpawnInfo {
    pub player_id: String,
    pub slot: usize,
    pub position: [f32; 3],
}

// ---------------------------------------------
// SPAWN MANAGER
// ---------------------------------------------
/// Hands out spawn pads on a line along +X; a released pad is reused first
/// so reconnecting players don't drift further and further out.
#[derive(Debug)]
pub struct SpawnManager {
    /// playerId → pad index
    pub occupied: HashMap<String, usize>,

    /// Distance between neighbouring pads (m)
    pub spacing: f32,

    /// Drop height above the ground (m)
    pub drop_height: f32,
}

impl SpawnManager {
    pub fn new(spacing: f32, drop_height: f32) -> Self {
        Self {
            occupied: HashMap::new(),
            spacing,
            drop_height,
        }
    }

    // ---------------------------------------------------------
    // Lowest free pad
    // ---------------------------------------------------------
    fn free_slot(&self) -> usize {
        (0..)
            .find(|slot| !self.occupied.values().any(|s| s == slot))
            .unwrap_or(self.occupied.len())
    }

    // Pads alternate sides of the origin: 0, +1, -1, +2, -2, ...
    fn position_for(&self, slot: usize) -> [f32; 3] {
        let step = slot.div_ceil(2) as f32;
        let side = if slot % 2 == 1 { 1.0 } else { -1.0 };
        [side * step * self.spacing, self.drop_height, 0.0]
    }

    // ---------------------------------------------------------
    // Full allocation pipeline called from net.rs
    // ---------------------------------------------------------
    pub fn allocate_spawn(&mut self, player_id: &str) -> PlayerSpawnInfo {
        let slot = match self.occupied.get(player_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.free_slot();
                self.occupied.insert(player_id.to_string(), slot);
                slot
            }
        };

        PlayerSpawnInfo {
            player_id: player_id.to_string(),
            slot,
            position: self.position_for(slot),
        }
    }

    pub fn release(&mut self, player_id: &str) {
        self.occupied.remove(player_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_alternate_around_origin() {
        let mut spawns = SpawnManager::new(6.0, 2.0);
        let a = spawns.allocate_spawn("a");
        let b = spawns.allocate_spawn("b");
        let c = spawns.allocate_spawn("c");

        assert_eq!(a.position, [0.0, 2.0, 0.0]);
        assert_eq!(b.position, [6.0, 2.0, 0.0]);
        assert_eq!(c.position, [-6.0, 2.0, 0.0]);
    }

    #[test]
    fn released_pad_is_reused() {
        let mut spawns = SpawnManager::new(6.0, 2.0);
        spawns.allocate_spawn("a");
        spawns.allocate_spawn("b");
        spawns.release("a");

        let c = spawns.allocate_spawn("c");
        assert_eq!(c.slot, 0);

        // same player twice keeps its pad
        assert_eq!(spawns.allocate_spawn("b").slot, 1);
    }
}
