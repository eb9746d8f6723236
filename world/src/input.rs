//! Held input state consumed by the movement gate.

use std::time::Duration;

use diamond_heist_core::Direction;

const MAX_SPRINT_ENERGY: f32 = 100.0;
const SPRINT_REGEN_PER_SEC: f32 = 20.0;
const SPRINT_COST_PER_MOVE: f32 = 2.0;

/// Direction keys currently held, oldest first.
#[derive(Clone, Debug, Default)]
pub(crate) struct HeldDirections {
    order: Vec<Direction>,
}

impl HeldDirections {
    pub(crate) fn press(&mut self, direction: Direction) {
        self.order.retain(|held| *held != direction);
        self.order.push(direction);
    }

    pub(crate) fn release(&mut self, direction: Direction) {
        self.order.retain(|held| *held != direction);
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
    }

    /// Most recently pressed direction that is still held.
    pub(crate) fn resolve(&self) -> Option<Direction> {
        self.order.last().copied()
    }
}

/// Sprint key state and its energy pool.
#[derive(Clone, Debug)]
pub(crate) struct SprintMeter {
    energy: f32,
    held: bool,
}

impl Default for SprintMeter {
    fn default() -> Self {
        Self {
            energy: MAX_SPRINT_ENERGY,
            held: false,
        }
    }
}

impl SprintMeter {
    pub(crate) fn set_held(&mut self, held: bool) {
        self.held = held;
    }

    /// Refills energy while the sprint key is up.
    pub(crate) fn regenerate(&mut self, dt: Duration) {
        if self.held || self.energy >= MAX_SPRINT_ENERGY {
            return;
        }
        self.energy =
            (self.energy + dt.as_secs_f32() * SPRINT_REGEN_PER_SEC).min(MAX_SPRINT_ENERGY);
    }

    /// Charges a move to the sprint pool when sprinting is possible.
    pub(crate) fn draw(&mut self) -> bool {
        if !self.held || self.energy <= 0.0 {
            return false;
        }
        self.energy = (self.energy - SPRINT_COST_PER_MOVE).max(0.0);
        true
    }

    pub(crate) fn energy(&self) -> u32 {
        self.energy.floor() as u32
    }
}
