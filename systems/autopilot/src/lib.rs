#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic autopilot that steers the player toward the nearest diamond.
//!
//! The autopilot never mutates the world. After every tick it inspects the
//! player cell and the remaining diamonds and emits press/release commands so
//! that the held direction always points along a shortest path, preferring
//! steps that do not land on a hazardous cell.

use diamond_heist_core::{CellCoord, Command, Direction, Event, VAULT_DOOR};

/// Pure system that reacts to world events and emits input commands.
#[derive(Debug, Default)]
pub struct Autopilot {
    held: Option<Direction>,
    engaged: bool,
}

impl Autopilot {
    /// Consumes world events and a snapshot of the grid to emit input commands.
    ///
    /// `diamonds` lists the cells still holding a diamond. Once it is empty the
    /// autopilot heads for the vault door. `is_cell_hazardous` reports cells the
    /// player should avoid stepping onto when an alternative exists.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        player: CellCoord,
        diamonds: &[CellCoord],
        is_cell_hazardous: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(CellCoord) -> bool,
    {
        for event in events {
            match event {
                Event::SessionStarted { .. } => {
                    self.engaged = true;
                    self.held = None;
                }
                Event::SessionEnded { .. } => {
                    self.engaged = false;
                    self.held = None;
                }
                _ => {}
            }
        }

        if !self.engaged
            || !events
                .iter()
                .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        let goal = select_goal(player, diamonds).unwrap_or(VAULT_DOOR);
        let desired = plan_step(player, goal, &is_cell_hazardous);
        self.steer(desired, out);
    }

    /// Direction currently held by the autopilot.
    #[must_use]
    pub const fn held(&self) -> Option<Direction> {
        self.held
    }

    fn steer(&mut self, desired: Option<Direction>, out: &mut Vec<Command>) {
        if desired == self.held {
            return;
        }

        if let Some(direction) = self.held {
            out.push(Command::ReleaseDirection { direction });
        }
        if let Some(direction) = desired {
            out.push(Command::PressDirection { direction });
        }
        self.held = desired;
    }
}

/// Selects the closest goal by Manhattan distance, breaking ties by cell order.
#[must_use]
pub fn select_goal(origin: CellCoord, goals: &[CellCoord]) -> Option<CellCoord> {
    goals
        .iter()
        .copied()
        .min_by_key(|goal| (origin.manhattan_distance(*goal), goal.row(), goal.column()))
}

/// Picks a step that brings `from` closer to `goal`.
///
/// Safe steps win over hazardous ones; among equals the direction order of
/// [`Direction::ALL`] decides. Returns `None` once the goal is reached.
#[must_use]
pub fn plan_step<F>(from: CellCoord, goal: CellCoord, is_cell_hazardous: &F) -> Option<Direction>
where
    F: Fn(CellCoord) -> bool,
{
    let distance = from.manhattan_distance(goal);
    if distance == 0 {
        return None;
    }

    let mut fallback = None;
    for direction in Direction::ALL {
        let next = from.step(direction);
        if next.manhattan_distance(goal) >= distance {
            continue;
        }
        if !is_cell_hazardous(next) {
            return Some(direction);
        }
        if fallback.is_none() {
            fallback = Some(direction);
        }
    }
    fallback
}
