//! Guard spawning and pursuit.

use diamond_heist_core::CellCoord;

/// Guards only chase a player closer than this (squared Euclidean distance).
const ACTIVATION_RANGE_SQUARED: u32 = 25;

/// A guard patrolling the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Guard {
    pub(crate) cell: CellCoord,
}

impl Guard {
    /// Steps toward the target on both axes independently.
    ///
    /// Returns `true` when the step landed on the target cell. Guards outside
    /// the activation range, or already on the target, stay put.
    fn pursue(&mut self, target: CellCoord) -> bool {
        if self.cell.distance_squared(target) >= ACTIVATION_RANGE_SQUARED {
            return false;
        }

        let delta_column = axis_step(self.cell.column(), target.column());
        let delta_row = axis_step(self.cell.row(), target.row());
        let next = self.cell.offset_clamped(delta_column, delta_row);
        if next == self.cell {
            return false;
        }

        self.cell = next;
        next == target
    }
}

fn axis_step(from: u32, to: u32) -> i32 {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

/// Guards spawned during the running session.
#[derive(Clone, Debug, Default)]
pub(crate) struct GuardRoster {
    guards: Vec<Guard>,
}

impl GuardRoster {
    pub(crate) fn clear(&mut self) {
        self.guards.clear();
    }

    pub(crate) fn spawn(&mut self, cell: CellCoord) {
        self.guards.push(Guard { cell });
    }

    /// Moves every guard one step toward the target.
    ///
    /// Returns the number of guards that stepped onto the target this tick.
    pub(crate) fn pursue(&mut self, target: CellCoord) -> u32 {
        let mut captures = 0;
        for guard in &mut self.guards {
            if guard.pursue(target) {
                captures += 1;
            }
        }
        captures
    }

    pub(crate) fn len(&self) -> usize {
        self.guards.len()
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.guards.iter().map(|guard| guard.cell)
    }
}
