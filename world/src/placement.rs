//! Random placement helpers shared by entity population.

use std::collections::BTreeSet;

use diamond_heist_core::{CellCoord, GRID_SIZE};
use rand::Rng;

/// Number of uniform draws attempted before falling back to a scan.
const MAX_SAMPLE_ATTEMPTS: usize = 64;

/// Samples a grid cell uniformly, rejecting cells that fail `accept`.
///
/// When every attempt is rejected the grid is scanned in row-major order and
/// the first accepted cell is returned. `None` means no cell qualifies.
pub(crate) fn sample_cell<R, F>(rng: &mut R, accept: F) -> Option<CellCoord>
where
    R: Rng,
    F: Fn(CellCoord) -> bool,
{
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let cell = CellCoord::new(rng.gen_range(0..GRID_SIZE), rng.gen_range(0..GRID_SIZE));
        if accept(cell) {
            return Some(cell);
        }
    }

    all_cells().find(|cell| accept(*cell))
}

/// Samples `count` distinct cells that all satisfy `accept`.
pub(crate) fn sample_distinct_cells<R, F>(rng: &mut R, count: usize, accept: F) -> Vec<CellCoord>
where
    R: Rng,
    F: Fn(CellCoord) -> bool,
{
    let mut chosen: Vec<CellCoord> = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(cell) = sample_cell(rng, |cell| accept(cell) && !chosen.contains(&cell)) else {
            break;
        };
        chosen.push(cell);
    }
    chosen
}

/// Samples a row or column index not yet present in `used`.
pub(crate) fn sample_track<R: Rng>(rng: &mut R, used: &BTreeSet<u32>) -> Option<u32> {
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let track = rng.gen_range(0..GRID_SIZE);
        if !used.contains(&track) {
            return Some(track);
        }
    }

    (0..GRID_SIZE).find(|track| !used.contains(track))
}

/// Picks a uniformly random cell on the outer edge of the grid.
pub(crate) fn sample_edge_cell<R: Rng>(rng: &mut R) -> CellCoord {
    let last = GRID_SIZE - 1;
    let along = rng.gen_range(0..GRID_SIZE);
    match rng.gen_range(0..4) {
        0 => CellCoord::new(0, along),
        1 => CellCoord::new(last, along),
        2 => CellCoord::new(along, 0),
        _ => CellCoord::new(along, last),
    }
}

fn all_cells() -> impl Iterator<Item = CellCoord> {
    (0..GRID_SIZE).flat_map(|row| (0..GRID_SIZE).map(move |column| CellCoord::new(column, row)))
}
