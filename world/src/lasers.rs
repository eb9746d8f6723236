//! Laser population and sweep simulation.

use std::collections::BTreeSet;

use diamond_heist_core::{CellCoord, LaserSnapshot, Orientation, GRID_SIZE};
use rand::Rng;

use crate::placement;

/// Lasers created by the first population pass.
const BASE_LASER_COUNT: u32 = 2;
/// Extra lasers per difficulty step.
const LASERS_PER_DIFFICULTY: u32 = 2;
/// Upper bound on lasers created by a single population pass.
const MAX_LASERS_PER_PASS: u32 = 8;
/// Tracks per axis that may hold a laser; the rest stay clear.
pub(crate) const MAX_TRACKS_PER_AXIS: usize = 8;
/// Diamonds required per difficulty step.
const DIAMONDS_PER_DIFFICULTY: u32 = 10;

const BASE_SPEED: f32 = 0.02;
const SPEED_SPREAD: f32 = 0.03;
const SPEED_PER_DIFFICULTY: f32 = 0.01;
const DANGER_CHANCE: f64 = 0.2;

/// Upper bound of the sweep range.
const SWEEP_LIMIT: f32 = GRID_SIZE as f32;

/// A single sweeping laser beam.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Laser {
    pub(crate) orientation: Orientation,
    pub(crate) track: u32,
    pub(crate) offset: f32,
    pub(crate) speed: f32,
    /// Either `1.0` or `-1.0`.
    pub(crate) heading: f32,
    pub(crate) danger: bool,
}

impl Laser {
    /// Moves the beam along its sweep, bouncing off both ends.
    fn advance(&mut self) {
        self.offset += self.speed * self.heading;
        if !(0.0..=SWEEP_LIMIT).contains(&self.offset) {
            self.heading = -self.heading;
            self.offset = self.offset.clamp(0.0, SWEEP_LIMIT);
        }
    }

    pub(crate) fn snapshot(&self) -> LaserSnapshot {
        LaserSnapshot {
            orientation: self.orientation,
            track: self.track,
            offset: self.offset,
            danger: self.danger,
        }
    }
}

/// Every laser of the running session plus the tracks they reserved.
#[derive(Clone, Debug, Default)]
pub(crate) struct LaserField {
    lasers: Vec<Laser>,
    horizontal_tracks: BTreeSet<u32>,
    vertical_tracks: BTreeSet<u32>,
}

impl LaserField {
    /// Removes every laser and frees all tracks.
    pub(crate) fn clear(&mut self) {
        self.lasers.clear();
        self.horizontal_tracks.clear();
        self.vertical_tracks.clear();
    }

    /// Adds a wave of lasers scaled by the diamonds collected so far.
    ///
    /// Existing lasers are kept. Each new laser reserves a track index that no
    /// earlier laser of the same orientation holds; once an axis has
    /// [`MAX_TRACKS_PER_AXIS`] reservations further lasers on that axis are
    /// skipped. Returns the number of lasers created.
    pub(crate) fn populate<R: Rng>(&mut self, rng: &mut R, diamonds: u32) -> u32 {
        let difficulty = diamonds / DIAMONDS_PER_DIFFICULTY;
        let count = BASE_LASER_COUNT
            .saturating_add(difficulty.saturating_mul(LASERS_PER_DIFFICULTY))
            .min(MAX_LASERS_PER_PASS);

        let mut created = 0;
        for _ in 0..count {
            let orientation = if rng.gen_bool(0.5) {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let tracks = match orientation {
                Orientation::Horizontal => &mut self.horizontal_tracks,
                Orientation::Vertical => &mut self.vertical_tracks,
            };
            if tracks.len() >= MAX_TRACKS_PER_AXIS {
                continue;
            }
            let Some(track) = placement::sample_track(rng, tracks) else {
                continue;
            };
            let _ = tracks.insert(track);

            let speed =
                BASE_SPEED + rng.gen::<f32>() * SPEED_SPREAD + difficulty as f32 * SPEED_PER_DIFFICULTY;
            let offset = rng.gen_range(0.0..SWEEP_LIMIT);
            let heading = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let danger = rng.gen_bool(DANGER_CHANCE);

            self.lasers.push(Laser {
                orientation,
                track,
                offset,
                speed,
                heading,
                danger,
            });
            created += 1;
        }
        created
    }

    /// Advances every beam one step along its sweep.
    pub(crate) fn advance(&mut self) {
        for laser in &mut self.lasers {
            laser.advance();
        }
    }

    /// Reports whether any beam currently covers the provided cell.
    pub(crate) fn covers(&self, cell: CellCoord) -> bool {
        self.lasers.iter().any(|laser| laser.snapshot().covers(cell))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Laser> {
        self.lasers.iter()
    }

    pub(crate) fn track_counts(&self) -> (usize, usize) {
        (self.horizontal_tracks.len(), self.vertical_tracks.len())
    }

    #[cfg(any(test, feature = "session_scaffolding"))]
    pub(crate) fn push(&mut self, laser: Laser) {
        let tracks = match laser.orientation {
            Orientation::Horizontal => &mut self.horizontal_tracks,
            Orientation::Vertical => &mut self.vertical_tracks,
        };
        let _ = tracks.insert(laser.track);
        self.lasers.push(laser);
    }
}
