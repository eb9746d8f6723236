#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Diamond Heist engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative heist world, and pure systems. Adapters submit [`Command`]
//! values describing player intents and clock ticks, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that presentation and payout systems react to deterministically.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Diamond Heist.";

/// Number of columns and rows in the heist grid.
pub const GRID_SIZE: u32 = 10;

/// Cell the player occupies when a session starts.
pub const PLAYER_START: CellCoord = CellCoord::new(0, GRID_SIZE - 1);

/// Cell holding the vault door.
pub const VAULT_DOOR: CellCoord = CellCoord::new(GRID_SIZE - 1, 0);

/// Lifecycle stage of the heist session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No session has been started yet.
    Idle,
    /// A session is running and accepts ticks and input.
    Active,
    /// The last session finished; its final state stays queryable.
    Ended,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Starts a new heist session unless one is already running.
    StartSession {
        /// Whether the player owns the master thief kit.
        has_kit: bool,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of real time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Marks a direction key as held.
    PressDirection {
        /// Direction whose key went down.
        direction: Direction,
    },
    /// Marks a direction key as released.
    ReleaseDirection {
        /// Direction whose key went up.
        direction: Direction,
    },
    /// Updates whether the sprint key is held.
    SetSprint {
        /// `true` while the sprint key is down.
        held: bool,
    },
    /// Spends one dash charge.
    Dash,
    /// Moves the player a single cell immediately, bypassing the movement gate.
    MovePlayer {
        /// Direction of the requested step.
        direction: Direction,
    },
    /// Ends the running session before its clock expires.
    EndSession,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that a fresh session began.
    SessionStarted {
        /// Dash charges granted for the session.
        dashes: u32,
    },
    /// Reports that a start request was ignored because a session is running.
    SessionAlreadyActive,
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
        /// Whether the move drew on sprint energy.
        sprinting: bool,
    },
    /// Announces that the active diamond multiplier changed.
    MultiplierChanged {
        /// Multiplier applied to subsequent pickups on the current cell.
        multiplier: u32,
    },
    /// Confirms that a diamond was picked up.
    DiamondCollected {
        /// Cell that held the diamond.
        cell: CellCoord,
        /// Diamonds credited for the pickup.
        gained: u32,
        /// Combo after the pickup.
        combo: u32,
    },
    /// Reports that the player stepped on a trap.
    TrapTriggered {
        /// Cell that held the trap.
        cell: CellCoord,
        /// Diamonds actually removed after clamping at zero.
        lost: u32,
    },
    /// Reports that a laser swept over the player.
    LaserHit {
        /// Diamonds actually removed after clamping at zero.
        lost: u32,
        /// Total laser hits taken this session.
        hits: u32,
    },
    /// Reports that a guard caught the player.
    GuardCapture {
        /// Cell where the capture happened.
        cell: CellCoord,
        /// Diamonds actually removed after clamping at zero.
        lost: u32,
    },
    /// Announces that the player reached a new level.
    LevelUp {
        /// Level after the increment.
        level: u32,
    },
    /// Confirms that additional lasers joined the sweep.
    LasersAdded {
        /// Number of lasers created by the population pass.
        count: u32,
    },
    /// Confirms that a guard entered the grid.
    GuardSpawned {
        /// Edge cell where the guard appeared.
        cell: CellCoord,
    },
    /// Confirms that a powerup appeared on the grid.
    PowerupSpawned {
        /// Cell holding the powerup.
        cell: CellCoord,
        /// Kind of powerup that appeared.
        kind: PowerupKind,
    },
    /// Confirms that the player picked up a powerup.
    PowerupCollected {
        /// Kind of powerup that was applied.
        kind: PowerupKind,
    },
    /// Announces that a timed effect ran out.
    EffectExpired {
        /// Effect that ended.
        effect: Effect,
    },
    /// Announces that laser positions are highlighted for presentation.
    LasersRevealed {
        /// Length of the highlight window.
        window: Duration,
    },
    /// Announces an achievement and the bonus it granted.
    AchievementUnlocked {
        /// Achievement that was earned.
        achievement: Achievement,
        /// Diamonds granted for the achievement.
        bonus: u32,
    },
    /// Reports that the vault door paid out.
    VaultBonus {
        /// Diamonds granted by the vault.
        bonus: u32,
    },
    /// Confirms that a dash charge was spent.
    DashUsed {
        /// Dash charges left after the dash.
        remaining: u32,
    },
    /// Announces that the session ended and reports the final settlement.
    SessionEnded {
        /// Bonus breakdown and reward computed from the final tally.
        breakdown: RewardBreakdown,
    },
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row offsets of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Squared Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn distance_squared(self, other: CellCoord) -> u32 {
        let columns = self.column().abs_diff(other.column());
        let rows = self.row().abs_diff(other.row());
        columns * columns + rows * rows
    }

    /// Offsets the cell by the provided deltas, clamping to the heist grid.
    #[must_use]
    pub fn offset_clamped(self, delta_column: i32, delta_row: i32) -> Self {
        Self::new(
            clamp_axis(self.column, delta_column),
            clamp_axis(self.row, delta_row),
        )
    }

    /// Cell one step away in the provided direction, clamped to the grid.
    #[must_use]
    pub fn step(self, direction: Direction) -> Self {
        let (delta_column, delta_row) = direction.delta();
        self.offset_clamped(delta_column, delta_row)
    }

    /// Reports whether the cell lies inside the heist grid.
    #[must_use]
    pub const fn in_bounds(&self) -> bool {
        self.column < GRID_SIZE && self.row < GRID_SIZE
    }

    /// Reports whether the cell is the player start or the vault door.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        *self == PLAYER_START || *self == VAULT_DOOR
    }
}

fn clamp_axis(value: u32, delta: i32) -> u32 {
    let moved = i64::from(value) + i64::from(delta);
    let max = i64::from(GRID_SIZE - 1);
    u32::try_from(moved.clamp(0, max)).unwrap_or(0)
}

/// Axis a laser beam spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Beam spans a full row; its sweep moves between rows.
    Horizontal,
    /// Beam spans a full column; its sweep moves between columns.
    Vertical,
}

/// Kinds of powerups that can appear after a diamond pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Halts every laser sweep.
    Freeze,
    /// Makes the player immune to lasers and guards.
    Ghost,
    /// Speed trail for presentation.
    Speed,
    /// Highlights current laser positions.
    Reveal,
}

impl PowerupKind {
    /// All powerup kinds in spawn table order.
    pub const ALL: [PowerupKind; 4] = [
        PowerupKind::Freeze,
        PowerupKind::Ghost,
        PowerupKind::Speed,
        PowerupKind::Reveal,
    ];

    /// Timed effect applied by the powerup, or `None` for instantaneous kinds.
    #[must_use]
    pub const fn effect(self) -> Option<Effect> {
        match self {
            Self::Freeze => Some(Effect::Freeze),
            Self::Ghost => Some(Effect::Ghost),
            Self::Speed => Some(Effect::Speed),
            Self::Reveal => None,
        }
    }
}

/// Timed effect a powerup leaves on the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Lasers stop advancing.
    Freeze,
    /// Laser and guard collisions are ignored.
    Ghost,
    /// Movement assist flag for presentation.
    Speed,
}

impl Effect {
    /// Length of time the effect stays active once applied.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::Freeze | Self::Ghost => Duration::from_secs(3),
            Self::Speed => Duration::from_secs(5),
        }
    }

    /// Lowercase name used by presentation layers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Freeze => "freeze",
            Self::Ghost => "ghost",
            Self::Speed => "speed",
        }
    }
}

/// Once-per-session achievements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Achievement {
    /// Combo reached ten.
    Combo10,
    /// Streak reached twenty.
    Streak20,
    /// Ten diamonds held without a single laser hit.
    Perfect10,
}

impl Achievement {
    /// Achievements in evaluation order.
    pub const ALL: [Achievement; 3] = [
        Achievement::Combo10,
        Achievement::Streak20,
        Achievement::Perfect10,
    ];

    /// Diamonds granted when the achievement unlocks.
    #[must_use]
    pub const fn bonus(self) -> u32 {
        match self {
            Self::Combo10 => 5,
            Self::Streak20 => 10,
            Self::Perfect10 => 15,
        }
    }

    /// Reports whether the provided tally satisfies the achievement threshold.
    #[must_use]
    pub const fn is_met(self, tally: &ScoreTally) -> bool {
        match self {
            Self::Combo10 => tally.combo >= 10,
            Self::Streak20 => tally.streak >= 20,
            Self::Perfect10 => tally.laser_hits == 0 && tally.diamonds >= 10,
        }
    }
}

/// Set of achievements granted during a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AchievementSet {
    bits: u8,
}

impl AchievementSet {
    /// Creates an empty achievement set.
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Reports whether the achievement was already granted.
    #[must_use]
    pub const fn contains(&self, achievement: Achievement) -> bool {
        self.bits & Self::mask(achievement) != 0
    }

    /// Records the achievement, returning `true` when it was not yet present.
    pub fn insert(&mut self, achievement: Achievement) -> bool {
        let fresh = !self.contains(achievement);
        self.bits |= Self::mask(achievement);
        fresh
    }

    /// Iterates over the granted achievements in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = Achievement> + '_ {
        Achievement::ALL
            .into_iter()
            .filter(move |achievement| self.contains(*achievement))
    }

    /// Number of granted achievements.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.bits.count_ones()
    }

    /// Reports whether no achievement was granted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    const fn mask(achievement: Achievement) -> u8 {
        match achievement {
            Achievement::Combo10 => 0b001,
            Achievement::Streak20 => 0b010,
            Achievement::Perfect10 => 0b100,
        }
    }
}

/// Scoring counters tracked by a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreTally {
    /// Diamonds currently held; never negative.
    pub diamonds: u32,
    /// Consecutive pickups since the last penalty.
    pub combo: u32,
    /// Consecutive pickups since the last guard capture.
    pub streak: u32,
    /// Current level, starting at one.
    pub level: u32,
    /// Laser hits taken so far.
    pub laser_hits: u32,
}

impl Default for ScoreTally {
    fn default() -> Self {
        Self {
            diamonds: 0,
            combo: 0,
            streak: 0,
            level: 1,
            laser_hits: 0,
        }
    }
}

impl ScoreTally {
    /// Removes up to `amount` diamonds, returning how many were actually lost.
    pub fn penalize(&mut self, amount: u32) -> u32 {
        let lost = self.diamonds.min(amount);
        self.diamonds -= lost;
        lost
    }
}

/// Bonus breakdown and reward computed when a session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Diamonds held when the session ended.
    pub diamonds: u32,
    /// One diamond for every three combo.
    pub combo_bonus: u32,
    /// One diamond for every five streak.
    pub streak_bonus: u32,
    /// Ten diamonds for a session without laser hits.
    pub perfection_bonus: u32,
    /// Five diamonds per level gained.
    pub level_bonus: u32,
    /// Laser hits taken during the session.
    pub laser_hits: u32,
    /// Final score: diamonds plus every bonus.
    pub total: u32,
    /// Currency credited to the player: half the total, rounded down.
    pub reward: u32,
}

impl RewardBreakdown {
    /// Settles the final tally into bonuses, total score, and reward.
    #[must_use]
    pub fn settle(tally: &ScoreTally) -> Self {
        let combo_bonus = tally.combo / 3;
        let streak_bonus = tally.streak / 5;
        let perfection_bonus = if tally.laser_hits == 0 { 10 } else { 0 };
        let level_bonus = tally.level.saturating_sub(1) * 5;
        let total =
            tally.diamonds + combo_bonus + streak_bonus + perfection_bonus + level_bonus;

        Self {
            diamonds: tally.diamonds,
            combo_bonus,
            streak_bonus,
            perfection_bonus,
            level_bonus,
            laser_hits: tally.laser_hits,
            total,
            reward: total / 2,
        }
    }
}

/// Remaining time and name of the currently active effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActiveEffect {
    /// Effect that is running.
    pub effect: Effect,
    /// Time left before the effect expires.
    pub remaining: Duration,
}

impl ActiveEffect {
    /// Whole seconds left, rounded up for display.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        ceil_secs(self.remaining)
    }
}

/// Per-tick values presented on the heads-up display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HudSnapshot {
    /// Whether a session is currently running.
    pub active: bool,
    /// Seconds left on the session clock, rounded up.
    pub time_remaining_secs: u32,
    /// Scoring counters.
    pub tally: ScoreTally,
    /// Multiplier applied to pickups on the current cell.
    pub multiplier: u32,
    /// Number of guards patrolling the grid.
    pub guard_count: u32,
    /// Dash charges left.
    pub dashes: u32,
    /// Sprint energy, rounded down.
    pub sprint_energy: u32,
    /// Currently active timed effect, if any.
    pub effect: Option<ActiveEffect>,
}

/// Immutable representation of a single laser used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaserSnapshot {
    /// Axis the beam spans.
    pub orientation: Orientation,
    /// Track index reserved for the laser when it was created.
    pub track: u32,
    /// Continuous sweep position in `[0, 10]`.
    pub offset: f32,
    /// Cosmetic danger flag.
    pub danger: bool,
}

impl LaserSnapshot {
    /// Row or column currently covered by the beam, if it lies inside the grid.
    #[must_use]
    pub fn lane(&self) -> Option<u32> {
        let lane = self.offset.floor();
        if lane >= 0.0 && lane < GRID_SIZE as f32 {
            Some(lane as u32)
        } else {
            None
        }
    }

    /// Reports whether the beam currently covers the provided cell.
    #[must_use]
    pub fn covers(&self, cell: CellCoord) -> bool {
        let axis = match self.orientation {
            Orientation::Horizontal => cell.row(),
            Orientation::Vertical => cell.column(),
        };
        self.lane() == Some(axis)
    }
}

/// Immutable representation of a powerup waiting on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PowerupSnapshot {
    /// Cell holding the powerup.
    pub cell: CellCoord,
    /// Kind of powerup.
    pub kind: PowerupKind,
}

/// Converts a duration into whole seconds, rounding any fraction up.
#[must_use]
pub fn ceil_secs(duration: Duration) -> u32 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
