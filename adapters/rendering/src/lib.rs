#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Diamond Heist adapters.

use anyhow::Result as AnyResult;
use diamond_heist_core::{
    Achievement, CellCoord, Direction, Event, HudSnapshot, LaserSnapshot, Orientation,
    PowerupKind, PowerupSnapshot, RewardBreakdown, GRID_SIZE, VAULT_DOOR,
};
use std::{error::Error, fmt, time::Duration};

/// Combo at which pickups start announcing the combo.
const COMBO_ANNOUNCE_THRESHOLD: u32 = 5;

/// Symbol drawn for a single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Glyph {
    /// Nothing of interest.
    Empty,
    /// The player.
    Player,
    /// A guard.
    Guard,
    /// A powerup of the provided kind.
    Powerup(PowerupKind),
    /// An uncollected diamond.
    Diamond,
    /// An unsprung trap.
    Trap,
    /// A multiplier zone.
    Multiplier,
    /// The vault door.
    Vault,
    /// A laser beam.
    Laser {
        /// Axis the beam spans.
        orientation: Orientation,
        /// Whether laser positions are highlighted.
        revealed: bool,
    },
}

impl Glyph {
    /// Character used by text frontends.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Player => '@',
            Self::Guard => 'G',
            Self::Powerup(kind) => match kind {
                PowerupKind::Freeze => 'F',
                PowerupKind::Ghost => 'H',
                PowerupKind::Speed => 'S',
                PowerupKind::Reveal => 'R',
            },
            Self::Diamond => '*',
            Self::Trap => '^',
            Self::Multiplier => '2',
            Self::Vault => 'V',
            Self::Laser { revealed: true, .. } => '#',
            Self::Laser {
                orientation: Orientation::Horizontal,
                ..
            } => '-',
            Self::Laser {
                orientation: Orientation::Vertical,
                ..
            } => '|',
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Direction keys that went down on this frame.
    pub pressed: Vec<Direction>,
    /// Direction keys that went up on this frame.
    pub released: Vec<Direction>,
    /// New sprint key state, if it changed on this frame.
    pub sprint: Option<bool>,
    /// Whether the adapter detected a dash request on this frame.
    pub dash: bool,
    /// Whether the player asked to stop the running session.
    pub end_session: bool,
}

/// Scene description combining the board contents and the heads-up display.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Cell occupied by the player.
    pub player: CellCoord,
    /// Cells holding uncollected diamonds.
    pub diamonds: Vec<CellCoord>,
    /// Cells holding unsprung traps.
    pub traps: Vec<CellCoord>,
    /// Multiplier zone cells.
    pub multiplier_zones: Vec<CellCoord>,
    /// Powerups waiting on the grid.
    pub powerups: Vec<PowerupSnapshot>,
    /// Guard cells.
    pub guards: Vec<CellCoord>,
    /// Laser beams.
    pub lasers: Vec<LaserSnapshot>,
    /// Whether laser positions are highlighted.
    pub lasers_revealed: bool,
    /// Heads-up display values.
    pub hud: HudSnapshot,
    /// Feedback lines produced since the previous frame.
    pub feedback: Vec<String>,
}

impl Scene {
    /// Creates a scene holding only the player and the HUD.
    #[must_use]
    pub fn new(player: CellCoord, hud: HudSnapshot) -> Self {
        Self {
            player,
            diamonds: Vec::new(),
            traps: Vec::new(),
            multiplier_zones: Vec::new(),
            powerups: Vec::new(),
            guards: Vec::new(),
            lasers: Vec::new(),
            lasers_revealed: false,
            hud,
            feedback: Vec::new(),
        }
    }

    /// Checks that every entity lies on the board.
    pub fn validate(&self) -> Result<(), RenderingError> {
        let cells = std::iter::once(self.player)
            .chain(self.diamonds.iter().copied())
            .chain(self.traps.iter().copied())
            .chain(self.multiplier_zones.iter().copied())
            .chain(self.powerups.iter().map(|powerup| powerup.cell))
            .chain(self.guards.iter().copied());
        for cell in cells {
            if !cell.in_bounds() {
                return Err(RenderingError::CellOutOfBounds { cell });
            }
        }
        Ok(())
    }

    /// Resolves the glyph drawn at the provided cell.
    ///
    /// Entities stack in the order player, guard, powerup, diamond, trap,
    /// multiplier, vault, laser.
    #[must_use]
    pub fn glyph_at(&self, cell: CellCoord) -> Glyph {
        if cell == self.player {
            return Glyph::Player;
        }
        if self.guards.contains(&cell) {
            return Glyph::Guard;
        }
        if let Some(powerup) = self.powerups.iter().find(|powerup| powerup.cell == cell) {
            return Glyph::Powerup(powerup.kind);
        }
        if self.diamonds.contains(&cell) {
            return Glyph::Diamond;
        }
        if self.traps.contains(&cell) {
            return Glyph::Trap;
        }
        if self.multiplier_zones.contains(&cell) {
            return Glyph::Multiplier;
        }
        if cell == VAULT_DOOR {
            return Glyph::Vault;
        }
        if let Some(laser) = self.lasers.iter().find(|laser| laser.covers(cell)) {
            return Glyph::Laser {
                orientation: laser.orientation,
                revealed: self.lasers_revealed,
            };
        }
        Glyph::Empty
    }

    /// Renders the board as one string per row, top row first.
    #[must_use]
    pub fn board_rows(&self) -> Vec<String> {
        (0..GRID_SIZE)
            .map(|row| {
                (0..GRID_SIZE)
                    .map(|column| self.glyph_at(CellCoord::new(column, row)).symbol())
                    .collect()
            })
            .collect()
    }

    /// Renders the heads-up display line.
    #[must_use]
    pub fn hud_line(&self) -> String {
        let hud = &self.hud;
        let mut line = format!(
            "Time {:>2} | Diamonds {} | Combo {} | Streak {} | Level {} | x{} | Guards {} | Dashes {} | Energy {}",
            hud.time_remaining_secs,
            hud.tally.diamonds,
            hud.tally.combo,
            hud.tally.streak,
            hud.tally.level,
            hud.multiplier,
            hud.guard_count,
            hud.dashes,
            hud.sprint_energy,
        );
        if let Some(active) = hud.effect {
            line.push_str(&format!(
                " | {} {}s",
                active.effect.name().to_uppercase(),
                active.remaining_secs()
            ));
        }
        line
    }

    /// Renders the full text frame: HUD line, board, then pending feedback.
    #[must_use]
    pub fn compose(&self) -> String {
        let mut lines = vec![self.hud_line()];
        lines.extend(self.board_rows());
        lines.extend(self.feedback.iter().cloned());
        lines.join("\n")
    }
}

/// Converts a world event into transient feedback text, if it warrants any.
#[must_use]
pub fn feedback(event: &Event) -> Option<String> {
    let text = match event {
        Event::DiamondCollected { combo, .. } if *combo >= COMBO_ANNOUNCE_THRESHOLD => {
            format!("{combo}x COMBO!")
        }
        Event::DiamondCollected { gained, .. } => format!("+{gained}"),
        Event::TrapTriggered { lost, .. } => format!("TRAP! -{lost}"),
        Event::LaserHit { lost, .. } => format!("LASER! -{lost}"),
        Event::GuardCapture { lost, .. } => format!("CAUGHT! -{lost}"),
        Event::LevelUp { level } => format!("LEVEL {level}!"),
        Event::AchievementUnlocked { achievement, bonus } => {
            format!("{}: +{bonus} Bonus Diamonds", achievement_title(*achievement))
        }
        Event::VaultBonus { bonus } => format!("VAULT BONUS! +{bonus}"),
        Event::PowerupCollected { kind } => format!("{} powerup!", powerup_name(*kind)),
        Event::EffectExpired { effect } => format!("{} wore off", effect.name()),
        Event::SessionEnded { breakdown } => summary(breakdown),
        _ => return None,
    };
    Some(text)
}

/// Formats the end-of-session summary.
///
/// Bonus lines that contributed nothing are omitted.
#[must_use]
pub fn summary(breakdown: &RewardBreakdown) -> String {
    let mut lines = vec![
        "Heist Complete!".to_owned(),
        format!("Stolen: {} diamonds", breakdown.diamonds),
    ];
    let bonuses = [
        ("Combo Bonus", breakdown.combo_bonus),
        ("Streak Bonus", breakdown.streak_bonus),
        ("Level Bonus", breakdown.level_bonus),
        ("Perfect Run", breakdown.perfection_bonus),
    ];
    for (label, value) in bonuses {
        if value > 0 {
            lines.push(format!("{label}: +{value}"));
        }
    }
    lines.push(format!("Laser Hits: {}", breakdown.laser_hits));
    lines.push(format!("Total Score: {}", breakdown.total));
    lines.push(format!("Reward: {}", breakdown.reward));
    lines.join("\n")
}

fn achievement_title(achievement: Achievement) -> &'static str {
    match achievement {
        Achievement::Combo10 => "Combo Master!",
        Achievement::Streak20 => "On Fire!",
        Achievement::Perfect10 => "Ghost Thief!",
    }
}

fn powerup_name(kind: PowerupKind) -> &'static str {
    match kind {
        PowerupKind::Freeze => "Freeze",
        PowerupKind::Ghost => "Ghost",
        PowerupKind::Speed => "Speed",
        PowerupKind::Reveal => "Reveal",
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title printed before the first frame.
    pub title: String,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting Diamond Heist scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered, allowing adapters to animate world snapshots
    /// deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when validating rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// An entity lies outside the board.
    CellOutOfBounds {
        /// Offending cell.
        cell: CellCoord,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellOutOfBounds { cell } => {
                write!(
                    f,
                    "cell ({}, {}) lies outside the board",
                    cell.column(),
                    cell.row()
                )
            }
        }
    }
}

impl Error for RenderingError {}
