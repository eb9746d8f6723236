#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative heist session state for Diamond Heist.
//!
//! The [`World`] owns a single 10x10 heist grid together with the player, the
//! collectibles, the hazards, and the score ledger of the running session.
//! Hosts drive it exclusively through [`apply`], feeding clock ticks and input
//! commands, and observe it through the read-only [`query`] functions and the
//! emitted events.

mod guards;
mod input;
mod lasers;
mod placement;

use std::time::Duration;

use diamond_heist_core::{
    ActiveEffect, Achievement, AchievementSet, CellCoord, Command, Direction, Effect, Event,
    PowerupKind, RewardBreakdown, ScoreTally, SessionPhase, PLAYER_START, VAULT_DOOR,
    WELCOME_BANNER,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use guards::GuardRoster;
use input::{HeldDirections, SprintMeter};
use lasers::LaserField;

const DEFAULT_RNG_SEED: u64 = 0x5eed_d1a3_0bd5_4e17;
const DEFAULT_SESSION_LENGTH: Duration = Duration::from_secs(60);

const DIAMOND_COUNT: usize = 15;
const TRAP_COUNT: usize = 5;
const MULTIPLIER_ZONE_COUNT: usize = 3;

const DASH_CHARGES: u32 = 3;
const KIT_DASH_CHARGES: u32 = 5;

const MOVE_INTERVAL: Duration = Duration::from_millis(150);
const REVEAL_WINDOW: Duration = Duration::from_secs(2);

const DIAMOND_VALUE: u32 = 1;
const ZONE_MULTIPLIER: u32 = 2;
const DIAMONDS_PER_LEVEL: u32 = 10;
const GUARD_LEVEL_INTERVAL: u32 = 2;
const POWERUP_CHANCE: f64 = 0.15;

const TRAP_PENALTY: u32 = 3;
const LASER_PENALTY: u32 = 5;
const GUARD_PENALTY: u32 = 10;
const VAULT_BONUS: u32 = 5;

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    rng_seed: u64,
    session_length: Duration,
}

impl Config {
    /// Creates a new configuration using the provided seed and session clock.
    #[must_use]
    pub const fn new(rng_seed: u64, session_length: Duration) -> Self {
        Self {
            rng_seed,
            session_length,
        }
    }

    /// Seed feeding every random placement and roll.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Time budget of a single session.
    #[must_use]
    pub const fn session_length(&self) -> Duration {
        self.session_length
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_RNG_SEED, DEFAULT_SESSION_LENGTH)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Diamond {
    cell: CellCoord,
    collected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Powerup {
    cell: CellCoord,
    kind: PowerupKind,
}

/// Represents the authoritative Diamond Heist world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: Config,
    rng: ChaCha8Rng,
    phase: SessionPhase,
    remaining: Duration,
    move_gate: Duration,
    tally: ScoreTally,
    multiplier: u32,
    dashes: u32,
    sprint: SprintMeter,
    held: HeldDirections,
    effect: Option<ActiveEffect>,
    reveal_remaining: Duration,
    achievements: AchievementSet,
    player: CellCoord,
    diamonds: Vec<Diamond>,
    traps: Vec<CellCoord>,
    multiplier_zones: Vec<CellCoord>,
    powerups: Vec<Powerup>,
    lasers: LaserField,
    guards: GuardRoster,
    tick_index: u64,
}

impl World {
    /// Creates a new Diamond Heist world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new Diamond Heist world using the provided configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            banner: WELCOME_BANNER,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            phase: SessionPhase::Idle,
            remaining: config.session_length,
            move_gate: Duration::ZERO,
            tally: ScoreTally::default(),
            multiplier: 1,
            dashes: DASH_CHARGES,
            sprint: SprintMeter::default(),
            held: HeldDirections::default(),
            effect: None,
            reveal_remaining: Duration::ZERO,
            achievements: AchievementSet::new(),
            player: PLAYER_START,
            diamonds: Vec::new(),
            traps: Vec::new(),
            multiplier_zones: Vec::new(),
            powerups: Vec::new(),
            lasers: LaserField::default(),
            guards: GuardRoster::default(),
            tick_index: 0,
        }
    }

    fn start(&mut self, has_kit: bool, out_events: &mut Vec<Event>) {
        if self.phase == SessionPhase::Active {
            out_events.push(Event::SessionAlreadyActive);
            return;
        }

        self.phase = SessionPhase::Active;
        self.remaining = self.config.session_length;
        self.move_gate = Duration::ZERO;
        self.tally = ScoreTally::default();
        self.multiplier = 1;
        self.dashes = if has_kit {
            KIT_DASH_CHARGES
        } else {
            DASH_CHARGES
        };
        self.sprint = SprintMeter::default();
        self.held.clear();
        self.effect = None;
        self.reveal_remaining = Duration::ZERO;
        self.achievements = AchievementSet::new();
        self.player = PLAYER_START;
        self.powerups.clear();
        self.guards.clear();
        self.lasers.clear();

        self.diamonds = placement::sample_distinct_cells(&mut self.rng, DIAMOND_COUNT, |cell| {
            !cell.is_terminal()
        })
        .into_iter()
        .map(|cell| Diamond {
            cell,
            collected: false,
        })
        .collect();
        out_events.push(Event::SessionStarted {
            dashes: self.dashes,
        });

        let count = self.lasers.populate(&mut self.rng, self.tally.diamonds);
        out_events.push(Event::LasersAdded { count });

        self.multiplier_zones = self.sample_hazard_cells(MULTIPLIER_ZONE_COUNT);
        self.traps = self.sample_hazard_cells(TRAP_COUNT);

        log::debug!(
            "heist session started: kit={has_kit} dashes={} diamonds={} lasers={count}",
            self.dashes,
            self.diamonds.len()
        );
    }

    fn sample_hazard_cells(&mut self, count: usize) -> Vec<CellCoord> {
        (0..count)
            .filter_map(|_| placement::sample_cell(&mut self.rng, |cell| !cell.is_terminal()))
            .collect()
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        self.remaining = self.remaining.saturating_sub(dt);
        self.sprint.regenerate(dt);

        self.move_gate = self.move_gate.saturating_add(dt);
        if self.move_gate >= MOVE_INTERVAL {
            self.move_gate = Duration::ZERO;
            if let Some(direction) = self.held.resolve() {
                let sprinting = self.sprint.draw();
                self.move_player(direction, sprinting, out_events);
            }
        }

        self.advance_effect(dt, out_events);
        self.reveal_remaining = self.reveal_remaining.saturating_sub(dt);

        if !self.effect_is(Effect::Freeze) {
            self.lasers.advance();
        }

        self.advance_guards(out_events);

        if !self.effect_is(Effect::Ghost) {
            self.check_laser_collision(out_events);
        }

        if self.remaining.is_zero() {
            self.end(out_events);
        }
    }

    fn advance_effect(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(mut active) = self.effect else {
            return;
        };

        active.remaining = active.remaining.saturating_sub(dt);
        if active.remaining.is_zero() {
            self.effect = None;
            out_events.push(Event::EffectExpired {
                effect: active.effect,
            });
        } else {
            self.effect = Some(active);
        }
    }

    fn effect_is(&self, effect: Effect) -> bool {
        self.effect.map(|active| active.effect) == Some(effect)
    }

    fn move_player(&mut self, direction: Direction, sprinting: bool, out_events: &mut Vec<Event>) {
        let from = self.player;
        let to = from.step(direction);
        if to == from {
            return;
        }

        self.player = to;
        out_events.push(Event::PlayerMoved {
            from,
            to,
            sprinting,
        });
        self.resolve_cell(out_events);
    }

    /// Applies every interaction of the cell the player just entered.
    fn resolve_cell(&mut self, out_events: &mut Vec<Event>) {
        let cell = self.player;

        let multiplier = if self.multiplier_zones.contains(&cell) {
            ZONE_MULTIPLIER
        } else {
            1
        };
        if multiplier != self.multiplier {
            self.multiplier = multiplier;
            out_events.push(Event::MultiplierChanged { multiplier });
        }

        if let Some(index) = self.traps.iter().position(|trap| *trap == cell) {
            let _ = self.traps.remove(index);
            let lost = self.tally.penalize(TRAP_PENALTY);
            self.tally.combo = 0;
            out_events.push(Event::TrapTriggered { cell, lost });
        }

        if let Some(index) = self
            .diamonds
            .iter()
            .position(|diamond| diamond.cell == cell && !diamond.collected)
        {
            self.diamonds[index].collected = true;
            self.collect_diamond(cell, out_events);
        }

        if let Some(index) = self.powerups.iter().position(|powerup| powerup.cell == cell) {
            let powerup = self.powerups.remove(index);
            self.activate_powerup(powerup.kind, out_events);
        }

        if cell == VAULT_DOOR && self.tally.diamonds > 0 {
            self.tally.diamonds += VAULT_BONUS;
            out_events.push(Event::VaultBonus { bonus: VAULT_BONUS });
        }

        if !self.effect_is(Effect::Ghost) {
            self.check_laser_collision(out_events);
        }
    }

    fn collect_diamond(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let before = self.tally.diamonds;
        let gained = DIAMOND_VALUE * self.multiplier;
        self.tally.diamonds += gained;
        self.tally.combo += 1;
        self.tally.streak += 1;
        out_events.push(Event::DiamondCollected {
            cell,
            gained,
            combo: self.tally.combo,
        });

        if self.tally.diamonds / DIAMONDS_PER_LEVEL > before / DIAMONDS_PER_LEVEL {
            self.level_up(out_events);
        }

        self.grant_achievements(out_events);

        if self.rng.gen_bool(POWERUP_CHANCE) {
            self.spawn_powerup(out_events);
        }
    }

    fn level_up(&mut self, out_events: &mut Vec<Event>) {
        self.tally.level += 1;
        let level = self.tally.level;
        out_events.push(Event::LevelUp { level });

        let count = self.lasers.populate(&mut self.rng, self.tally.diamonds);
        out_events.push(Event::LasersAdded { count });

        if level % GUARD_LEVEL_INTERVAL == 0 {
            let cell = placement::sample_edge_cell(&mut self.rng);
            self.guards.spawn(cell);
            out_events.push(Event::GuardSpawned { cell });
        }

        log::debug!(
            "heist level {level}: +{count} lasers, {} guards",
            self.guards.len()
        );
    }

    fn grant_achievements(&mut self, out_events: &mut Vec<Event>) {
        for achievement in Achievement::ALL {
            if achievement.is_met(&self.tally) && self.achievements.insert(achievement) {
                let bonus = achievement.bonus();
                self.tally.diamonds += bonus;
                out_events.push(Event::AchievementUnlocked { achievement, bonus });
            }
        }
    }

    fn spawn_powerup(&mut self, out_events: &mut Vec<Event>) {
        let player = self.player;
        let diamonds = &self.diamonds;
        let powerups = &self.powerups;
        let Some(cell) = placement::sample_cell(&mut self.rng, |cell| {
            cell != player
                && !diamonds
                    .iter()
                    .any(|diamond| diamond.cell == cell && !diamond.collected)
                && !powerups.iter().any(|powerup| powerup.cell == cell)
        }) else {
            return;
        };

        let kind = PowerupKind::ALL[self.rng.gen_range(0..PowerupKind::ALL.len())];
        self.powerups.push(Powerup { cell, kind });
        out_events.push(Event::PowerupSpawned { cell, kind });
    }

    fn activate_powerup(&mut self, kind: PowerupKind, out_events: &mut Vec<Event>) {
        out_events.push(Event::PowerupCollected { kind });
        match kind.effect() {
            Some(effect) => {
                self.effect = Some(ActiveEffect {
                    effect,
                    remaining: effect.duration(),
                });
            }
            None => {
                self.effect = None;
                self.reveal_remaining = REVEAL_WINDOW;
                out_events.push(Event::LasersRevealed {
                    window: REVEAL_WINDOW,
                });
            }
        }
    }

    fn check_laser_collision(&mut self, out_events: &mut Vec<Event>) {
        if !self.lasers.covers(self.player) {
            return;
        }

        self.tally.laser_hits += 1;
        let lost = self.tally.penalize(LASER_PENALTY);
        self.tally.combo = 0;
        out_events.push(Event::LaserHit {
            lost,
            hits: self.tally.laser_hits,
        });
    }

    fn advance_guards(&mut self, out_events: &mut Vec<Event>) {
        let captures = self.guards.pursue(self.player);
        if captures == 0 || self.effect_is(Effect::Ghost) {
            return;
        }

        for _ in 0..captures {
            let lost = self.tally.penalize(GUARD_PENALTY);
            self.tally.combo = 0;
            self.tally.streak = 0;
            out_events.push(Event::GuardCapture {
                cell: self.player,
                lost,
            });
        }
        log::debug!("heist guard capture at {:?}", self.player);
    }

    fn dash(&mut self, out_events: &mut Vec<Event>) {
        if self.dashes == 0 {
            return;
        }
        self.dashes -= 1;
        out_events.push(Event::DashUsed {
            remaining: self.dashes,
        });
    }

    fn end(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != SessionPhase::Active {
            return;
        }

        self.phase = SessionPhase::Ended;
        self.held.clear();
        self.sprint.set_held(false);
        self.move_gate = Duration::ZERO;

        let breakdown = RewardBreakdown::settle(&self.tally);
        log::debug!(
            "heist session ended after {} ticks: total={} reward={}",
            self.tick_index,
            breakdown.total,
            breakdown.reward
        );
        out_events.push(Event::SessionEnded { breakdown });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Every command except [`Command::StartSession`] is ignored unless a session
/// is running, so a finished session stays frozen until the next start.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartSession { has_kit } => world.start(has_kit, out_events),
        _ if world.phase != SessionPhase::Active => {}
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::PressDirection { direction } => world.held.press(direction),
        Command::ReleaseDirection { direction } => world.held.release(direction),
        Command::SetSprint { held } => world.sprint.set_held(held),
        Command::Dash => world.dash(out_events),
        Command::MovePlayer { direction } => world.move_player(direction, false, out_events),
        Command::EndSession => world.end(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use diamond_heist_core::{
        ceil_secs, AchievementSet, CellCoord, HudSnapshot, LaserSnapshot, PowerupSnapshot,
        ScoreTally, SessionPhase,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Reports the lifecycle stage of the current session.
    #[must_use]
    pub fn phase(world: &World) -> SessionPhase {
        world.phase
    }

    /// Time left on the session clock.
    #[must_use]
    pub fn remaining(world: &World) -> Duration {
        world.remaining
    }

    /// Scoring counters of the current or last session.
    #[must_use]
    pub fn tally(world: &World) -> ScoreTally {
        world.tally
    }

    /// Captures the values shown on the heads-up display.
    #[must_use]
    pub fn hud(world: &World) -> HudSnapshot {
        HudSnapshot {
            active: world.phase == SessionPhase::Active,
            time_remaining_secs: ceil_secs(world.remaining),
            tally: world.tally,
            multiplier: world.multiplier,
            guard_count: u32::try_from(world.guards.len()).unwrap_or(u32::MAX),
            dashes: world.dashes,
            sprint_energy: world.sprint.energy(),
            effect: world.effect,
        }
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub fn player(world: &World) -> CellCoord {
        world.player
    }

    /// Cells holding diamonds that have not been picked up yet.
    #[must_use]
    pub fn diamonds(world: &World) -> Vec<CellCoord> {
        world
            .diamonds
            .iter()
            .filter(|diamond| !diamond.collected)
            .map(|diamond| diamond.cell)
            .collect()
    }

    /// Number of diamonds picked up this session.
    #[must_use]
    pub fn diamonds_collected(world: &World) -> usize {
        world
            .diamonds
            .iter()
            .filter(|diamond| diamond.collected)
            .count()
    }

    /// Cells holding traps that have not been sprung yet.
    #[must_use]
    pub fn traps(world: &World) -> &[CellCoord] {
        &world.traps
    }

    /// Cells that double the value of a pickup.
    #[must_use]
    pub fn multiplier_zones(world: &World) -> &[CellCoord] {
        &world.multiplier_zones
    }

    /// Powerups waiting on the grid.
    #[must_use]
    pub fn powerups(world: &World) -> Vec<PowerupSnapshot> {
        world
            .powerups
            .iter()
            .map(|powerup| PowerupSnapshot {
                cell: powerup.cell,
                kind: powerup.kind,
            })
            .collect()
    }

    /// Every laser of the session in creation order.
    #[must_use]
    pub fn lasers(world: &World) -> Vec<LaserSnapshot> {
        world.lasers.iter().map(|laser| laser.snapshot()).collect()
    }

    /// Number of horizontal and vertical tracks reserved by lasers.
    #[must_use]
    pub fn occupied_tracks(world: &World) -> (usize, usize) {
        world.lasers.track_counts()
    }

    /// Cells occupied by guards.
    #[must_use]
    pub fn guards(world: &World) -> Vec<CellCoord> {
        world.guards.cells().collect()
    }

    /// Achievements granted during the current or last session.
    #[must_use]
    pub fn achievements(world: &World) -> AchievementSet {
        world.achievements
    }

    /// Reports whether laser positions are currently highlighted.
    #[must_use]
    pub fn lasers_revealed(world: &World) -> bool {
        !world.reveal_remaining.is_zero()
    }
}

/// Direct state manipulation used to stage deterministic scenarios in tests.
#[cfg(any(test, feature = "session_scaffolding"))]
pub mod scaffolding {
    use diamond_heist_core::{CellCoord, Orientation, PowerupKind, ScoreTally};

    use super::{lasers::Laser, Diamond, Powerup, World};

    /// Removes every randomly placed entity so scenarios start from a blank grid.
    pub fn clear_entities(world: &mut World) {
        world.diamonds.clear();
        world.traps.clear();
        world.multiplier_zones.clear();
        world.powerups.clear();
        world.lasers.clear();
        world.guards.clear();
    }

    /// Teleports the player without resolving the destination cell.
    pub fn set_player(world: &mut World, cell: CellCoord) {
        world.player = cell;
    }

    /// Overwrites the scoring counters.
    pub fn set_tally(world: &mut World, tally: ScoreTally) {
        world.tally = tally;
    }

    /// Places an uncollected diamond.
    pub fn place_diamond(world: &mut World, cell: CellCoord) {
        world.diamonds.push(Diamond {
            cell,
            collected: false,
        });
    }

    /// Places a trap.
    pub fn place_trap(world: &mut World, cell: CellCoord) {
        world.traps.push(cell);
    }

    /// Marks a cell as a multiplier zone.
    pub fn place_multiplier_zone(world: &mut World, cell: CellCoord) {
        world.multiplier_zones.push(cell);
    }

    /// Places a powerup.
    pub fn place_powerup(world: &mut World, cell: CellCoord, kind: PowerupKind) {
        world.powerups.push(Powerup { cell, kind });
    }

    /// Places a laser on the provided track with a fixed sweep.
    pub fn place_laser(
        world: &mut World,
        orientation: Orientation,
        track: u32,
        offset: f32,
        speed: f32,
    ) {
        world.lasers.push(Laser {
            orientation,
            track,
            offset,
            speed,
            heading: 1.0,
            danger: false,
        });
    }

    /// Places a guard.
    pub fn place_guard(world: &mut World, cell: CellCoord) {
        world.guards.spawn(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diamond_heist_core::{Orientation, GRID_SIZE};

    fn started_world(seed: u64) -> (World, Vec<Event>) {
        let mut world = World::with_config(Config::new(seed, DEFAULT_SESSION_LENGTH));
        let mut events = Vec::new();
        apply(&mut world, Command::StartSession { has_kit: false }, &mut events);
        (world, events)
    }

    fn blank_world() -> World {
        let (mut world, _) = started_world(1);
        scaffolding::clear_entities(&mut world);
        world
    }

    fn step(world: &mut World, direction: Direction) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::MovePlayer { direction }, &mut events);
        events
    }

    #[test]
    fn start_populates_the_grid() {
        let (world, events) = started_world(21);

        assert_eq!(query::phase(&world), SessionPhase::Active);
        assert_eq!(query::player(&world), PLAYER_START);
        assert_eq!(query::diamonds(&world).len(), DIAMOND_COUNT);
        assert_eq!(query::traps(&world).len(), TRAP_COUNT);
        assert_eq!(query::multiplier_zones(&world).len(), MULTIPLIER_ZONE_COUNT);
        assert_eq!(query::lasers(&world).len(), 2);
        assert!(query::guards(&world).is_empty());
        assert!(events.contains(&Event::SessionStarted {
            dashes: DASH_CHARGES
        }));

        for cell in query::diamonds(&world)
            .iter()
            .chain(query::traps(&world))
            .chain(query::multiplier_zones(&world))
        {
            assert!(cell.in_bounds());
            assert!(!cell.is_terminal());
        }

        let hud = query::hud(&world);
        assert_eq!(hud.time_remaining_secs, 60);
        assert_eq!(hud.sprint_energy, 100);
        assert_eq!(hud.multiplier, 1);
        assert_eq!(hud.tally.level, 1);
    }

    #[test]
    fn kit_grants_extra_dashes() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartSession { has_kit: true }, &mut events);
        assert_eq!(query::hud(&world).dashes, KIT_DASH_CHARGES);
    }

    #[test]
    fn start_while_active_is_ignored() {
        let (mut world, _) = started_world(8);
        let diamonds = query::diamonds(&world);
        let lasers = query::lasers(&world);

        let mut events = Vec::new();
        apply(&mut world, Command::StartSession { has_kit: true }, &mut events);

        assert_eq!(events, vec![Event::SessionAlreadyActive]);
        assert_eq!(query::diamonds(&world), diamonds);
        assert_eq!(query::lasers(&world), lasers);
        assert_eq!(query::hud(&world).dashes, DASH_CHARGES);
    }

    #[test]
    fn commands_before_start_are_ignored() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        apply(&mut world, Command::Dash, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::phase(&world), SessionPhase::Idle);
    }

    #[test]
    fn moves_clamp_at_the_grid_edge() {
        let mut world = blank_world();
        assert!(step(&mut world, Direction::West).is_empty());
        assert!(step(&mut world, Direction::South).is_empty());
        assert_eq!(query::player(&world), PLAYER_START);

        let events = step(&mut world, Direction::North);
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                from: PLAYER_START,
                to: CellCoord::new(0, GRID_SIZE - 2),
                sprinting: false,
            }]
        );
    }

    #[test]
    fn trap_penalizes_and_is_consumed() {
        let mut world = blank_world();
        let trap = CellCoord::new(1, 9);
        scaffolding::place_trap(&mut world, trap);
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 2,
                combo: 4,
                streak: 4,
                ..ScoreTally::default()
            },
        );

        let events = step(&mut world, Direction::East);
        assert!(events.contains(&Event::TrapTriggered { cell: trap, lost: 2 }));
        let tally = query::tally(&world);
        assert_eq!(tally.diamonds, 0);
        assert_eq!(tally.combo, 0);
        assert_eq!(tally.streak, 4);
        assert!(query::traps(&world).is_empty());

        let _ = step(&mut world, Direction::West);
        let events = step(&mut world, Direction::East);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::TrapTriggered { .. })));
    }

    #[test]
    fn multiplier_zone_doubles_pickup_and_is_not_sticky() {
        let mut world = blank_world();
        let zone = CellCoord::new(1, 9);
        scaffolding::place_multiplier_zone(&mut world, zone);
        scaffolding::place_diamond(&mut world, zone);
        scaffolding::place_diamond(&mut world, CellCoord::new(2, 9));

        let events = step(&mut world, Direction::East);
        assert!(events.contains(&Event::MultiplierChanged { multiplier: 2 }));
        assert!(events.contains(&Event::DiamondCollected {
            cell: zone,
            gained: 2,
            combo: 1,
        }));

        let events = step(&mut world, Direction::East);
        assert!(events.contains(&Event::MultiplierChanged { multiplier: 1 }));
        assert_eq!(query::tally(&world).diamonds, 3);
        assert_eq!(query::diamonds_collected(&world), 2);
    }

    #[test]
    fn collected_diamond_is_not_collected_twice() {
        let mut world = blank_world();
        scaffolding::place_diamond(&mut world, CellCoord::new(0, 8));
        let _ = step(&mut world, Direction::North);
        let _ = step(&mut world, Direction::South);
        let events = step(&mut world, Direction::North);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::DiamondCollected { .. })));
        assert_eq!(query::tally(&world).diamonds, 1);
    }

    #[test]
    fn vault_pays_out_on_every_visit() {
        let mut world = blank_world();
        scaffolding::set_player(&mut world, CellCoord::new(8, 0));
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 5,
                ..ScoreTally::default()
            },
        );

        let events = step(&mut world, Direction::East);
        assert!(events.contains(&Event::VaultBonus { bonus: VAULT_BONUS }));
        assert_eq!(query::tally(&world).diamonds, 10);

        let _ = step(&mut world, Direction::West);
        let _ = step(&mut world, Direction::East);
        assert_eq!(query::tally(&world).diamonds, 15);
    }

    #[test]
    fn empty_handed_vault_visit_pays_nothing() {
        let mut world = blank_world();
        scaffolding::set_player(&mut world, CellCoord::new(9, 1));
        let events = step(&mut world, Direction::North);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::VaultBonus { .. })));
        assert_eq!(query::tally(&world).diamonds, 0);
    }

    #[test]
    fn laser_hit_counts_once_per_check() {
        let mut world = blank_world();
        scaffolding::place_laser(&mut world, Orientation::Horizontal, 0, 8.5, 0.0);
        scaffolding::place_laser(&mut world, Orientation::Vertical, 1, 0.2, 0.0);
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 7,
                combo: 3,
                ..ScoreTally::default()
            },
        );

        let events = step(&mut world, Direction::North);
        let hits: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Event::LaserHit { .. }))
            .collect();
        assert_eq!(hits, vec![&Event::LaserHit { lost: 5, hits: 1 }]);
        let tally = query::tally(&world);
        assert_eq!(tally.diamonds, 2);
        assert_eq!(tally.combo, 0);
        assert_eq!(tally.laser_hits, 1);
    }

    #[test]
    fn ghost_ignores_lasers_and_guards() {
        let mut world = blank_world();
        scaffolding::place_powerup(&mut world, CellCoord::new(0, 8), PowerupKind::Ghost);
        scaffolding::place_laser(&mut world, Orientation::Horizontal, 0, 7.5, 0.0);
        scaffolding::place_guard(&mut world, CellCoord::new(1, 6));

        let _ = step(&mut world, Direction::North);
        let events = step(&mut world, Direction::North);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::LaserHit { .. })));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(33),
            },
            &mut events,
        );
        assert_eq!(query::guards(&world), vec![CellCoord::new(0, 7)]);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::GuardCapture { .. } | Event::LaserHit { .. })));
        assert_eq!(query::tally(&world).laser_hits, 0);
    }

    #[test]
    fn freeze_stops_laser_sweep_until_expiry() {
        let mut world = blank_world();
        scaffolding::place_powerup(&mut world, CellCoord::new(0, 8), PowerupKind::Freeze);
        scaffolding::place_laser(&mut world, Orientation::Vertical, 5, 5.0, 0.5);
        let _ = step(&mut world, Direction::North);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert_eq!(query::lasers(&world)[0].offset, 5.0);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(2),
            },
            &mut events,
        );
        assert!(events.contains(&Event::EffectExpired {
            effect: Effect::Freeze
        }));
        assert_eq!(query::lasers(&world)[0].offset, 5.5);
        assert!(query::hud(&world).effect.is_none());
    }

    #[test]
    fn sweeping_laser_hits_a_standing_player_on_tick() {
        let mut world = blank_world();
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 7,
                combo: 2,
                ..ScoreTally::default()
            },
        );
        scaffolding::place_laser(&mut world, Orientation::Vertical, 0, 1.01, -0.05);

        let dt = Duration::from_millis(33);
        let mut events = Vec::new();
        apply(&mut world, Command::Tick { dt }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced { dt },
                Event::LaserHit { lost: 5, hits: 1 },
            ]
        );
        assert_eq!(query::player(&world), PLAYER_START);
        let tally = query::tally(&world);
        assert_eq!(tally.diamonds, 2);
        assert_eq!(tally.combo, 0);
        assert_eq!(tally.laser_hits, 1);
    }

    #[test]
    fn frozen_laser_cannot_sweep_onto_a_standing_player() {
        let mut world = blank_world();
        scaffolding::place_powerup(&mut world, CellCoord::new(0, 8), PowerupKind::Freeze);
        let _ = step(&mut world, Direction::North);
        scaffolding::place_laser(&mut world, Orientation::Vertical, 0, 1.01, -0.05);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(33),
            },
            &mut events,
        );
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::LaserHit { .. })));
        assert_eq!(query::lasers(&world)[0].offset, 1.01);
        assert_eq!(query::tally(&world).laser_hits, 0);

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(3),
            },
            &mut events,
        );
        assert!(events.contains(&Event::EffectExpired {
            effect: Effect::Freeze
        }));
        assert!(events.contains(&Event::LaserHit { lost: 0, hits: 1 }));
    }

    #[test]
    fn powerups_spawn_on_free_cells_after_some_pickups() {
        let pickup = CellCoord::new(0, 8);
        let waiting_diamonds: Vec<CellCoord> =
            (0..GRID_SIZE).map(|column| CellCoord::new(column, 3)).collect();
        let waiting_powerups: Vec<CellCoord> =
            (0..GRID_SIZE).map(|column| CellCoord::new(column, 5)).collect();
        let pickups: u64 = 400;
        let mut spawned: u64 = 0;

        for seed in 0..pickups {
            let (mut world, _) = started_world(seed);
            scaffolding::clear_entities(&mut world);
            scaffolding::place_diamond(&mut world, pickup);
            for cell in &waiting_diamonds {
                scaffolding::place_diamond(&mut world, *cell);
            }
            for cell in &waiting_powerups {
                scaffolding::place_powerup(&mut world, *cell, PowerupKind::Speed);
            }

            let events = step(&mut world, Direction::North);
            assert!(events.contains(&Event::DiamondCollected {
                cell: pickup,
                gained: 1,
                combo: 1,
            }));

            for event in &events {
                let Event::PowerupSpawned { cell, kind } = event else {
                    continue;
                };
                spawned += 1;
                assert_ne!(*cell, query::player(&world), "seed {seed}");
                assert!(!waiting_diamonds.contains(cell), "seed {seed}: {cell:?}");
                assert!(!waiting_powerups.contains(cell), "seed {seed}: {cell:?}");
                assert!(query::powerups(&world)
                    .iter()
                    .any(|powerup| powerup.cell == *cell && powerup.kind == *kind));
            }
        }

        assert!(
            (30..=95).contains(&spawned),
            "{spawned} powerups over {pickups} pickups"
        );
    }

    #[test]
    fn new_powerup_overwrites_active_effect() {
        let mut world = blank_world();
        scaffolding::place_powerup(&mut world, CellCoord::new(0, 8), PowerupKind::Ghost);
        scaffolding::place_powerup(&mut world, CellCoord::new(0, 7), PowerupKind::Speed);
        let _ = step(&mut world, Direction::North);
        let _ = step(&mut world, Direction::North);

        let effect = query::hud(&world).effect.expect("speed effect active");
        assert_eq!(effect.effect, Effect::Speed);
        assert_eq!(effect.remaining_secs(), 5);
    }

    #[test]
    fn reveal_is_instant_and_highlights_lasers() {
        let mut world = blank_world();
        scaffolding::place_powerup(&mut world, CellCoord::new(0, 8), PowerupKind::Ghost);
        scaffolding::place_powerup(&mut world, CellCoord::new(0, 7), PowerupKind::Reveal);
        let _ = step(&mut world, Direction::North);
        let events = step(&mut world, Direction::North);

        assert!(events.contains(&Event::LasersRevealed {
            window: REVEAL_WINDOW
        }));
        assert!(query::hud(&world).effect.is_none());
        assert!(query::lasers_revealed(&world));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: REVEAL_WINDOW,
            },
            &mut events,
        );
        assert!(!query::lasers_revealed(&world));
    }

    #[test]
    fn level_up_fires_once_per_crossing_and_spawns_guard_on_even_levels() {
        let mut world = blank_world();
        let zone = CellCoord::new(0, 8);
        scaffolding::place_multiplier_zone(&mut world, zone);
        scaffolding::place_diamond(&mut world, zone);
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 9,
                laser_hits: 1,
                ..ScoreTally::default()
            },
        );

        let events = step(&mut world, Direction::North);
        let level_ups: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Event::LevelUp { .. }))
            .collect();
        assert_eq!(level_ups, vec![&Event::LevelUp { level: 2 }]);
        assert!(events.contains(&Event::DiamondCollected {
            cell: zone,
            gained: 2,
            combo: 1,
        }));
        assert_eq!(query::guards(&world).len(), 1);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LasersAdded { count } if *count > 0)));

        scaffolding::place_diamond(&mut world, CellCoord::new(0, 7));
        let events = step(&mut world, Direction::North);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::LevelUp { .. })));
    }

    #[test]
    fn odd_level_does_not_spawn_guard() {
        let mut world = blank_world();
        scaffolding::place_diamond(&mut world, CellCoord::new(0, 8));
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 19,
                level: 2,
                laser_hits: 1,
                ..ScoreTally::default()
            },
        );

        let events = step(&mut world, Direction::North);
        assert!(events.contains(&Event::LevelUp { level: 3 }));
        assert!(query::guards(&world).is_empty());
    }

    #[test]
    fn achievements_are_granted_once() {
        let mut world = blank_world();
        for row in (0..GRID_SIZE - 1).rev() {
            scaffolding::place_diamond(&mut world, CellCoord::new(0, row));
        }
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 0,
                combo: 8,
                streak: 8,
                laser_hits: 1,
                ..ScoreTally::default()
            },
        );

        let mut unlocked = Vec::new();
        for _ in 0..4 {
            for event in step(&mut world, Direction::North) {
                if let Event::AchievementUnlocked { achievement, bonus } = event {
                    unlocked.push((achievement, bonus));
                }
            }
        }

        assert_eq!(unlocked, vec![(Achievement::Combo10, 5)]);
        assert!(query::achievements(&world).contains(Achievement::Combo10));
    }

    #[test]
    fn simultaneous_achievements_all_fire() {
        let mut world = blank_world();
        scaffolding::place_diamond(&mut world, CellCoord::new(0, 8));
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 2,
                combo: 9,
                streak: 19,
                ..ScoreTally::default()
            },
        );

        let events = step(&mut world, Direction::North);
        let unlocked: Vec<Achievement> = events
            .iter()
            .filter_map(|event| match event {
                Event::AchievementUnlocked { achievement, .. } => Some(*achievement),
                _ => None,
            })
            .collect();
        assert_eq!(
            unlocked,
            vec![
                Achievement::Combo10,
                Achievement::Streak20,
                Achievement::Perfect10
            ]
        );
        assert_eq!(query::tally(&world).diamonds, 3 + 5 + 10 + 15);
    }

    #[test]
    fn guard_capture_resets_combo_and_streak() {
        let mut world = blank_world();
        scaffolding::place_guard(&mut world, CellCoord::new(1, 8));
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 12,
                combo: 6,
                streak: 6,
                ..ScoreTally::default()
            },
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(33),
            },
            &mut events,
        );
        assert!(events.contains(&Event::GuardCapture {
            cell: PLAYER_START,
            lost: 10,
        }));
        let tally = query::tally(&world);
        assert_eq!(tally.diamonds, 2);
        assert_eq!(tally.combo, 0);
        assert_eq!(tally.streak, 0);
    }

    #[test]
    fn movement_gate_limits_steps() {
        let mut world = blank_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PressDirection {
                direction: Direction::North,
            },
            &mut events,
        );

        for _ in 0..4 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(33),
                },
                &mut events,
            );
        }
        assert_eq!(query::player(&world), PLAYER_START);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(33),
            },
            &mut events,
        );
        assert_eq!(query::player(&world), CellCoord::new(0, 8));
    }

    #[test]
    fn sprinting_moves_drain_energy() {
        let mut world = blank_world();
        let mut events = Vec::new();
        apply(&mut world, Command::SetSprint { held: true }, &mut events);
        apply(
            &mut world,
            Command::PressDirection {
                direction: Direction::East,
            },
            &mut events,
        );
        apply(&mut world, Command::Tick { dt: MOVE_INTERVAL }, &mut events);

        assert!(events.contains(&Event::PlayerMoved {
            from: PLAYER_START,
            to: CellCoord::new(1, 9),
            sprinting: true,
        }));
        assert_eq!(query::hud(&world).sprint_energy, 98);
    }

    #[test]
    fn dash_spends_charges_until_empty() {
        let mut world = blank_world();
        let mut events = Vec::new();
        for _ in 0..5 {
            apply(&mut world, Command::Dash, &mut events);
        }
        assert_eq!(
            events,
            vec![
                Event::DashUsed { remaining: 2 },
                Event::DashUsed { remaining: 1 },
                Event::DashUsed { remaining: 0 },
            ]
        );
    }

    #[test]
    fn clock_expiry_ends_session_exactly_once() {
        let (mut world, _) = started_world(4);
        let mut ended = 0;
        let mut last_remaining = query::remaining(&world);
        for _ in 0..2_000 {
            let mut events = Vec::new();
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(33),
                },
                &mut events,
            );
            let remaining = query::remaining(&world);
            assert!(remaining <= last_remaining);
            last_remaining = remaining;
            ended += events
                .iter()
                .filter(|event| matches!(event, Event::SessionEnded { .. }))
                .count();
        }
        assert_eq!(ended, 1);
        assert_eq!(query::phase(&world), SessionPhase::Ended);
        assert_eq!(query::hud(&world).time_remaining_secs, 0);
    }

    #[test]
    fn end_is_idempotent_and_freezes_input() {
        let mut world = blank_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PressDirection {
                direction: Direction::North,
            },
            &mut events,
        );
        apply(&mut world, Command::EndSession, &mut events);
        apply(&mut world, Command::EndSession, &mut events);
        apply(&mut world, Command::Tick { dt: MOVE_INTERVAL }, &mut events);
        apply(&mut world, Command::Dash, &mut events);

        let ended = events
            .iter()
            .filter(|event| matches!(event, Event::SessionEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(query::player(&world), PLAYER_START);
    }

    #[test]
    fn session_end_reports_settlement() {
        let mut world = blank_world();
        let tally = ScoreTally {
            diamonds: 23,
            combo: 9,
            streak: 12,
            level: 3,
            laser_hits: 0,
        };
        scaffolding::set_tally(&mut world, tally);
        let mut events = Vec::new();
        apply(&mut world, Command::EndSession, &mut events);
        assert_eq!(
            events,
            vec![Event::SessionEnded {
                breakdown: RewardBreakdown::settle(&tally)
            }]
        );
    }

    #[test]
    fn restart_after_end_resets_state() {
        let mut world = blank_world();
        scaffolding::set_tally(
            &mut world,
            ScoreTally {
                diamonds: 40,
                level: 5,
                ..ScoreTally::default()
            },
        );
        let mut events = Vec::new();
        apply(&mut world, Command::EndSession, &mut events);
        apply(&mut world, Command::StartSession { has_kit: false }, &mut events);

        assert_eq!(query::phase(&world), SessionPhase::Active);
        assert_eq!(query::tally(&world), ScoreTally::default());
        assert_eq!(query::diamonds(&world).len(), DIAMOND_COUNT);
    }
}
