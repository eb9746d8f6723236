//! Host loop gluing the world, its systems, and the rendering scene together.

use std::time::Duration;

use diamond_heist_core::{Command, Event};
use diamond_heist_rendering::{feedback, FrameInput, Scene};
use diamond_heist_system_autopilot::Autopilot;
use diamond_heist_system_bootstrap::Bootstrap;
use diamond_heist_system_payout::{BestScoreStore, InMemoryLedger, Payout, PayoutEvent};
use diamond_heist_world::{self as world, query, Config, World};

use crate::replay_code::{InputAction, ReplayCode, ScriptedInput};

/// Source of the inputs applied after each tick.
#[derive(Debug)]
pub(crate) enum Pilot {
    /// The autopilot steers; adapter input is applied as well.
    Autopilot(Autopilot),
    /// Only adapter input is applied.
    Scripted,
}

/// A single heist session driven one frame at a time.
#[derive(Debug)]
pub(crate) struct HeistSession<S> {
    world: World,
    pilot: Pilot,
    payout: Payout,
    ledger: InMemoryLedger,
    store: S,
    seed: u64,
    has_kit: bool,
    frame: u64,
    recorded: Vec<ScriptedInput>,
    opening: Vec<String>,
}

impl<S> HeistSession<S>
where
    S: BestScoreStore,
{
    /// Creates the world and starts the session immediately.
    pub(crate) fn start(
        config: Config,
        has_kit: bool,
        pilot: Pilot,
        ledger: InMemoryLedger,
        store: S,
    ) -> Self {
        let mut world = World::with_config(config);
        let payout = Payout::from_store(&store);
        let prelude = Bootstrap.prelude(&world, &has_kit, payout.best_score());
        let start = prelude.start;
        let mut opening = vec![
            prelude.banner.to_owned(),
            format!("Best heist: {}", prelude.best_score),
        ];

        let mut events = Vec::new();
        world::apply(&mut world, start, &mut events);
        opening.extend(events.iter().filter_map(feedback));

        let mut session = Self {
            world,
            pilot,
            payout,
            ledger,
            store,
            seed: config.rng_seed(),
            has_kit,
            frame: 0,
            recorded: Vec::new(),
            opening,
        };
        session.steer(&events, &mut Vec::new());
        session
    }

    /// Advances the session by one frame and returns feedback for the frame.
    pub(crate) fn advance(&mut self, dt: Duration, input: FrameInput) -> Vec<String> {
        let mut lines = std::mem::take(&mut self.opening);
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let mut actions: Vec<InputAction> = input
            .released
            .iter()
            .map(|direction| InputAction::Release(*direction))
            .chain(input.pressed.iter().map(|direction| InputAction::Press(*direction)))
            .collect();
        actions.extend(input.sprint.map(InputAction::Sprint));
        if input.dash {
            actions.push(InputAction::Dash);
        }
        if input.end_session {
            actions.push(InputAction::End);
        }
        for action in actions {
            self.perform(action, &mut events);
        }

        let mut steered = Vec::new();
        self.steer(&events, &mut steered);
        events.extend(steered);

        lines.extend(events.iter().filter_map(feedback));
        self.settle(&events, &mut lines);
        self.frame += 1;
        lines
    }

    /// Copies the world state into the scene.
    pub(crate) fn describe(&self, scene: &mut Scene) {
        scene.player = query::player(&self.world);
        scene.diamonds = query::diamonds(&self.world);
        scene.traps = query::traps(&self.world).to_vec();
        scene.multiplier_zones = query::multiplier_zones(&self.world).to_vec();
        scene.powerups = query::powerups(&self.world);
        scene.guards = query::guards(&self.world);
        scene.lasers = query::lasers(&self.world);
        scene.lasers_revealed = query::lasers_revealed(&self.world);
        scene.hud = query::hud(&self.world);
    }

    /// Builds a fresh scene for the current world state.
    pub(crate) fn scene(&self) -> Scene {
        let mut scene = Scene::new(query::player(&self.world), query::hud(&self.world));
        self.describe(&mut scene);
        scene
    }

    /// Replay code reproducing every input applied so far.
    pub(crate) fn replay_code(&self) -> ReplayCode {
        ReplayCode {
            seed: self.seed,
            has_kit: self.has_kit,
            inputs: self.recorded.clone(),
        }
    }

    fn perform(&mut self, action: InputAction, events: &mut Vec<Event>) {
        let command = match action {
            InputAction::Press(direction) => Command::PressDirection { direction },
            InputAction::Release(direction) => Command::ReleaseDirection { direction },
            InputAction::Sprint(held) => Command::SetSprint { held },
            InputAction::Dash => Command::Dash,
            InputAction::End => Command::EndSession,
        };
        self.recorded.push(ScriptedInput {
            frame: self.frame,
            action,
        });
        world::apply(&mut self.world, command, events);
    }

    fn steer(&mut self, events: &[Event], out_events: &mut Vec<Event>) {
        let Pilot::Autopilot(autopilot) = &mut self.pilot else {
            return;
        };

        let lasers = query::lasers(&self.world);
        let traps = query::traps(&self.world);
        let guards = query::guards(&self.world);
        let mut commands = Vec::new();
        autopilot.handle(
            events,
            query::player(&self.world),
            &query::diamonds(&self.world),
            |cell| {
                traps.contains(&cell)
                    || guards.contains(&cell)
                    || lasers.iter().any(|laser| laser.covers(cell))
            },
            &mut commands,
        );

        for command in commands {
            let action = match command {
                Command::PressDirection { direction } => InputAction::Press(direction),
                Command::ReleaseDirection { direction } => InputAction::Release(direction),
                _ => continue,
            };
            self.perform(action, out_events);
        }
    }

    fn settle(&mut self, events: &[Event], lines: &mut Vec<String>) {
        let mut notices = Vec::new();
        self.payout
            .handle(events, &mut self.ledger, &mut self.store, &mut notices);
        lines.extend(notices.iter().map(describe_payout));

        for event in events {
            if matches!(event, Event::SessionEnded { .. }) {
                match self.replay_code().encode() {
                    Ok(code) => lines.push(format!("Replay code: {code}")),
                    Err(error) => log::warn!("could not encode replay code: {error}"),
                }
            }
        }
    }
}

fn describe_payout(notice: &PayoutEvent) -> String {
    match notice {
        PayoutEvent::RewardCredited { amount, balance } => {
            format!("Heist successful! Earned {amount} Red Diamonds (balance {balance})")
        }
        PayoutEvent::RewardFailed { amount, error } => {
            format!("Reward of {amount} could not be credited: {error}")
        }
        PayoutEvent::NewBestScore { score, .. } => format!("New Best Heist: {score}!"),
        PayoutEvent::BestScoreNotSaved { error } => format!("Best score not saved: {error}"),
    }
}
