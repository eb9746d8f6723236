#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Diamond Heist sessions headlessly.

mod best_score;
mod config;
mod headless;
mod replay_code;
mod session;

use std::io;

use anyhow::Result;
use clap::Parser;
use diamond_heist_rendering::{Presentation, RenderingBackend};
use diamond_heist_system_autopilot::Autopilot;
use diamond_heist_system_payout::InMemoryLedger;
use diamond_heist_world::Config;

use crate::{
    best_score::JsonBestScoreFile,
    config::{Args, FileConfig, Settings},
    headless::HeadlessBackend,
    session::{HeistSession, Pilot},
};

/// Entry point for the Diamond Heist command-line interface.
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(args, file, rand::random())?;
    log::info!(
        "starting heist: seed={} kit={} frames={} replay={}",
        settings.seed,
        settings.has_kit,
        settings.frames,
        settings.replay.is_some()
    );

    let (pilot, script) = match settings.replay {
        Some(code) => (Pilot::Scripted, code.inputs),
        None => (Pilot::Autopilot(Autopilot::default()), Vec::new()),
    };

    let mut session = HeistSession::start(
        Config::new(settings.seed, settings.session_length),
        settings.has_kit,
        pilot,
        InMemoryLedger::with_balance(settings.starting_balance),
        JsonBestScoreFile::new(settings.best_score_file),
    );
    let presentation = Presentation::new(
        format!("Diamond Heist (seed {})", settings.seed),
        session.scene(),
    );
    let backend = HeadlessBackend::new(io::stdout(), settings.frames, settings.render_every, script);

    backend.run(presentation, move |dt, input, scene| {
        scene.feedback = session.advance(dt, input);
        session.describe(scene);
    })
}
