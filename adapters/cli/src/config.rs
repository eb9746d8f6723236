//! Command-line arguments layered over an optional TOML configuration file.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::replay_code::ReplayCode;

const DEFAULT_SESSION_SECS: u64 = 60;
const DEFAULT_RENDER_EVERY: u64 = 30;
const DEFAULT_BEST_SCORE_FILE: &str = "heist-best.json";
/// Frames simulated per second of session time.
pub(crate) const FRAMES_PER_SECOND: u64 = 30;

/// Runs a headless Diamond Heist session.
#[derive(Debug, Parser)]
#[command(name = "diamond-heist", version, about)]
pub(crate) struct Args {
    /// TOML file providing defaults for every other option.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Seed for the session's random placements.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Start with the master thief kit (five dashes instead of three).
    #[arg(long)]
    pub(crate) kit: bool,
    /// JSON file holding the best score across sessions.
    #[arg(long)]
    pub(crate) best_score_file: Option<PathBuf>,
    /// Replay code produced by an earlier session.
    #[arg(long)]
    pub(crate) replay: Option<String>,
    /// Number of frames to simulate at 30 frames per second.
    #[arg(long)]
    pub(crate) frames: Option<u64>,
}

/// Options read from the configuration file. Every field is optional.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) seed: Option<u64>,
    pub(crate) has_kit: Option<bool>,
    pub(crate) session_secs: Option<u64>,
    pub(crate) frames: Option<u64>,
    pub(crate) render_every: Option<u64>,
    pub(crate) best_score_file: Option<PathBuf>,
    pub(crate) starting_balance: Option<u32>,
}

impl FileConfig {
    /// Reads and parses the configuration file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid config toml")
    }
}

/// Fully resolved run settings.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) seed: u64,
    pub(crate) has_kit: bool,
    pub(crate) session_length: Duration,
    pub(crate) frames: u64,
    pub(crate) render_every: u64,
    pub(crate) best_score_file: PathBuf,
    pub(crate) starting_balance: u32,
    pub(crate) replay: Option<ReplayCode>,
}

impl Settings {
    /// Merges flags over the file configuration.
    ///
    /// A replay code pins the seed and kit flag. `fallback_seed` is used when
    /// neither the flags nor the file provide one.
    pub(crate) fn resolve(args: Args, file: FileConfig, fallback_seed: u64) -> Result<Self> {
        let session_secs = file.session_secs.unwrap_or(DEFAULT_SESSION_SECS);
        if session_secs == 0 {
            bail!("session_secs must be positive");
        }
        let render_every = file.render_every.unwrap_or(DEFAULT_RENDER_EVERY);
        if render_every == 0 {
            bail!("render_every must be positive");
        }

        let replay = args
            .replay
            .as_deref()
            .map(ReplayCode::decode)
            .transpose()
            .context("invalid replay code")?;

        let (seed, has_kit) = match &replay {
            Some(code) => {
                if args.seed.is_some_and(|seed| seed != code.seed) {
                    log::warn!("--seed ignored: replay code pins seed {}", code.seed);
                }
                (code.seed, code.has_kit)
            }
            None => (
                args.seed.or(file.seed).unwrap_or(fallback_seed),
                args.kit || file.has_kit.unwrap_or(false),
            ),
        };

        Ok(Self {
            seed,
            has_kit,
            session_length: Duration::from_secs(session_secs),
            frames: args
                .frames
                .or(file.frames)
                .unwrap_or((session_secs + 1) * FRAMES_PER_SECOND),
            render_every,
            best_score_file: args
                .best_score_file
                .or(file.best_score_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BEST_SCORE_FILE)),
            starting_balance: file.starting_balance.unwrap_or(0),
            replay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["diamond-heist"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_fill_every_gap() {
        let settings = Settings::resolve(args(&[]), FileConfig::default(), 99).expect("resolves");
        assert_eq!(settings.seed, 99);
        assert!(!settings.has_kit);
        assert_eq!(settings.session_length, Duration::from_secs(60));
        assert_eq!(settings.frames, 61 * 30);
        assert_eq!(settings.best_score_file, PathBuf::from("heist-best.json"));
        assert!(settings.replay.is_none());
    }

    #[test]
    fn flags_override_file_values() {
        let file = FileConfig::parse(
            "seed = 5\nhas_kit = false\nsession_secs = 30\nframes = 100\nstarting_balance = 12\n",
        )
        .expect("valid toml");
        let settings =
            Settings::resolve(args(&["--seed", "8", "--kit"]), file, 0).expect("resolves");

        assert_eq!(settings.seed, 8);
        assert!(settings.has_kit);
        assert_eq!(settings.session_length, Duration::from_secs(30));
        assert_eq!(settings.frames, 100);
        assert_eq!(settings.starting_balance, 12);
    }

    #[test]
    fn replay_code_pins_seed_and_kit() {
        let code = ReplayCode {
            seed: 77,
            has_kit: true,
            inputs: Vec::new(),
        }
        .encode()
        .expect("encodes");
        let settings = Settings::resolve(
            args(&["--seed", "3", "--replay", code.as_str()]),
            FileConfig::default(),
            0,
        )
        .expect("resolves");

        assert_eq!(settings.seed, 77);
        assert!(settings.has_kit);
        assert!(settings.replay.is_some());
    }

    #[test]
    fn rejects_unknown_keys_and_zero_lengths() {
        assert!(FileConfig::parse("colour = \"red\"").is_err());

        let file = FileConfig {
            session_secs: Some(0),
            ..FileConfig::default()
        };
        assert!(Settings::resolve(args(&[]), file, 0).is_err());
        assert!(Settings::resolve(args(&["--replay", "nope"]), FileConfig::default(), 0).is_err());
    }
}
