#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Diamond Heist session.

use diamond_heist_core::{Command, HudSnapshot};
use diamond_heist_world::{query, World};

/// Inventory lookup answering whether the player owns the master thief kit.
pub trait KitInventory {
    /// Reports whether the kit is owned. Read once per session start.
    fn has_master_kit(&self) -> bool;
}

impl KitInventory for bool {
    fn has_master_kit(&self) -> bool {
        *self
    }
}

/// Everything a host shows before the first tick of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionPrelude<'world> {
    /// Banner greeting the player.
    pub banner: &'world str,
    /// Best total score recorded by earlier sessions.
    pub best_score: u32,
    /// Command that starts the session.
    pub start: Command,
}

/// Produces data required to greet the player and open a session.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Builds the start command from the player's inventory.
    #[must_use]
    pub fn start_command<I>(&self, inventory: &I) -> Command
    where
        I: KitInventory + ?Sized,
    {
        Command::StartSession {
            has_kit: inventory.has_master_kit(),
        }
    }

    /// Gathers the banner, stored best score, and start command in one step.
    #[must_use]
    pub fn prelude<'world, I>(
        &self,
        world: &'world World,
        inventory: &I,
        best_score: u32,
    ) -> SessionPrelude<'world>
    where
        I: KitInventory + ?Sized,
    {
        SessionPrelude {
            banner: self.welcome_banner(world),
            best_score,
            start: self.start_command(inventory),
        }
    }

    /// Exposes the heads-up display values for presentation purposes.
    #[must_use]
    pub fn hud(&self, world: &World) -> HudSnapshot {
        query::hud(world)
    }
}
