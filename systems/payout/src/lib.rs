#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Settlement system that pays out finished heist sessions.
//!
//! The payout system listens for [`Event::SessionEnded`], credits the reward to
//! a [`RewardLedger`] and records new personal bests in a [`BestScoreStore`].
//! Both collaborators may fail; failures are reported as [`PayoutEvent`]s and
//! never feed back into the world.

mod ledger;

use diamond_heist_core::{Event, RewardBreakdown};
use thiserror::Error;

pub use ledger::{InMemoryLedger, LedgerEntry, MAX_AWARD};

/// Errors reported by payout collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayoutError {
    /// The ledger refused the award amount.
    #[error("award of {amount} rejected: must be between 1 and {max}")]
    AwardOutOfRange {
        /// Amount that was offered.
        amount: u32,
        /// Largest amount accepted per award.
        max: u32,
    },
    /// The ledger backend could not record the award.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),
    /// The best-score store could not be read or written.
    #[error("best score store failed: {0}")]
    Store(String),
}

/// Currency ledger that receives session rewards.
pub trait RewardLedger {
    /// Credits `amount` and returns the balance after the credit.
    fn award(&mut self, amount: u32) -> Result<u32, PayoutError>;
}

/// Persistent storage for the best total score.
pub trait BestScoreStore {
    /// Reads the stored best score, zero when nothing was stored yet.
    fn load(&self) -> Result<u32, PayoutError>;

    /// Overwrites the stored best score.
    fn save(&mut self, score: u32) -> Result<(), PayoutError>;
}

/// Notifications produced while settling a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayoutEvent {
    /// The reward was credited.
    RewardCredited {
        /// Amount credited.
        amount: u32,
        /// Ledger balance after the credit.
        balance: u32,
    },
    /// The ledger rejected the reward. The session result stands.
    RewardFailed {
        /// Amount that could not be credited.
        amount: u32,
        /// Failure reported by the ledger.
        error: PayoutError,
    },
    /// The session beat the stored best score.
    NewBestScore {
        /// New best total.
        score: u32,
        /// Best total before this session.
        previous: u32,
    },
    /// The new best score could not be persisted.
    BestScoreNotSaved {
        /// Failure reported by the store.
        error: PayoutError,
    },
}

/// Pure system that settles finished sessions against external collaborators.
#[derive(Debug, Default)]
pub struct Payout {
    best_score: u32,
}

impl Payout {
    /// Creates a payout system primed with the stored best score.
    ///
    /// A store that cannot be read is treated as holding no best score.
    pub fn from_store<S>(store: &S) -> Self
    where
        S: BestScoreStore + ?Sized,
    {
        let best_score = store.load().unwrap_or_else(|error| {
            log::warn!("could not read best score: {error}");
            0
        });
        Self { best_score }
    }

    /// Creates a payout system with a known best score.
    #[must_use]
    pub const fn with_best_score(best_score: u32) -> Self {
        Self { best_score }
    }

    /// Best total score known to the system.
    #[must_use]
    pub const fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Consumes world events and settles every finished session among them.
    pub fn handle<L, S>(
        &mut self,
        events: &[Event],
        ledger: &mut L,
        store: &mut S,
        out: &mut Vec<PayoutEvent>,
    ) where
        L: RewardLedger + ?Sized,
        S: BestScoreStore + ?Sized,
    {
        for event in events {
            if let Event::SessionEnded { breakdown } = event {
                self.settle(breakdown, ledger, store, out);
            }
        }
    }

    fn settle<L, S>(
        &mut self,
        breakdown: &RewardBreakdown,
        ledger: &mut L,
        store: &mut S,
        out: &mut Vec<PayoutEvent>,
    ) where
        L: RewardLedger + ?Sized,
        S: BestScoreStore + ?Sized,
    {
        let amount = breakdown.reward;
        if amount > 0 {
            match ledger.award(amount) {
                Ok(balance) => out.push(PayoutEvent::RewardCredited { amount, balance }),
                Err(error) => {
                    log::warn!("heist reward of {amount} was not credited: {error}");
                    out.push(PayoutEvent::RewardFailed { amount, error });
                }
            }
        }

        if breakdown.total > self.best_score {
            let previous = self.best_score;
            self.best_score = breakdown.total;
            out.push(PayoutEvent::NewBestScore {
                score: breakdown.total,
                previous,
            });
            if let Err(error) = store.save(breakdown.total) {
                log::warn!("best score {} was not saved: {error}", breakdown.total);
                out.push(PayoutEvent::BestScoreNotSaved { error });
            }
        }
    }
}
