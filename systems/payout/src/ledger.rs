//! In-memory currency ledger.

use crate::{PayoutError, RewardLedger};

/// Largest amount a single award may carry.
pub const MAX_AWARD: u32 = 30;

/// Single credit recorded by the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Amount credited.
    pub amount: u32,
    /// Human readable reason.
    pub description: String,
}

/// Ledger that keeps the balance and history in memory.
///
/// Awards of zero or above [`MAX_AWARD`] are rejected.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    balance: u32,
    entries: Vec<LedgerEntry>,
}

impl InMemoryLedger {
    /// Creates a ledger with an opening balance.
    #[must_use]
    pub const fn with_balance(balance: u32) -> Self {
        Self {
            balance,
            entries: Vec::new(),
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.balance
    }

    /// Credits recorded so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }
}

impl RewardLedger for InMemoryLedger {
    fn award(&mut self, amount: u32) -> Result<u32, PayoutError> {
        if amount == 0 || amount > MAX_AWARD {
            return Err(PayoutError::AwardOutOfRange {
                amount,
                max: MAX_AWARD,
            });
        }

        self.balance = self.balance.saturating_add(amount);
        self.entries.push(LedgerEntry {
            amount,
            description: format!("Heist reward: {amount}"),
        });
        Ok(self.balance)
    }
}
