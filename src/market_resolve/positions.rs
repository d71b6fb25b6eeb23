use serde::{Deserialize, Serialize};

use super::markets::{Identity, MarketId, Outcome};

// ============================================================================
// STAKE POSITIONS
// ============================================================================

/// Composite key for a position: one per (market, staker)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub market_id: MarketId,
    pub staker: Identity,
}

impl PositionKey {
    pub fn new(market_id: MarketId, staker: Identity) -> Self {
        Self { market_id, staker }
    }
}

/// A staker's accumulated stake on each side of one market
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub option0_stake: u64,
    pub option1_stake: u64,
}

impl StakePosition {
    pub fn stake_on(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Option0 => self.option0_stake,
            Outcome::Option1 => self.option1_stake,
        }
    }

    /// Add to one side, or None if the side would overflow
    pub fn checked_add(&self, outcome: Outcome, amount: u64) -> Option<StakePosition> {
        let mut next = *self;
        match outcome {
            Outcome::Option0 => next.option0_stake = self.option0_stake.checked_add(amount)?,
            Outcome::Option1 => next.option1_stake = self.option1_stake.checked_add(amount)?,
        }
        Some(next)
    }

    /// Zero both sides after a positive payout
    pub fn spend(&mut self) {
        self.option0_stake = 0;
        self.option1_stake = 0;
    }

    pub fn is_spent(&self) -> bool {
        self.option0_stake == 0 && self.option1_stake == 0
    }
}
