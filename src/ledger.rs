//! Market Ledger - settlement and escrow state machine
//!
//! Owns every market and stake position and enforces all lifecycle rules:
//! - create: allocate the next market id
//! - stake: accumulate value on one outcome before the deadline
//! - resolve: creator picks the winner at or after the deadline, once
//! - claim: winners take a proportional share of the whole pool
//!
//! Every operation validates fully before it mutates anything, so a
//! returned error never leaves partial state. The ledger itself is not
//! synchronized; hosts serialize access (see `app_state::SharedState`).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::errors::{LedgerError, LedgerResult};
use crate::market_resolve::{
    proportional_payout, Identity, Market, MarketId, Outcome, PositionKey, StakePosition,
};

// ============================================================================
// SNAPSHOT
// ============================================================================

/// A persisted position together with its key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub market_id: MarketId,
    pub staker: Identity,
    #[serde(flatten)]
    pub position: StakePosition,
}

/// Serializable copy of the full ledger state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Highest id handed out so far (0 when no market exists)
    pub last_market_id: u64,
    pub markets: Vec<Market>,
    pub positions: Vec<PositionRecord>,
}

/// Aggregate numbers for status endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_markets: usize,
    pub open_markets: usize,
    pub resolved_markets: usize,
    pub total_positions: usize,
    pub total_staked: u128,
}

// ============================================================================
// LEDGER
// ============================================================================

pub struct MarketLedger {
    markets: BTreeMap<MarketId, Market>,
    positions: HashMap<PositionKey, StakePosition>,
    last_market_id: u64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MarketLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketLedger")
            .field("markets", &self.markets.len())
            .field("positions", &self.positions.len())
            .field("last_market_id", &self.last_market_id)
            .field("now", &self.clock.now())
            .finish()
    }
}

impl MarketLedger {
    /// Empty ledger reading deadlines against `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            markets: BTreeMap::new(),
            positions: HashMap::new(),
            last_market_id: 0,
            clock,
        }
    }

    /// Rebuild a ledger from a snapshot
    pub fn restore(state: LedgerState, clock: Arc<dyn Clock>) -> Self {
        let highest_market = state.markets.iter().map(|m| m.id.0).max().unwrap_or(0);
        let markets = state.markets.into_iter().map(|m| (m.id, m)).collect();
        let positions = state
            .positions
            .into_iter()
            .map(|r| (PositionKey::new(r.market_id, r.staker), r.position))
            .collect();

        Self {
            markets,
            positions,
            last_market_id: state.last_market_id.max(highest_market),
            clock,
        }
    }

    /// Copy the state out for persistence
    pub fn snapshot(&self) -> LedgerState {
        let mut positions: Vec<PositionRecord> = self
            .positions
            .iter()
            .map(|(key, position)| PositionRecord {
                market_id: key.market_id,
                staker: key.staker.clone(),
                position: *position,
            })
            .collect();
        positions.sort_by(|a, b| (a.market_id, &a.staker).cmp(&(b.market_id, &b.staker)));

        LedgerState {
            last_market_id: self.last_market_id,
            markets: self.markets.values().cloned().collect(),
            positions,
        }
    }

    /// Current clock value as seen by the ledger
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Create a market and return its id. Always succeeds.
    pub fn create(
        &mut self,
        caller: &Identity,
        description: impl Into<String>,
        options: [String; 2],
        deadline: u64,
    ) -> MarketId {
        let id = MarketId(self.last_market_id).next();
        let market = Market::new(
            id,
            caller.clone(),
            description.into(),
            options,
            deadline,
            self.clock.now(),
        );

        self.markets.insert(id, market);
        self.last_market_id = id.0;

        info!(market_id = %id, creator = %caller, deadline, "market created");
        id
    }

    /// Stake `amount` on `option` (0 or 1)
    ///
    /// Checks, in order: market exists, clock is before the deadline, option is valid.
    pub fn stake(
        &mut self,
        caller: &Identity,
        market_id: MarketId,
        option: u64,
        amount: u64,
    ) -> LedgerResult<()> {
        let now = self.clock.now();
        let market = self.markets.get_mut(&market_id).ok_or(LedgerError::NotFound)?;

        if !market.accepts_stakes(now) {
            return Err(LedgerError::DeadlinePassed);
        }

        let outcome = Outcome::from_index(option)?;

        let key = PositionKey::new(market_id, caller.clone());
        let position = self.positions.get(&key).copied().unwrap_or_default();

        let next_position = position
            .checked_add(outcome, amount)
            .ok_or(LedgerError::Overflow)?;
        let next_total = market
            .total_stake
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let next_side = market.outcome_totals[outcome.index()]
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        market.total_stake = next_total;
        market.outcome_totals[outcome.index()] = next_side;
        self.positions.insert(key, next_position);

        info!(
            market_id = %market_id,
            staker = %caller,
            option = outcome.index(),
            amount,
            total_stake = next_total,
            "stake placed"
        );
        Ok(())
    }

    /// Resolve a market to `winning_option` (0 or 1)
    ///
    /// Checks, in order: market exists, caller is the creator, clock has
    /// reached the deadline, market is unresolved, option is valid.
    pub fn resolve(
        &mut self,
        caller: &Identity,
        market_id: MarketId,
        winning_option: u64,
    ) -> LedgerResult<()> {
        let now = self.clock.now();
        let market = self.markets.get_mut(&market_id).ok_or(LedgerError::NotFound)?;

        if &market.creator != caller {
            return Err(LedgerError::Unauthorized);
        }
        if !market.can_resolve_at(now) {
            return Err(LedgerError::InvalidTiming);
        }
        if market.resolved {
            return Err(LedgerError::AlreadyResolved);
        }
        let winner = Outcome::from_index(winning_option)?;

        market.resolved = true;
        market.winning_option = Some(winner);

        info!(
            market_id = %market_id,
            winning_option = winner.index(),
            winning_pool = market.pool(winner),
            total_stake = market.total_stake,
            "market resolved"
        );
        Ok(())
    }

    /// Claim winnings on a resolved market, returning the payout
    ///
    /// Checks, in order: market exists, market is resolved, caller has a
    /// position (`NotFound` otherwise). A positive payout spends the
    /// position; a zero payout leaves it untouched and may be repeated.
    pub fn claim(&mut self, caller: &Identity, market_id: MarketId) -> LedgerResult<u64> {
        let market = self.markets.get(&market_id).ok_or(LedgerError::NotFound)?;

        let winner = match (market.resolved, market.winning_option) {
            (true, Some(winner)) => winner,
            _ => return Err(LedgerError::NotResolved),
        };

        let key = PositionKey::new(market_id, caller.clone());
        let position = self.positions.get_mut(&key).ok_or(LedgerError::NotFound)?;

        let winning_stake = position.stake_on(winner);
        // W is the stake-time side total, not a live sum over positions: spent
        // positions would shrink a live sum and overpay later winners
        let payout = proportional_payout(winning_stake, market.total_stake, market.pool(winner));

        if payout > 0 {
            position.spend();
            info!(market_id = %market_id, staker = %caller, payout, "winnings claimed");
        } else {
            debug!(market_id = %market_id, staker = %caller, "claim with nothing to pay");
        }

        Ok(payout)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get_market(&self, market_id: MarketId) -> Option<&Market> {
        self.markets.get(&market_id)
    }

    pub fn get_position(&self, market_id: MarketId, staker: &Identity) -> Option<&StakePosition> {
        self.positions.get(&PositionKey::new(market_id, staker.clone()))
    }

    /// All markets in id order
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    /// Positions on one market, ordered by staker
    pub fn positions_for(&self, market_id: MarketId) -> Vec<(&Identity, &StakePosition)> {
        let mut out: Vec<_> = self
            .positions
            .iter()
            .filter(|(key, _)| key.market_id == market_id)
            .map(|(key, pos)| (&key.staker, pos))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Winning-side total for a resolved market
    pub fn winning_pool(&self, market_id: MarketId) -> Option<u64> {
        self.markets.get(&market_id).and_then(|m| m.winning_pool())
    }

    /// Payout a claim would return right now, without claiming
    pub fn preview_claim(&self, caller: &Identity, market_id: MarketId) -> LedgerResult<u64> {
        let market = self.markets.get(&market_id).ok_or(LedgerError::NotFound)?;
        let winner = market.winning_option.ok_or(LedgerError::NotResolved)?;
        let position = self
            .get_position(market_id, caller)
            .ok_or(LedgerError::NotFound)?;
        Ok(proportional_payout(
            position.stake_on(winner),
            market.total_stake,
            market.pool(winner),
        ))
    }

    pub fn stats(&self) -> LedgerStats {
        let resolved = self.markets.values().filter(|m| m.resolved).count();
        LedgerStats {
            total_markets: self.markets.len(),
            open_markets: self.markets.len() - resolved,
            resolved_markets: resolved,
            total_positions: self.positions.len(),
            total_staked: self.markets.values().map(|m| m.total_stake as u128).sum(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
