// Application state management
//
// All ledger access goes through one `Mutex<AppState>`, so every
// create/stake/resolve/claim runs to completion before the next starts.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::clock::{BlockClock, Clock};
use crate::config::Config;
use crate::escrow::{BalanceBook, ValueTransfer};
use crate::ledger::{LedgerState, MarketLedger};
use crate::market_resolve::{Identity, MarketId};
use crate::models::ApiError;

pub type SharedState = Arc<Mutex<AppState>>;

/// Entries kept in the activity log
pub const ACTIVITY_LOG_CAP: usize = 1000;

pub struct AppState {
    pub ledger: MarketLedger,
    pub balances: BalanceBook,
    pub clock: BlockClock,
    pub activity: Vec<String>,
    pub config: Config,
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    block_height: u64,
    ledger: LedgerState,
    balances: BalanceBook,
}

impl AppState {
    /// Fresh state, or the persisted one when persistence is enabled and a file exists
    pub fn new(config: Config) -> Self {
        let clock = BlockClock::default();
        let mut state = Self {
            ledger: MarketLedger::new(Arc::new(clock.clone())),
            balances: BalanceBook::new(),
            clock,
            activity: Vec::new(),
            config,
        };

        if state.config.persist {
            match state.load_from_disk() {
                Ok(()) => info!(
                    path = %state.config.state_path.display(),
                    markets = state.ledger.stats().total_markets,
                    height = state.clock.now(),
                    "loaded persisted ledger state"
                ),
                Err(e) => info!("starting with an empty ledger ({})", e),
            }
        }

        state
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    // ========================================================================
    // SETTLEMENT WITH VALUE TRANSFER
    // ========================================================================

    /// Escrow `amount` from the caller, then record the stake
    ///
    /// If the ledger rejects the stake the escrow is refunded before returning.
    pub fn stake_with_escrow(
        &mut self,
        caller: &Identity,
        market_id: MarketId,
        option: u64,
        amount: u64,
    ) -> Result<(), ApiError> {
        self.balances.escrow(caller, amount)?;

        if let Err(e) = self.ledger.stake(caller, market_id, option, amount) {
            self.balances.refund(caller, amount)?;
            return Err(e.into());
        }

        self.log_activity(
            "STAKE",
            &format!("{} staked {} on option {} in market {}", caller, amount, option, market_id),
        );
        Ok(())
    }

    /// Pay any positive payout out of escrow, then spend the position
    ///
    /// The release runs before the ledger claim, so a failed payout leaves
    /// the position intact and the claim can be retried.
    pub fn claim_with_payout(&mut self, caller: &Identity, market_id: MarketId) -> Result<u64, ApiError> {
        let payout = self.ledger.preview_claim(caller, market_id)?;
        if payout > 0 {
            self.balances.release(caller, payout)?;
        }

        let claimed = self.ledger.claim(caller, market_id)?;
        if claimed != payout {
            return Err(ApiError::Internal(format!(
                "claim paid {} after releasing {}",
                claimed, payout
            )));
        }

        if payout > 0 {
            self.log_activity("CLAIM", &format!("{} claimed {} from market {}", caller, payout, market_id));
        }
        Ok(payout)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn save_to_disk(&self) -> Result<(), String> {
        let path = &self.config.state_path;
        let state = PersistedState {
            block_height: self.clock.now(),
            ledger: self.ledger.snapshot(),
            balances: self.balances.clone(),
        };

        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| format!("Failed to serialize state: {}", e))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }
        fs::write(path, json).map_err(|e| format!("Failed to write state file: {}", e))?;

        info!(path = %path.display(), "ledger state saved");
        Ok(())
    }

    fn load_from_disk(&mut self) -> Result<(), String> {
        let state = read_persisted(&self.config.state_path)?;

        self.clock.set_at_least(state.block_height);
        self.ledger = MarketLedger::restore(state.ledger, Arc::new(self.clock.clone()));
        self.balances = state.balances;
        Ok(())
    }

    // ========================================================================
    // ACTIVITY LOG
    // ========================================================================

    pub fn log_activity(&mut self, action: &str, details: &str) {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let entry = format!("[{}] #{} {} | {}", timestamp, self.clock.now(), action, details);
        info!(target: "activity", "{}", entry);

        self.activity.push(entry);
        if self.activity.len() > ACTIVITY_LOG_CAP {
            let excess = self.activity.len() - ACTIVITY_LOG_CAP;
            self.activity.drain(..excess);
        }
    }
}

fn read_persisted(path: &Path) -> Result<PersistedState, String> {
    let json = fs::read_to_string(path).map_err(|_| "No state file found".to_string())?;
    serde_json::from_str(&json).map_err(|e| {
        warn!(path = %path.display(), "state file is unreadable");
        format!("Failed to deserialize state: {}", e)
    })
}
