// ============================================================================
// Escrow - value transfer capability
// ============================================================================
//
// The market ledger only keeps accounting. Moving value is done by a
// `ValueTransfer` implementation supplied by the host:
//   - escrow: lock a stake out of the staker's available balance
//   - release: pay a claim out to the winner
//   - refund: return an escrowed amount when the ledger rejects a stake
//
// `BalanceBook` is the in-memory implementation the HTTP host uses.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::market_resolve::Identity;

/// Value transfer errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EscrowError {
    #[error("Insufficient balance: {available} < {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Escrow pool cannot cover release of {requested} (holds {held})")]
    PoolExhausted { held: u64, requested: u64 },

    #[error("Balance overflow")]
    Overflow,
}

/// Moves value in and out of escrow on behalf of the ledger
pub trait ValueTransfer {
    /// Take `amount` from `from` into escrow
    fn escrow(&mut self, from: &Identity, amount: u64) -> Result<(), EscrowError>;

    /// Pay `amount` out of escrow to `to`
    fn release(&mut self, to: &Identity, amount: u64) -> Result<(), EscrowError>;

    /// Undo an `escrow` of `amount` for `to`
    fn refund(&mut self, to: &Identity, amount: u64) -> Result<(), EscrowError> {
        self.release(to, amount)
    }
}

// ============================================================================
// BALANCE BOOK
// ============================================================================

/// Account balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Spendable
    pub available: u64,
    /// Total ever escrowed from this account
    pub staked: u64,
    /// Total ever paid out to this account
    pub paid_out: u64,
}

/// In-memory balances plus the escrow pool they stake into
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceBook {
    balances: HashMap<Identity, Balance>,
    /// Value currently held in escrow across all markets
    escrow_held: u64,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit fresh value to an account (faucet / external deposit)
    pub fn deposit(&mut self, to: &Identity, amount: u64) -> Result<u64, EscrowError> {
        let bal = self.balances.entry(to.clone()).or_default();
        bal.available = bal.available.checked_add(amount).ok_or(EscrowError::Overflow)?;
        Ok(bal.available)
    }

    pub fn balance(&self, id: &Identity) -> Balance {
        self.balances.get(id).copied().unwrap_or_default()
    }

    pub fn available(&self, id: &Identity) -> u64 {
        self.balance(id).available
    }

    pub fn escrow_held(&self) -> u64 {
        self.escrow_held
    }
}

impl ValueTransfer for BalanceBook {
    fn escrow(&mut self, from: &Identity, amount: u64) -> Result<(), EscrowError> {
        let available = self.available(from);
        if available < amount {
            return Err(EscrowError::InsufficientBalance { available, required: amount });
        }
        let held = self.escrow_held.checked_add(amount).ok_or(EscrowError::Overflow)?;

        let bal = self.balances.entry(from.clone()).or_default();
        bal.available -= amount;
        bal.staked = bal.staked.saturating_add(amount);
        self.escrow_held = held;
        Ok(())
    }

    fn release(&mut self, to: &Identity, amount: u64) -> Result<(), EscrowError> {
        if self.escrow_held < amount {
            return Err(EscrowError::PoolExhausted { held: self.escrow_held, requested: amount });
        }
        let bal = self.balances.entry(to.clone()).or_default();
        bal.available = bal.available.checked_add(amount).ok_or(EscrowError::Overflow)?;
        bal.paid_out = bal.paid_out.saturating_add(amount);
        self.escrow_held -= amount;
        Ok(())
    }

    fn refund(&mut self, to: &Identity, amount: u64) -> Result<(), EscrowError> {
        if self.escrow_held < amount {
            return Err(EscrowError::PoolExhausted { held: self.escrow_held, requested: amount });
        }
        let bal = self.balances.entry(to.clone()).or_default();
        bal.available = bal.available.checked_add(amount).ok_or(EscrowError::Overflow)?;
        bal.staked = bal.staked.saturating_sub(amount);
        self.escrow_held -= amount;
        Ok(())
    }
}
