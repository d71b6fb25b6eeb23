//! Clock source for market deadlines
//!
//! The ledger never keeps time itself; it reads the current value of an
//! external monotonic counter (block height) at validation time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read-only view of the current clock value
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Block height counter shared between the host ticker and the ledger
///
/// Clones share the same counter. The height only moves forward.
#[derive(Debug, Clone)]
pub struct BlockClock {
    height: Arc<AtomicU64>,
}

impl BlockClock {
    /// Start at the given height
    pub fn starting_at(height: u64) -> Self {
        Self { height: Arc::new(AtomicU64::new(height)) }
    }

    /// Advance by one block, returning the new height
    pub fn tick(&self) -> u64 {
        self.advance(1)
    }

    /// Advance by `blocks`, returning the new height
    pub fn advance(&self, blocks: u64) -> u64 {
        let prev = self
            .height
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| Some(h.saturating_add(blocks)))
            .unwrap_or_else(|h| h);
        prev.saturating_add(blocks)
    }

    /// Move to `height` if it is ahead of the current value; never moves back
    pub fn set_at_least(&self, height: u64) -> u64 {
        self.height.fetch_max(height, Ordering::SeqCst).max(height)
    }
}

impl Default for BlockClock {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl Clock for BlockClock {
    fn now(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }
}
