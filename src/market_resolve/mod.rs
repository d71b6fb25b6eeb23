// ============================================================================
// Market Resolve Module - Binary Market Records & Settlement Math
// ============================================================================
//
// This module contains the data the ledger settles over:
//   - markets: Market records, ids, identities, outcomes
//   - positions: Per-(market, staker) stake positions
//   - payout: Proportional payout arithmetic used at claim time
//
// ============================================================================

pub mod markets;
pub mod payout;
pub mod positions;

pub use markets::*;
pub use payout::*;
pub use positions::*;
