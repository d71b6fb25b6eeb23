// ============================================================================
// Payout Arithmetic
// ============================================================================
//
// Winners split the entire pool (both sides) in proportion to their share
// of the winning side:
//
//   payout = floor(winning_stake * total_pool / winning_pool)
//
// Flooring means the sum of all payouts never exceeds the pool; at most
// winning_pool - 1 units are left behind as rounding dust.
//
// A winning pool of zero means nobody backed the winner. The caller's own
// stake is part of that pool, so it is zero too and the payout is defined
// as zero.
//
// ============================================================================

/// Proportional share of `total_pool` for `winning_stake` out of `winning_pool`
pub fn proportional_payout(winning_stake: u64, total_pool: u64, winning_pool: u64) -> u64 {
    if winning_pool == 0 || winning_stake == 0 {
        return 0;
    }

    let share = (winning_stake as u128 * total_pool as u128) / winning_pool as u128;

    // winning_stake <= winning_pool for any consistent ledger, so share <= total_pool
    u64::try_from(share).unwrap_or(total_pool)
}
