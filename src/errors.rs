// ============================================================================
// Ledger Errors - Binary Market Ledger
// ============================================================================
//
// Every precondition failure in the ledger is returned as one of these kinds.
// Validation always runs to completion before any mutation, so an error never
// leaves partial state behind.
//
// Codes mirror the settlement contract's error constants (101..=107) so that
// consumers keyed on numeric codes keep working.
//
// ============================================================================

use serde::{Deserialize, Serialize};

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Settlement errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LedgerError {
    /// Market does not exist, or (in `claim`) the caller has no position on it.
    ///
    /// The two cases share one kind; consumers may rely on that, so it is not split.
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized: caller is not the market creator")]
    Unauthorized,

    #[error("Market already resolved")]
    AlreadyResolved,

    /// Option index other than 0 or 1 (stake, resolve, or a non-binary option list).
    #[error("Invalid option: must be 0 or 1")]
    InvalidOption,

    #[error("Market deadline has passed")]
    DeadlinePassed,

    #[error("Market cannot be resolved before its deadline")]
    InvalidTiming,

    #[error("Market has not been resolved")]
    NotResolved,

    /// A stake would push an accumulated total past `u64::MAX`.
    #[error("Arithmetic overflow")]
    Overflow,
}

impl LedgerError {
    /// Stable numeric error code
    pub fn code(&self) -> u32 {
        match self {
            LedgerError::NotFound => 101,
            LedgerError::Unauthorized => 102,
            LedgerError::AlreadyResolved => 103,
            LedgerError::InvalidOption => 104,
            LedgerError::DeadlinePassed => 105,
            LedgerError::NotResolved => 106,
            LedgerError::InvalidTiming => 107,
            LedgerError::Overflow => 108,
        }
    }
}
