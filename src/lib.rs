/// Binary Market Ledger
/// Settlement and escrow state machine for two-outcome prediction markets

pub mod app_state;
pub mod clock;
pub mod config;
pub mod errors;
pub mod escrow;
pub mod handlers;
pub mod ledger;
pub mod market_resolve;
pub mod models;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use clock::{BlockClock, Clock};
pub use config::Config;
pub use errors::{LedgerError, LedgerResult};
pub use escrow::{Balance, BalanceBook, EscrowError, ValueTransfer};
pub use ledger::{LedgerState, LedgerStats, MarketLedger, PositionRecord};
pub use market_resolve::{
    binary_options, proportional_payout, Identity, Market, MarketId, Outcome, PositionKey,
    StakePosition,
};
pub use models::ApiError;
pub use routes::build_router;
