// Request/response models for the ledger HTTP host

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::LedgerError;
use crate::escrow::EscrowError;
use crate::market_resolve::{Identity, Market, StakePosition};

// ===== ERRORS =====

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error("Missing caller identity (x-caller header)")]
    MissingCaller,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(e) => match e {
                LedgerError::NotFound => StatusCode::NOT_FOUND,
                LedgerError::Unauthorized => StatusCode::FORBIDDEN,
                LedgerError::AlreadyResolved => StatusCode::CONFLICT,
                LedgerError::InvalidOption => StatusCode::BAD_REQUEST,
                LedgerError::DeadlinePassed
                | LedgerError::InvalidTiming
                | LedgerError::NotResolved
                | LedgerError::Overflow => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ApiError::Escrow(EscrowError::InsufficientBalance { .. }) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Escrow(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MissingCaller => StatusCode::UNAUTHORIZED,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            ApiError::Ledger(e) => Some(e.code()),
            _ => None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(%status, error = %self, "request rejected");
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

// ===== REQUESTS =====

#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub description: String,
    pub options: Vec<String>,
    pub deadline: u64,
}

#[derive(Debug, Deserialize)]
pub struct StakeRequest {
    pub option: u64,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub winning_option: u64,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: u64,
}

// ===== RESPONSES =====

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMarketResponse {
    pub success: bool,
    pub market_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub market_id: u64,
    pub payout: u64,
    pub new_balance: u64,
}

/// Market view with its per-outcome pools
#[derive(Debug, Serialize, Deserialize)]
pub struct MarketView {
    pub id: u64,
    pub creator: Identity,
    pub description: String,
    pub options: [String; 2],
    pub total_stake: u64,
    pub outcome_totals: [u64; 2],
    pub deadline: u64,
    pub created_at: u64,
    pub resolved: bool,
    pub winning_option: Option<u8>,
    /// Staking still open at the current block
    pub open: bool,
}

impl MarketView {
    pub fn from_market(market: &Market, now: u64) -> Self {
        Self {
            id: market.id.0,
            creator: market.creator.clone(),
            description: market.description.clone(),
            options: market.options.clone(),
            total_stake: market.total_stake,
            outcome_totals: market.outcome_totals,
            deadline: market.deadline,
            created_at: market.created_at,
            resolved: market.resolved,
            winning_option: market.winning_option.map(u8::from),
            open: market.accepts_stakes(now),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionView {
    pub market_id: u64,
    pub staker: Identity,
    pub option0_stake: u64,
    pub option1_stake: u64,
}

impl PositionView {
    pub fn new(market_id: u64, staker: Identity, position: &StakePosition) -> Self {
        Self {
            market_id,
            staker,
            option0_stake: position.option0_stake,
            option1_stake: position.option1_stake,
        }
    }
}
