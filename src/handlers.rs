// HTTP request handlers for the ledger host
//
// Each handler takes the shared state lock once and performs one ledger
// operation under it.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request, State},
    http::request::Parts,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::MutexGuard;

use crate::app_state::{AppState, SharedState};
use crate::clock::Clock;
use crate::errors::LedgerError;
use crate::market_resolve::{binary_options, Identity, MarketId};
use crate::models::*;

pub const CALLER_HEADER: &str = "x-caller";

/// Pre-authenticated caller identity, taken from the `x-caller` header
pub struct Caller(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Caller(Identity::new(v)))
            .ok_or(ApiError::MissingCaller)
    }
}

/// JSON request body whose rejections use the ledger's error shape
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

fn lock(state: &SharedState) -> Result<MutexGuard<'_, AppState>, ApiError> {
    state
        .lock()
        .map_err(|_| ApiError::Internal("state lock poisoned".to_string()))
}

// ===== STATUS ENDPOINTS =====

pub async fn health_check() -> &'static str {
    "Binary Market Ledger - Online"
}

pub async fn get_clock(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let app_state = lock(&state)?;
    Ok(Json(json!({ "height": app_state.clock.now() })))
}

pub async fn get_stats(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let app_state = lock(&state)?;
    Ok(Json(json!({
        "ledger": app_state.ledger.stats(),
        "escrow_held": app_state.balances.escrow_held(),
        "height": app_state.clock.now(),
    })))
}

pub async fn get_activity(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let app_state = lock(&state)?;
    Ok(Json(json!({ "activity": app_state.activity })))
}

// ===== MARKET ENDPOINTS =====

pub async fn get_markets(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let app_state = lock(&state)?;
    let now = app_state.clock.now();
    let markets: Vec<MarketView> = app_state
        .ledger
        .markets()
        .map(|m| MarketView::from_market(m, now))
        .collect();

    Ok(Json(json!({ "markets": markets })))
}

pub async fn get_market(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<MarketView>, ApiError> {
    let app_state = lock(&state)?;
    let market = app_state
        .ledger
        .get_market(MarketId(id))
        .ok_or(LedgerError::NotFound)?;

    Ok(Json(MarketView::from_market(market, app_state.clock.now())))
}

pub async fn create_market(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    JsonBody(payload): JsonBody<CreateMarketRequest>,
) -> Result<Json<CreateMarketResponse>, ApiError> {
    let options = binary_options(payload.options)?;

    let mut app_state = lock(&state)?;
    let market_id = app_state
        .ledger
        .create(&caller, payload.description.clone(), options, payload.deadline);

    app_state.log_activity(
        "MARKET_CREATED",
        &format!("{} created market {}: {}", caller, market_id, payload.description),
    );

    Ok(Json(CreateMarketResponse { success: true, market_id: market_id.0 }))
}

pub async fn stake(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    JsonBody(payload): JsonBody<StakeRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut app_state = lock(&state)?;
    app_state.stake_with_escrow(&caller, MarketId(id), payload.option, payload.amount)?;

    let total_stake = app_state
        .ledger
        .get_market(MarketId(id))
        .map(|m| m.total_stake)
        .unwrap_or_default();

    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "option": payload.option,
        "amount": payload.amount,
        "total_stake": total_stake,
        "new_balance": app_state.balances.available(&caller),
    })))
}

pub async fn resolve(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    JsonBody(payload): JsonBody<ResolveRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut app_state = lock(&state)?;
    app_state.ledger.resolve(&caller, MarketId(id), payload.winning_option)?;

    app_state.log_activity(
        "MARKET_RESOLVED",
        &format!("market {} resolved to option {}", id, payload.winning_option),
    );

    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "winning_option": payload.winning_option,
    })))
}

pub async fn claim(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let mut app_state = lock(&state)?;
    let payout = app_state.claim_with_payout(&caller, MarketId(id))?;

    Ok(Json(ClaimResponse {
        success: true,
        market_id: id,
        payout,
        new_balance: app_state.balances.available(&caller),
    }))
}

pub async fn get_position(
    State(state): State<SharedState>,
    Path((id, staker)): Path<(u64, String)>,
) -> Result<Json<PositionView>, ApiError> {
    let app_state = lock(&state)?;
    let staker = Identity::new(staker);
    let position = app_state
        .ledger
        .get_position(MarketId(id), &staker)
        .ok_or(LedgerError::NotFound)?;

    Ok(Json(PositionView::new(id, staker, position)))
}

pub async fn get_positions(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let app_state = lock(&state)?;
    let market_id = MarketId(id);
    app_state.ledger.get_market(market_id).ok_or(LedgerError::NotFound)?;

    let positions: Vec<PositionView> = app_state
        .ledger
        .positions_for(market_id)
        .into_iter()
        .map(|(staker, position)| PositionView::new(id, staker.clone(), position))
        .collect();

    Ok(Json(json!({ "market_id": id, "positions": positions })))
}

// ===== ACCOUNT ENDPOINTS =====

/// Faucet credit for the caller's own account; crediting another account is `Unauthorized`
pub async fn deposit(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Path(account): Path<String>,
    JsonBody(payload): JsonBody<DepositRequest>,
) -> Result<Json<Value>, ApiError> {
    let account = Identity::new(account);
    if account != caller {
        return Err(LedgerError::Unauthorized.into());
    }

    let mut app_state = lock(&state)?;
    let balance = app_state.balances.deposit(&account, payload.amount)?;

    app_state.log_activity("DEPOSIT", &format!("{} deposited {}", account, payload.amount));

    Ok(Json(json!({ "success": true, "account": account, "balance": balance })))
}

pub async fn get_account(
    State(state): State<SharedState>,
    Path(account): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let app_state = lock(&state)?;
    let account = Identity::new(account);
    let balance = app_state.balances.balance(&account);

    Ok(Json(json!({
        "account": account,
        "available": balance.available,
        "staked": balance.staked,
        "paid_out": balance.paid_out,
    })))
}
