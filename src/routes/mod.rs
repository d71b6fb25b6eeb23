// Routes module - maps HTTP endpoints onto the ledger handlers

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

/// Build the full router over a shared ledger state
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== STATUS =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/clock", get(get_clock))
        .route("/stats", get(get_stats))
        .route("/activity", get(get_activity))

        // ===== MARKETS =====
        .route("/markets", get(get_markets).post(create_market))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/stake", post(stake))
        .route("/markets/:id/resolve", post(resolve))
        .route("/markets/:id/claim", post(claim))
        .route("/markets/:id/positions", get(get_positions))
        .route("/markets/:id/positions/:identity", get(get_position))

        // ===== ACCOUNTS =====
        .route("/accounts/:identity", get(get_account))
        // dev faucet: credits the caller's own account only
        .route("/accounts/:identity/deposit", post(deposit))

        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
