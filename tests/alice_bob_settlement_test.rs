/// Integration tests using Alice & Bob test accounts
///
/// Drives the full HTTP router in-process: create, stake, resolve, claim,
/// with value moving through the escrow balance book.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use binary_market_ledger::{build_router, AppState, BlockClock, Config, SharedState};

// ============================================================================
// TEST ACCOUNT CONSTANTS
// ============================================================================

const ALICE: &str = "L1ALICE000000001";
const BOB: &str = "L1BOB00000000001";
const CAROL: &str = "L1CAROL00000001";

const STARTING_BALANCE: u64 = 1_000_000_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn setup() -> (Router, BlockClock, SharedState) {
    let config = Config { persist: false, ..Config::default() };
    let state = AppState::new(config).shared();
    let clock = state.lock().unwrap().clock.clone();
    (build_router(state.clone()), clock, state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header("x-caller", caller);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn fund(app: &Router, account: &str) {
    let (status, _) = send(
        app,
        "POST",
        &format!("/accounts/{}/deposit", account),
        Some(account),
        Some(json!({ "amount": STARTING_BALANCE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_market(app: &Router, creator: &str, deadline: u64) -> u64 {
    let (status, body) = send(
        app,
        "POST",
        "/markets",
        Some(creator),
        Some(json!({
            "description": "Will feature X be implemented by EOY?",
            "options": ["Yes", "No"],
            "deadline": deadline
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    body["market_id"].as_u64().unwrap()
}

async fn stake(app: &Router, caller: &str, market: u64, option: u64, amount: u64) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/markets/{}/stake", market),
        Some(caller),
        Some(json!({ "option": option, "amount": amount })),
    )
    .await
}

async fn resolve(app: &Router, caller: &str, market: u64, option: u64) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/markets/{}/resolve", market),
        Some(caller),
        Some(json!({ "winning_option": option })),
    )
    .await
}

async fn claim(app: &Router, caller: &str, market: u64) -> (StatusCode, Value) {
    send(app, "POST", &format!("/markets/{}/claim", market), Some(caller), None).await
}

// ============================================================================
// MARKET CREATION TESTS
// ============================================================================

#[tokio::test]
async fn test_create_market_assigns_sequential_ids() {
    let (app, _, _) = setup();

    assert_eq!(create_market(&app, ALICE, 100).await, 1);
    assert_eq!(create_market(&app, BOB, 100).await, 2);

    let (status, body) = send(&app, "GET", "/markets/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["creator"], ALICE);
    assert_eq!(body["options"], json!(["Yes", "No"]));
    assert_eq!(body["resolved"], false);
    assert_eq!(body["winning_option"], Value::Null);
    assert_eq!(body["open"], true);
}

#[tokio::test]
async fn test_create_market_requires_two_options() {
    let (app, _, _) = setup();
    let (status, body) = send(
        &app,
        "POST",
        "/markets",
        Some(ALICE),
        Some(json!({ "description": "three way", "options": ["A", "B", "C"], "deadline": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 104);
}

#[tokio::test]
async fn test_missing_caller_is_rejected() {
    let (app, _, _) = setup();
    let (status, body) = send(
        &app,
        "POST",
        "/markets",
        None,
        Some(json!({ "description": "q", "options": ["Yes", "No"], "deadline": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

// ============================================================================
// STAKING TESTS
// ============================================================================

#[tokio::test]
async fn test_alice_and_bob_stake() {
    let (app, _, _) = setup();
    fund(&app, ALICE).await;
    fund(&app, BOB).await;
    let market = create_market(&app, ALICE, 100).await;

    let (status, body) = stake(&app, ALICE, market, 0, 50_000_000).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_balance"], STARTING_BALANCE - 50_000_000);

    let (status, body) = stake(&app, BOB, market, 1, 100_000_000).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_stake"], 150_000_000);

    let (_, position) = send(&app, "GET", &format!("/markets/{}/positions/{}", market, BOB), None, None).await;
    assert_eq!(position["option0_stake"], 0);
    assert_eq!(position["option1_stake"], 100_000_000);
}

#[tokio::test]
async fn test_stake_after_deadline_is_refunded() {
    let (app, clock, _) = setup();
    fund(&app, ALICE).await;
    let market = create_market(&app, ALICE, 10).await;

    clock.set_at_least(10);
    let (status, body) = stake(&app, ALICE, market, 0, 500).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 105);

    let (_, account) = send(&app, "GET", &format!("/accounts/{}", ALICE), None, None).await;
    assert_eq!(account["available"], STARTING_BALANCE);
    assert_eq!(account["staked"], 0);
}

#[tokio::test]
async fn test_stake_invalid_option() {
    let (app, _, _) = setup();
    fund(&app, ALICE).await;
    let market = create_market(&app, ALICE, 10).await;

    let (status, body) = stake(&app, ALICE, market, 2, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 104);
}

#[tokio::test]
async fn test_stake_unknown_market() {
    let (app, _, _) = setup();
    fund(&app, ALICE).await;

    let (status, body) = stake(&app, ALICE, 42, 0, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 101);
}

#[tokio::test]
async fn test_malformed_stake_body_uses_error_shape() {
    let (app, _, state) = setup();
    fund(&app, ALICE).await;
    let market = create_market(&app, ALICE, 10).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/markets/{}/stake", market),
        Some(ALICE),
        Some(json!({ "option": 0, "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    assert_eq!(state.lock().unwrap().balances.escrow_held(), 0);
}

#[tokio::test]
async fn test_stake_without_funds() {
    let (app, _, _) = setup();
    let market = create_market(&app, ALICE, 10).await;

    let (status, _) = stake(&app, CAROL, market, 0, 1).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let (status, _) = send(&app, "GET", &format!("/markets/{}/positions/{}", market, CAROL), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stakes_are_all_recorded() {
    let (app, _, state) = setup();
    let market = create_market(&app, ALICE, 1_000).await;

    let stakers: Vec<String> = (0..32).map(|i| format!("L1STAKER{:08}", i)).collect();
    for staker in &stakers {
        fund(&app, staker).await;
    }

    let mut handles = Vec::new();
    for (i, staker) in stakers.iter().enumerate() {
        let app = app.clone();
        let staker = staker.clone();
        handles.push(tokio::spawn(async move {
            let amount = (i as u64 + 1) * 1_000;
            let (status, body) = stake(&app, &staker, market, (i % 2) as u64, amount).await;
            assert_eq!(status, StatusCode::OK, "stake failed: {}", body);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let amounts: Vec<u64> = (0..32u64).map(|i| (i + 1) * 1_000).collect();
    let total: u64 = amounts.iter().sum();
    let option0: u64 = amounts.iter().step_by(2).sum();

    let (_, view) = send(&app, "GET", &format!("/markets/{}", market), None, None).await;
    assert_eq!(view["total_stake"], total);
    assert_eq!(view["outcome_totals"], json!([option0, total - option0]));
    assert_eq!(state.lock().unwrap().balances.escrow_held(), total);

    let (_, listing) = send(&app, "GET", &format!("/markets/{}/positions", market), None, None).await;
    assert_eq!(listing["positions"].as_array().unwrap().len(), 32);
}

#[tokio::test]
async fn test_positions_listing() {
    let (app, _, _) = setup();
    fund(&app, ALICE).await;
    fund(&app, BOB).await;
    let market = create_market(&app, ALICE, 100).await;
    stake(&app, BOB, market, 1, 7).await;
    stake(&app, ALICE, market, 0, 3).await;

    let (status, body) = send(&app, "GET", &format!("/markets/{}/positions", market), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let positions = body["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0]["staker"], ALICE);
    assert_eq!(positions[0]["option0_stake"], 3);
    assert_eq!(positions[1]["option1_stake"], 7);

    let (status, body) = send(&app, "GET", "/markets/9/positions", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 101);
}

// ============================================================================
// ACCOUNT TESTS
// ============================================================================

#[tokio::test]
async fn test_deposit_only_credits_caller() {
    let (app, _, _) = setup();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/accounts/{}/deposit", ALICE),
        Some(BOB),
        Some(json!({ "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 102);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/accounts/{}/deposit", ALICE),
        None,
        Some(json!({ "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, account) = send(&app, "GET", &format!("/accounts/{}", ALICE), None, None).await;
    assert_eq!(account["available"], 0);
}

// ============================================================================
// RESOLUTION & CLAIM TESTS
// ============================================================================

#[tokio::test]
async fn test_full_settlement_flow() {
    let (app, clock, state) = setup();
    fund(&app, ALICE).await;
    fund(&app, BOB).await;

    let market = create_market(&app, ALICE, 100).await;
    stake(&app, ALICE, market, 0, 50_000_000).await;
    stake(&app, BOB, market, 1, 100_000_000).await;

    // too early
    let (status, body) = resolve(&app, ALICE, market, 0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 107);

    clock.set_at_least(101);

    let (status, body) = resolve(&app, BOB, market, 0).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 102);

    let (status, _) = resolve(&app, ALICE, market, 0).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = resolve(&app, ALICE, market, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 103);

    let (status, body) = claim(&app, ALICE, market).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payout"], 150_000_000);
    assert_eq!(body["new_balance"], STARTING_BALANCE + 100_000_000);

    let (status, body) = claim(&app, BOB, market).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payout"], 0);

    // second claim is a zero payout, not an error
    let (status, body) = claim(&app, ALICE, market).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payout"], 0);

    assert_eq!(state.lock().unwrap().balances.escrow_held(), 0);

    let (_, activity) = send(&app, "GET", "/activity", None, None).await;
    assert!(activity["activity"].as_array().unwrap().len() >= 5);
}

#[tokio::test]
async fn test_claim_before_resolution() {
    let (app, _, _) = setup();
    fund(&app, ALICE).await;
    let market = create_market(&app, ALICE, 10).await;
    stake(&app, ALICE, market, 0, 5).await;

    let (status, body) = claim(&app, ALICE, market).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 106);
}

#[tokio::test]
async fn test_claim_without_position() {
    let (app, clock, _) = setup();
    let market = create_market(&app, ALICE, 10).await;
    clock.set_at_least(10);
    resolve(&app, ALICE, market, 1).await;

    let (status, body) = claim(&app, CAROL, market).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 101);
}

#[tokio::test]
async fn test_clock_and_stats_endpoints() {
    let (app, clock, _) = setup();
    clock.advance(4);

    let (status, body) = send(&app, "GET", "/clock", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["height"], 5);

    create_market(&app, ALICE, 100).await;
    let (_, stats) = send(&app, "GET", "/stats", None, None).await;
    assert_eq!(stats["ledger"]["total_markets"], 1);
    assert_eq!(stats["escrow_held"], 0);
}
