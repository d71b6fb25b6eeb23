// Binary Market Ledger - HTTP host entry point

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use binary_market_ledger::{build_router, AppState, Clock, Config, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        bind = %config.bind_addr,
        state_path = %config.state_path.display(),
        block_interval_ms = config.block_interval.as_millis() as u64,
        persist = config.persist,
        "starting binary market ledger"
    );

    let state: SharedState = AppState::new(config.clone()).shared();

    spawn_block_ticker(state.clone(), config.block_interval);

    let app = build_router(state.clone());

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind = %config.bind_addr, "failed to bind: {}", e);
            std::process::exit(1);
        }
    };
    info!("listening on http://{}", config.bind_addr);

    let shutdown_state = state.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = served {
        error!("server error: {}", e);
    }

    info!("shutdown signal received");
    save_state(&shutdown_state, config.persist);
}

/// Advance the block height once per interval
fn spawn_block_ticker(state: SharedState, interval: std::time::Duration) {
    let clock = match state.lock() {
        Ok(app_state) => app_state.clock.clone(),
        Err(_) => return,
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let height = clock.tick();
            tracing::trace!(height, "block");
        }
    });

    if let Ok(app_state) = state.lock() {
        info!(height = app_state.clock.now(), "block ticker started");
    }
}

fn save_state(state: &SharedState, persist: bool) {
    if !persist {
        return;
    }
    match state.lock() {
        Ok(app_state) => match app_state.save_to_disk() {
            Ok(()) => info!("state saved"),
            Err(e) => error!("failed to save state: {}", e),
        },
        Err(_) => error!("state lock poisoned; nothing saved"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
