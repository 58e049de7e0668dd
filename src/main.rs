// =============================================================================
// Vantage Charts — Main Entry Point
// =============================================================================
//
// Backend for the Vantage market dashboard: polls an upstream market-data API
// for OHLCV bars and serves them — annotated with technical indicators — to
// the browser frontend over REST.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod indicators;
mod market_data;
mod runtime_config;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::{run_bar_poller, BarKey, UpstreamClient};
use crate::runtime_config::RuntimeConfig;

/// Path of the persisted runtime configuration.
const CONFIG_PATH: &str = "vantage_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Vantage Charts — Starting Up                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override symbols from env if available.
    if let Ok(syms) = std::env::var("VANTAGE_SYMBOLS") {
        config.symbols = syms
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if config.symbols.is_empty() {
        config.symbols = vec!["BTCUSDT".into(), "ETHUSDT".into()];
    }

    info!(symbols = ?config.symbols, intervals = ?config.intervals, "Configured series");

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Build the upstream client ─────────────────────────────────────
    let upstream_url = std::env::var("VANTAGE_UPSTREAM_URL")
        .unwrap_or_else(|_| "https://api.binance.com".into());
    let upstream = UpstreamClient::new(upstream_url.clone());
    info!(url = %upstream_url, "Upstream market-data source configured");

    // ── 4. Spawn bar pollers ─────────────────────────────────────────────
    let (symbols, intervals, poll_secs, history_limit) = {
        let cfg = state.runtime_config.read();
        (
            cfg.symbols.clone(),
            cfg.intervals.clone(),
            cfg.poll_secs,
            cfg.history_limit,
        )
    };

    let mut poller_count = 0usize;
    for symbol in &symbols {
        for interval in &intervals {
            let key = BarKey {
                symbol: symbol.clone(),
                interval: interval.clone(),
            };
            let client = upstream.clone();
            let store = state.bar_store.clone();
            let poller_state = state.clone();
            tokio::spawn(async move {
                run_bar_poller(client, key, store, poller_state, poll_secs, history_limit).await;
            });
            poller_count += 1;
        }
    }

    info!(count = poller_count, "Bar pollers launched");

    // ── 5. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr =
        std::env::var("VANTAGE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    let app = api::rest::router(api_state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind API server on {bind_addr}: {e}"))?;
    info!(addr = %bind_addr, "API server listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    server.abort();

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Vantage Charts shut down complete.");
    Ok(())
}
