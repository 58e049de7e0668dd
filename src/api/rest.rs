// =============================================================================
// REST API Endpoints — Axum 0.8
// =============================================================================
//
// All endpoints live under `/api/v1/`. Public endpoints (health) require no
// authentication. All other endpoints require a valid Bearer token checked via
// the `AuthBearer` extractor.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::indicators::{AnnotatedBar, IndicatorEngine, IndicatorSelection};
use crate::market_data::BarKey;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        // ── Authenticated ───────────────────────────────────────────
        .route("/api/v1/bars", get(bars))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/config", post(set_config))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Bars (authenticated) — the chart data feed
// =============================================================================

#[derive(Deserialize)]
struct BarsQuery {
    symbol: String,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    /// Comma-separated indicator spec, e.g. `sma:20,rsi,macd`.
    /// Absent => bars only; `all` => every family with defaults.
    #[serde(default)]
    indicators: Option<String>,
}

#[derive(Serialize)]
struct BarsResponse {
    symbol: String,
    interval: String,
    bars: Vec<AnnotatedBar>,
}

/// Return the stored bars for a (symbol, interval), annotated with the
/// requested indicators.
///
/// A malformed indicator spec is a 400. An unknown symbol or interval is
/// *not* an error — the renderer always receives a well-shaped (possibly
/// empty) array.
async fn bars(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BarsQuery>,
) -> impl IntoResponse {
    let (defaults, history_limit) = {
        let config = state.runtime_config.read();
        (config.indicators.clone(), config.history_limit)
    };

    let selection = match query.indicators.as_deref() {
        None => IndicatorSelection::default(),
        Some("all") => IndicatorSelection::all(&defaults),
        Some(spec) => match IndicatorSelection::parse(spec, &defaults) {
            Ok(sel) => sel,
            Err(msg) => {
                let body = serde_json::json!({ "error": msg });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
        },
    };

    let key = BarKey {
        symbol: query.symbol.to_uppercase(),
        interval: query.interval.unwrap_or_else(|| "1m".to_string()),
    };
    let limit = query.limit.unwrap_or(history_limit).min(history_limit);

    let raw = state.bar_store.get(&key, limit);
    let annotated = IndicatorEngine::annotate(&raw, &selection);

    let resp = BarsResponse {
        symbol: key.symbol,
        interval: key.interval,
        bars: annotated,
    };
    Json(resp).into_response()
}

// =============================================================================
// Symbols (authenticated)
// =============================================================================

async fn symbols(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let config = state.runtime_config.read();
    let body = serde_json::json!({
        "symbols": config.symbols,
        "intervals": config.intervals,
    });
    Json(body)
}

// =============================================================================
// Full state snapshot (authenticated)
// =============================================================================

async fn full_state(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let snapshot = state.build_snapshot();
    Json(snapshot)
}

// =============================================================================
// Config (authenticated)
// =============================================================================

async fn get_config(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let config = state.runtime_config.read();
    Json(config.clone())
}

/// Partial update of the indicator defaults. Omitted fields keep their
/// current value. Persisted on shutdown together with the rest of the config.
#[derive(Deserialize)]
struct IndicatorDefaultsUpdate {
    #[serde(default)]
    sma_period: Option<usize>,
    #[serde(default)]
    ema_period: Option<usize>,
    #[serde(default)]
    rsi_period: Option<usize>,
    #[serde(default)]
    macd_fast: Option<usize>,
    #[serde(default)]
    macd_slow: Option<usize>,
    #[serde(default)]
    macd_signal: Option<usize>,
    #[serde(default)]
    bollinger_period: Option<usize>,
    #[serde(default)]
    bollinger_k: Option<f64>,
}

async fn set_config(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<IndicatorDefaultsUpdate>,
) -> impl IntoResponse {
    // Zero periods would make every series all-absent; reject up front.
    let periods = [
        update.sma_period,
        update.ema_period,
        update.rsi_period,
        update.macd_fast,
        update.macd_slow,
        update.macd_signal,
        update.bollinger_period,
    ];
    if periods.iter().any(|p| *p == Some(0)) {
        let body = serde_json::json!({ "error": "periods must be greater than zero" });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    if let Some(k) = update.bollinger_k {
        if !k.is_finite() || k <= 0.0 {
            let body = serde_json::json!({ "error": "bollinger_k must be a positive number" });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    }

    {
        let mut config = state.runtime_config.write();
        let ind = &mut config.indicators;
        if let Some(v) = update.sma_period {
            ind.sma_period = v;
        }
        if let Some(v) = update.ema_period {
            ind.ema_period = v;
        }
        if let Some(v) = update.rsi_period {
            ind.rsi_period = v;
        }
        if let Some(v) = update.macd_fast {
            ind.macd_fast = v;
        }
        if let Some(v) = update.macd_slow {
            ind.macd_slow = v;
        }
        if let Some(v) = update.macd_signal {
            ind.macd_signal = v;
        }
        if let Some(v) = update.bollinger_period {
            ind.bollinger_period = v;
        }
        if let Some(v) = update.bollinger_k {
            ind.bollinger_k = v;
        }
    }

    state.increment_version();
    info!("indicator defaults updated via API");

    let config = state.runtime_config.read();
    Json(config.indicators.clone()).into_response()
}
