// =============================================================================
// Upstream market-data source — Binance-compatible klines REST endpoint
// =============================================================================
//
// The dashboard backend does not own price data; it polls an upstream REST API
// for OHLCV bars per configured (symbol, interval) pair and keeps the latest
// window in the BarStore. Only public (unsigned) endpoints are consumed.
//
// Kline payloads are arrays of arrays with prices encoded as JSON strings:
//
//   [[openTime, "open", "high", "low", "close", "volume", closeTime, ...], ...]
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::market_data::{Bar, BarKey, BarStore};

/// REST client for the upstream market-data API.
#[derive(Clone)]
pub struct UpstreamClient {
    base_url: String,
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Create a new client against `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// GET /api/v3/klines — fetch up to `limit` bars for a (symbol, interval).
    pub async fn fetch_bars(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Bar>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET klines request failed for {symbol}@{interval}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("klines request for {symbol}@{interval} returned {status}: {body}");
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .context("failed to decode klines response as JSON")?;

        let bars = parse_klines(&payload)?;
        debug!(symbol = %symbol, interval = %interval, count = bars.len(), "fetched bars");
        Ok(bars)
    }
}

/// Parse a klines array-of-arrays payload into bars.
///
/// Rows shorter than 7 elements or with unparseable fields are an error — a
/// malformed upstream payload should surface as one loud fetch failure, not a
/// silently shortened series.
fn parse_klines(payload: &serde_json::Value) -> Result<Vec<Bar>> {
    let rows = payload
        .as_array()
        .context("klines payload is not an array")?;

    let mut bars = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let fields = row
            .as_array()
            .with_context(|| format!("klines row {i} is not an array"))?;
        if fields.len() < 7 {
            anyhow::bail!("klines row {i} has {} fields, expected at least 7", fields.len());
        }

        let open_time = fields[0]
            .as_i64()
            .with_context(|| format!("row {i}: openTime is not an integer"))?;
        let close_time = fields[6]
            .as_i64()
            .with_context(|| format!("row {i}: closeTime is not an integer"))?;

        bars.push(Bar {
            open_time,
            close_time,
            open: parse_string_f64(&fields[1], "open")?,
            high: parse_string_f64(&fields[2], "high")?,
            low: parse_string_f64(&fields[3], "low")?,
            close: parse_string_f64(&fields[4], "close")?,
            volume: parse_string_f64(&fields[5], "volume")?,
        });
    }

    Ok(bars)
}

/// Helper: the upstream encodes numeric values as JSON strings inside klines.
fn parse_string_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

/// Poll the upstream for one (symbol, interval) pair forever.
///
/// Each cycle fetches a full window and replaces the stored series; failures
/// are logged and recorded on the AppState health map, then the loop sleeps
/// and tries again — a flaky upstream must never kill the poller.
pub async fn run_bar_poller(
    client: UpstreamClient,
    key: BarKey,
    store: Arc<BarStore>,
    state: Arc<AppState>,
    poll_secs: u64,
    history_limit: usize,
) {
    info!(key = %key, poll_secs, "bar poller starting");

    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(poll_secs.max(1)));
    loop {
        interval.tick().await;

        match client
            .fetch_bars(&key.symbol, &key.interval, history_limit)
            .await
        {
            Ok(bars) => {
                store.replace(key.clone(), bars);
                state.record_fetch_ok(&key);
                state.increment_version();
            }
            Err(e) => {
                warn!(key = %key, error = %e, "bar fetch failed — will retry next cycle");
                state.record_fetch_error(&key, format!("{e}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
