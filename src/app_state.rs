// =============================================================================
// Central Application State — Vantage Charts backend
// =============================================================================
//
// The single source of truth for the service. The REST layer reads from here;
// the pollers write into the bar store and record their health here.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.
//   - Arc wrappers for subsystems with their own interior mutability.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::indicators::IndicatorDefaults;
use crate::market_data::{BarKey, BarStore};
use crate::runtime_config::RuntimeConfig;

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

// =============================================================================
// Records
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Fetch health for one bar series.
#[derive(Debug, Clone, Default)]
struct FetchHealth {
    last_ok: Option<std::time::Instant>,
    last_error: Option<String>,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation. Dashboard clients use it to detect staleness
    /// between polls.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    pub bar_store: Arc<BarStore>,

    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    fetch_health: RwLock<HashMap<BarKey, FetchHealth>>,

    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration.
    /// The returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: RuntimeConfig) -> Self {
        let history_limit = config.history_limit;
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            bar_store: Arc::new(BarStore::new(history_limit)),
            recent_errors: RwLock::new(Vec::new()),
            fetch_health: RwLock::new(HashMap::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring is capped at [`MAX_RECENT_ERRORS`];
    /// oldest entries are evicted when the limit is reached.
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Fetch Health ────────────────────────────────────────────────────

    /// Mark a successful upstream fetch for `key`.
    pub fn record_fetch_ok(&self, key: &BarKey) {
        let mut health = self.fetch_health.write();
        let entry = health.entry(key.clone()).or_default();
        entry.last_ok = Some(std::time::Instant::now());
        entry.last_error = None;
    }

    /// Mark a failed upstream fetch for `key` and log it to the error ring.
    pub fn record_fetch_error(&self, key: &BarKey, error: String) {
        {
            let mut health = self.fetch_health.write();
            let entry = health.entry(key.clone()).or_default();
            entry.last_error = Some(error.clone());
        }
        self.push_error(format!("{key}: {error}"));
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build a complete, serialisable snapshot of the service state.
    ///
    /// This is the payload of `GET /api/v1/state` — the dashboard's status
    /// panel (freshness per series, recent errors, active configuration).
    pub fn build_snapshot(&self) -> StateSnapshot {
        let config = self.runtime_config.read();
        let health = self.fetch_health.read();

        let mut series = HashMap::new();
        for symbol in &config.symbols {
            for interval in &config.intervals {
                let key = BarKey {
                    symbol: symbol.clone(),
                    interval: interval.clone(),
                };
                let h = health.get(&key).cloned().unwrap_or_default();
                series.insert(
                    key.to_string(),
                    SeriesStatus {
                        bar_count: self.bar_store.count(&key),
                        last_close: self.bar_store.last_close(&key),
                        last_fetch_ok_age_s: h.last_ok.map(|t| t.elapsed().as_secs()),
                        last_fetch_error: h.last_error,
                    },
                );
            }
        }

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            uptime_s: self.start_time.elapsed().as_secs(),
            series,
            recent_errors: self.recent_errors.read().clone(),
            config: ConfigSummary {
                symbols: config.symbols.clone(),
                intervals: config.intervals.clone(),
                poll_secs: config.poll_secs,
                history_limit: config.history_limit,
                indicators: config.indicators.clone(),
            },
        }
    }
}

// =============================================================================
// Serialisable snapshot types
// =============================================================================

/// Full service state snapshot sent to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_s: u64,
    pub series: HashMap<String, SeriesStatus>,
    pub recent_errors: Vec<ErrorRecord>,
    pub config: ConfigSummary,
}

/// Freshness and coverage for one bar series.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesStatus {
    pub bar_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fetch_ok_age_s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fetch_error: Option<String>,
}

/// Summary of the active runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub symbols: Vec<String>,
    pub intervals: Vec<String>,
    pub poll_secs: u64,
    pub history_limit: usize,
    pub indicators: IndicatorDefaults,
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Bar;

    fn state() -> AppState {
        AppState::new(RuntimeConfig::default())
    }

    #[test]
    fn version_starts_at_one_and_increments() {
        let s = state();
        assert_eq!(s.current_state_version(), 1);
        s.increment_version();
        s.increment_version();
        assert_eq!(s.current_state_version(), 3);
    }

    #[test]
    fn error_ring_is_capped() {
        let s = state();
        for i in 0..60 {
            s.push_error(format!("error {i}"));
        }
        let errors = s.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "error 10");
        assert_eq!(errors.last().unwrap().message, "error 59");
    }

    #[test]
    fn fetch_error_clears_on_next_ok() {
        let s = state();
        let key = BarKey {
            symbol: "BTCUSDT".into(),
            interval: "1m".into(),
        };

        s.record_fetch_error(&key, "timeout".into());
        s.record_fetch_ok(&key);

        let snapshot = s.build_snapshot();
        let status = snapshot.series.get("BTCUSDT@1m").unwrap();
        assert!(status.last_fetch_error.is_none());
        assert!(status.last_fetch_ok_age_s.is_some());
    }

    #[test]
    fn snapshot_reports_bar_counts() {
        let s = state();
        let key = BarKey {
            symbol: "BTCUSDT".into(),
            interval: "1m".into(),
        };
        s.bar_store.replace(
            key.clone(),
            vec![Bar {
                open_time: 0,
                close_time: 59_999,
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 10.0,
            }],
        );

        let snapshot = s.build_snapshot();
        let status = snapshot.series.get("BTCUSDT@1m").unwrap();
        assert_eq!(status.bar_count, 1);
        assert_eq!(status.last_close, Some(1.5));
    }
}
