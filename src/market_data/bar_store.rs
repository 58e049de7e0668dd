use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar from the upstream market-data API.
///
/// `open_time` is milliseconds since the UNIX epoch and is strictly increasing
/// and unique within a stored series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Composite key that identifies a unique bar series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BarKey {
    pub symbol: String,
    pub interval: String,
}

impl std::fmt::Display for BarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

// ---------------------------------------------------------------------------
// BarStore -- thread-safe bar series per (symbol, interval)
// ---------------------------------------------------------------------------

/// Thread-safe store of the most recent bars per `(symbol, interval)` pair.
///
/// Each refresh **replaces** the whole series for a key — the indicator engine
/// re-derives from index 0 on every request, so partial in-place mutation has
/// no consumer and is not supported. Series are capped at `max_bars`, keeping
/// the newest bars.
pub struct BarStore {
    series: RwLock<HashMap<BarKey, Vec<Bar>>>,
    max_bars: usize,
}

impl BarStore {
    /// Create a store retaining at most `max_bars` bars per key.
    pub fn new(max_bars: usize) -> Self {
        Self {
            series: RwLock::new(HashMap::new()),
            max_bars,
        }
    }

    /// Replace the series for `key` with `bars`.
    ///
    /// Bars whose `open_time` is not strictly greater than their predecessor's
    /// are dropped with a warning — the store only ever holds a monotonically
    /// increasing series, so every consumer can assume time order. The series
    /// is then trimmed to the newest `max_bars` entries.
    pub fn replace(&self, key: BarKey, bars: Vec<Bar>) {
        let mut ordered: Vec<Bar> = Vec::with_capacity(bars.len());
        let mut dropped = 0usize;

        for bar in bars {
            match ordered.last() {
                Some(prev) if bar.open_time <= prev.open_time => dropped += 1,
                _ => ordered.push(bar),
            }
        }

        if dropped > 0 {
            warn!(key = %key, dropped, "dropped out-of-order bars from upstream payload");
        }

        if ordered.len() > self.max_bars {
            ordered.drain(..ordered.len() - self.max_bars);
        }

        self.series.write().insert(key, ordered);
    }

    /// Return the most recent `count` bars for `key` (oldest-first order).
    /// Unknown keys yield an empty vec.
    pub fn get(&self, key: &BarKey, count: usize) -> Vec<Bar> {
        let map = self.series.read();
        match map.get(key) {
            Some(bars) => {
                let start = bars.len().saturating_sub(count);
                bars[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// Return the close price of the most recent bar, if any.
    pub fn last_close(&self, key: &BarKey) -> Option<f64> {
        let map = self.series.read();
        map.get(key).and_then(|bars| bars.last().map(|b| b.close))
    }

    /// Number of bars stored for `key`.
    pub fn count(&self, key: &BarKey) -> usize {
        let map = self.series.read();
        map.get(key).map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
