// =============================================================================
// Runtime Configuration — dashboard backend settings with atomic save
// =============================================================================
//
// Which symbols and intervals to poll, how often, how much history to keep,
// and the default indicator parameters used when a request names an indicator
// without parameters.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::IndicatorDefaults;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    vec![
        "BTCUSDT".to_string(),
        "ETHUSDT".to_string(),
        "BNBUSDT".to_string(),
        "XRPUSDT".to_string(),
        "SOLUSDT".to_string(),
    ]
}

fn default_intervals() -> Vec<String> {
    vec!["1m".to_string(), "5m".to_string()]
}

fn default_poll_secs() -> u64 {
    15
}

fn default_history_limit() -> usize {
    500
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Vantage Charts backend.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Symbols the backend polls and serves.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Bar intervals polled per symbol (e.g. "1m", "5m").
    #[serde(default = "default_intervals")]
    pub intervals: Vec<String>,

    /// Seconds between upstream polls per series.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    /// Maximum bars retained per series.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Default indicator parameters for requests that omit them.
    #[serde(default)]
    pub indicators: IndicatorDefaults,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            intervals: default_intervals(),
            poll_secs: default_poll_secs(),
            history_limit: default_history_limit(),
            indicators: IndicatorDefaults::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            intervals = ?config.intervals,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbols.len(), 5);
        assert_eq!(cfg.symbols[0], "BTCUSDT");
        assert_eq!(cfg.intervals, vec!["1m", "5m"]);
        assert_eq!(cfg.poll_secs, 15);
        assert_eq!(cfg.history_limit, 500);
        assert_eq!(cfg.indicators.rsi_period, 14);
        assert_eq!(cfg.indicators.macd_fast, 12);
        assert_eq!(cfg.indicators.macd_slow, 26);
        assert_eq!(cfg.indicators.macd_signal, 9);
        assert!((cfg.indicators.bollinger_k - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.symbols.len(), 5);
        assert_eq!(cfg.poll_secs, 15);
        assert_eq!(cfg.indicators.sma_period, 20);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "symbols": ["ETHUSDT"], "poll_secs": 30 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbols, vec!["ETHUSDT"]);
        assert_eq!(cfg.poll_secs, 30);
        assert_eq!(cfg.intervals, vec!["1m", "5m"]);
        assert_eq!(cfg.indicators.bollinger_period, 20);
    }

    #[test]
    fn partial_indicator_defaults_fill_in() {
        let json = r#"{ "indicators": { "rsi_period": 7 } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.indicators.rsi_period, 7);
        assert_eq!(cfg.indicators.sma_period, 20);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.symbols, cfg2.symbols);
        assert_eq!(cfg.intervals, cfg2.intervals);
        assert_eq!(cfg.poll_secs, cfg2.poll_secs);
        assert_eq!(cfg.indicators.ema_period, cfg2.indicators.ema_period);
    }
}
