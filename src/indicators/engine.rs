// =============================================================================
// Indicator Engine — batch annotation of OHLCV bars
// =============================================================================
//
// Given an ordered bar sequence and a selection of indicator families, produce
// the same sequence with indicator values attached. The transform is pure:
// no I/O, no shared state, and the value at index `i` depends only on bars
// `[0..=i]` — truncating the input reproduces the truncated output exactly.
// Recomputation always re-derives the whole series from index 0; annotated
// bars are never mutated in place.
//
// Each bar carries one explicitly-typed optional slot per indicator family
// rather than an open-ended map, so a silently-absent-but-expected field is a
// type error, not a runtime surprise.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::bollinger::{calculate_bollinger, BollingerPoint};
use crate::indicators::ema::calculate_ema;
use crate::indicators::macd::{calculate_macd, MacdPoint};
use crate::indicators::rsi::calculate_rsi;
use crate::indicators::sma::calculate_sma;
use crate::market_data::Bar;

// =============================================================================
// Default parameters
// =============================================================================

fn default_sma_period() -> usize {
    20
}

fn default_ema_period() -> usize {
    20
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

/// Per-family default parameters, used when a request names an indicator
/// without parameters (e.g. `indicators=rsi,macd`). Lives in the runtime
/// config so the dashboard can retune defaults without a redeploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorDefaults {
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,
}

impl Default for IndicatorDefaults {
    fn default() -> Self {
        Self {
            sma_period: default_sma_period(),
            ema_period: default_ema_period(),
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_period: default_bollinger_period(),
            bollinger_k: default_bollinger_k(),
        }
    }
}

// =============================================================================
// IndicatorSelection
// =============================================================================

/// MACD parameter triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// Bollinger parameter pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub period: usize,
    pub k: f64,
}

/// Which indicator families to compute, and with what parameters.
///
/// One optional slot per family — requesting the same family twice is not a
/// thing the data model supports, mirroring the one-annotation-per-family
/// shape of [`AnnotatedBar`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSelection {
    pub sma: Option<usize>,
    pub ema: Option<usize>,
    pub rsi: Option<usize>,
    pub macd: Option<MacdParams>,
    pub bollinger: Option<BollingerParams>,
}

impl IndicatorSelection {
    /// Select every family with its default parameters.
    pub fn all(defaults: &IndicatorDefaults) -> Self {
        Self {
            sma: Some(defaults.sma_period),
            ema: Some(defaults.ema_period),
            rsi: Some(defaults.rsi_period),
            macd: Some(MacdParams {
                fast: defaults.macd_fast,
                slow: defaults.macd_slow,
                signal: defaults.macd_signal,
            }),
            bollinger: Some(BollingerParams {
                period: defaults.bollinger_period,
                k: defaults.bollinger_k,
            }),
        }
    }

    /// Parse the REST query syntax, e.g. `sma:20,ema,rsi:14,macd:12:26:9,bollinger:20:2`.
    ///
    /// Each comma-separated entry is a family name optionally followed by
    /// colon-separated parameters; omitted parameters come from `defaults`.
    /// Unknown names, malformed numbers, or zero periods are an error — the
    /// API layer maps that to a 400 response.
    pub fn parse(spec: &str, defaults: &IndicatorDefaults) -> Result<Self, String> {
        let mut selection = Self::default();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.split(':');
            let name = parts.next().unwrap_or_default().to_ascii_lowercase();
            let args: Vec<&str> = parts.collect();

            match name.as_str() {
                "sma" => {
                    selection.sma = Some(parse_period(&args, 0, defaults.sma_period, entry)?);
                }
                "ema" => {
                    selection.ema = Some(parse_period(&args, 0, defaults.ema_period, entry)?);
                }
                "rsi" => {
                    selection.rsi = Some(parse_period(&args, 0, defaults.rsi_period, entry)?);
                }
                "macd" => {
                    selection.macd = Some(MacdParams {
                        fast: parse_period(&args, 0, defaults.macd_fast, entry)?,
                        slow: parse_period(&args, 1, defaults.macd_slow, entry)?,
                        signal: parse_period(&args, 2, defaults.macd_signal, entry)?,
                    });
                }
                "bollinger" | "bb" => {
                    let period = parse_period(&args, 0, defaults.bollinger_period, entry)?;
                    let k = match args.get(1) {
                        Some(raw) => raw
                            .parse::<f64>()
                            .ok()
                            .filter(|k| k.is_finite() && *k > 0.0)
                            .ok_or_else(|| format!("invalid bollinger multiplier in '{entry}'"))?,
                        None => defaults.bollinger_k,
                    };
                    selection.bollinger = Some(BollingerParams { period, k });
                }
                other => return Err(format!("unknown indicator '{other}'")),
            }
        }

        Ok(selection)
    }

    /// True when no family is selected.
    pub fn is_empty(&self) -> bool {
        self.sma.is_none()
            && self.ema.is_none()
            && self.rsi.is_none()
            && self.macd.is_none()
            && self.bollinger.is_none()
    }
}

/// Parse the positional period argument `idx` of an entry, falling back to
/// `default` when absent. Zero periods are rejected here rather than silently
/// producing an all-absent series.
fn parse_period(args: &[&str], idx: usize, default: usize, entry: &str) -> Result<usize, String> {
    match args.get(idx) {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| format!("invalid period in '{entry}'")),
        None => Ok(default),
    }
}

// =============================================================================
// AnnotatedBar
// =============================================================================

/// A bar plus the indicator values valid as of that bar's close.
///
/// Unselected families are `None` on every bar; selected families are `None`
/// only during their documented warm-up (SMA, Bollinger) and present
/// everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedBar {
    #[serde(flatten)]
    pub bar: Bar,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdPoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerPoint>,
}

// =============================================================================
// IndicatorEngine
// =============================================================================

/// Stateless batch transform: bars in, annotated bars out.
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Annotate `bars` with every family selected in `selection`.
    ///
    /// The output has the same length and order as the input. Empty input
    /// yields empty output for any selection. Calling twice with identical
    /// input produces identical output.
    pub fn annotate(bars: &[Bar], selection: &IndicatorSelection) -> Vec<AnnotatedBar> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let sma = selection.sma.map(|p| calculate_sma(&closes, p));
        let ema = selection.ema.map(|p| calculate_ema(&closes, p));
        let rsi = selection.rsi.map(|p| calculate_rsi(&closes, p));
        let macd = selection
            .macd
            .map(|p| calculate_macd(&closes, p.fast, p.slow, p.signal));
        let bollinger = selection
            .bollinger
            .map(|p| calculate_bollinger(&closes, p.period, p.k));

        bars.iter()
            .enumerate()
            .map(|(i, bar)| AnnotatedBar {
                bar: bar.clone(),
                sma: sma.as_ref().and_then(|s| s.get(i).copied().flatten()),
                ema: ema.as_ref().and_then(|s| s.get(i).copied()),
                rsi: rsi.as_ref().and_then(|s| s.get(i).copied()),
                macd: macd.as_ref().and_then(|s| s.get(i).copied()),
                bollinger: bollinger.as_ref().and_then(|s| s.get(i).copied().flatten()),
            })
            .collect()
    }
}
