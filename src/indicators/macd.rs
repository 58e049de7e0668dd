// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// Two EMAs of the closing price, both seeded at close_0:
//
//   macd_i      = EMA_fast(close)_i - EMA_slow(close)_i
//   signal_i    = 0                                   while i < signal_period - 1
//   signal_i    = macd_i * β + signal_{i-1} * (1 - β) afterwards, β = 2/(signal_period+1)
//   histogram_i = macd_i - signal_i                   at every index
//
// The signal line is deliberately held at zero through the warm-up instead of
// being re-seeded from an SMA of early MACD values. The first smoothed value
// therefore blends against zero — a carried-over charting convention, covered
// by an explicit test so nobody "fixes" it by accident.
// =============================================================================

use serde::Serialize;

use crate::indicators::ema::calculate_ema;

/// One MACD observation: line, signal, and their difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Compute the MACD series for the given `closes`.
///
/// The returned vector has the same length as `closes`; every entry carries
/// all three components, with `histogram == macd - signal` exactly.
///
/// # Edge cases
/// - any period == 0 => empty vec
/// - empty input => empty vec
pub fn calculate_macd(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Vec<MacdPoint> {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || closes.is_empty() {
        return Vec::new();
    }

    let fast = calculate_ema(closes, fast_period);
    let slow = calculate_ema(closes, slow_period);
    let beta = 2.0 / (signal_period + 1) as f64;

    let mut result = Vec::with_capacity(closes.len());
    let mut prev_signal = 0.0;

    for i in 0..closes.len() {
        let macd = fast[i] - slow[i];

        let signal = if i + 1 < signal_period {
            0.0
        } else {
            macd * beta + prev_signal * (1.0 - beta)
        };
        prev_signal = signal;

        result.push(MacdPoint {
            macd,
            signal,
            histogram: macd - signal,
        });
    }

    result
}
