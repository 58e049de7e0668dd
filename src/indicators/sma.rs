// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// The arithmetic mean of the closing price over a fixed-size, inclusive,
// trailing window:
//
//   SMA_i = mean(close[i - period + 1 ..= i])
//
// The series is aligned with the input: output index `i` is computed from
// closes `[0..=i]` only. The first `period - 1` slots carry no value because
// the window is not yet full.
// =============================================================================

/// Compute the SMA series for the given `closes` and look-back `period`.
///
/// The returned vector always has the same length as `closes`. Entry `i` is
/// `None` while `i < period - 1` and the window mean afterwards.
///
/// # Edge cases
/// - `period == 0` => all `None` (no meaningful window)
/// - `closes.len() < period` => all `None`
/// - empty input => empty vec
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut result = vec![None; closes.len()];
    for i in 0..closes.len() {
        if i + 1 < period {
            continue;
        }
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        result[i] = Some(mean);
    }

    result
}
