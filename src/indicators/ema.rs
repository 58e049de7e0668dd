// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the SMA.
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_0      = close_0                       (seeded with the first close)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// Note the seed: the series is defined from the very first bar with no
// warm-up gap. Early values are biased toward the seed, which is what the
// chart consumers expect — the line starts at the left edge.
// =============================================================================

/// Compute the EMA series for the given `closes` and look-back `period`.
///
/// The returned vector has the same length as `closes`: one value per input
/// index, with `ema[0] == closes[0]`.
///
/// # Edge cases
/// - `period == 0` => empty vec (division by zero guard)
/// - empty input => empty vec
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.is_empty() {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;

    let mut result = Vec::with_capacity(closes.len());
    let mut prev = closes[0];
    result.push(prev);

    for &close in &closes[1..] {
        let ema = close * multiplier + prev * (1.0 - multiplier);
        result.push(ema);
        prev = ema;
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_seeded_with_first_close() {
        // The seed must equal closes[0] for any period.
        let closes = vec![42.5, 43.0, 41.0];
        for period in [1, 5, 12, 26, 200] {
            let ema = calculate_ema(&closes, period);
            assert!((ema[0] - 42.5).abs() < f64::EPSILON, "period {period}");
        }
    }

    #[test]
    fn ema_output_length_matches_input() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        assert_eq!(calculate_ema(&closes, 5).len(), 10);
        assert_eq!(calculate_ema(&closes, 50).len(), 10);
    }

    #[test]
    fn ema_known_values() {
        // EMA(3) of [2, 4, 6]: multiplier = 0.5
        //   ema[0] = 2
        //   ema[1] = 4*0.5 + 2*0.5 = 3
        //   ema[2] = 6*0.5 + 3*0.5 = 4.5
        let ema = calculate_ema(&[2.0, 4.0, 6.0], 3);
        assert!((ema[0] - 2.0).abs() < 1e-12);
        assert!((ema[1] - 3.0).abs() < 1e-12);
        assert!((ema[2] - 4.5).abs() < 1e-12);
    }

    #[test]
    fn ema_flat_series_stays_flat() {
        let ema = calculate_ema(&vec![100.0; 50], 12);
        for &v in &ema {
            assert!((v - 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_period_one_tracks_price() {
        // multiplier = 1.0: EMA(1) is the price itself.
        let closes = vec![1.0, 5.0, 2.5, 9.0];
        let ema = calculate_ema(&closes, 1);
        for (a, b) in ema.iter().zip(closes.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
