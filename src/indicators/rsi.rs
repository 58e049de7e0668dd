// =============================================================================
// Relative Strength Index (RSI) — window-mean variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// This variant averages gains and losses over a plain trailing window (no
// Wilder smoothing):
//
//   change_j = close_j - close_{j-1}          for j in [i-period+1, i]
//   avg_gain = mean(max(change_j, 0))
//   avg_loss = mean(max(-change_j, 0))
//   RS       = avg_gain / avg_loss
//   RSI_i    = 100 - 100 / (1 + RS)
//
// While fewer than `period` deltas exist the value is held at the neutral
// 50.0 rather than omitted, so the oscillator pane always has a line to draw.
//
// Degenerate windows are clamped instead of dividing by zero:
//   avg_loss == 0, avg_gain > 0   => 100.0   (straight-up window)
//   avg_loss == 0, avg_gain == 0  => 50.0    (perfectly flat window)
// =============================================================================

/// Neutral RSI value used while the window is warming up.
const NEUTRAL_RSI: f64 = 50.0;

/// Compute the RSI series for the given `closes` and look-back `period`.
///
/// The returned vector has the same length as `closes`. Entries `0..period`
/// hold the neutral 50.0; from index `period` onwards the window-mean formula
/// above applies. Every value is in `[0, 100]`.
///
/// # Edge cases
/// - `period == 0` => all neutral (no window to average)
/// - `closes.len() <= period` => all neutral
/// - zero average loss => clamped per the policy in the header
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![NEUTRAL_RSI; closes.len()];
    if period == 0 {
        return result;
    }

    for i in period..closes.len() {
        let mut sum_gain = 0.0;
        let mut sum_loss = 0.0;
        for j in i + 1 - period..=i {
            let change = closes[j] - closes[j - 1];
            if change > 0.0 {
                sum_gain += change;
            } else {
                sum_loss += -change;
            }
        }

        let avg_gain = sum_gain / period as f64;
        let avg_loss = sum_loss / period as f64;

        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        NEUTRAL_RSI
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero_all_neutral() {
        let out = calculate_rsi(&[1.0, 2.0, 3.0], 0);
        assert_eq!(out, vec![50.0, 50.0, 50.0]);
    }

    #[test]
    fn rsi_warmup_is_neutral() {
        // First `period` entries are the neutral default, not absent.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let out = calculate_rsi(&closes, 14);
        assert_eq!(out.len(), 30);
        for &v in &out[..14] {
            assert!((v - 50.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rsi_all_gains_clamps_to_100() {
        // Strictly ascending prices: zero average loss, clamped to 100.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let out = calculate_rsi(&closes, 14);
        for &v in &out[14..] {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let out = calculate_rsi(&closes, 14);
        for &v in &out[14..] {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_window_is_neutral() {
        // No movement at all: both averages are zero => 50.0, not NaN.
        let closes = vec![100.0; 30];
        let out = calculate_rsi(&closes, 14);
        for &v in &out {
            assert!((v - 50.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rsi_bounds() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13, 43.50, 44.01,
        ];
        let out = calculate_rsi(&closes, 14);
        for &v in &out {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
            assert!(v.is_finite());
        }
    }

    #[test]
    fn rsi_balanced_window_is_50() {
        // Alternating +1/-1 over an even window: equal mean gain and loss.
        let mut closes = vec![100.0];
        for i in 0..20 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let out = calculate_rsi(&closes, 14);
        assert!((out[20] - 50.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_known_window_mean() {
        // period = 2, closes = [1, 2, 4, 3]:
        // i = 2: changes [+1, +2] => avg_gain 1.5, avg_loss 0 => 100
        // i = 3: changes [+2, -1] => avg_gain 1.0, avg_loss 0.5
        //        rs = 2, rsi = 100 - 100/3 = 66.666...
        let out = calculate_rsi(&[1.0, 2.0, 4.0, 3.0], 2);
        assert!((out[2] - 100.0).abs() < 1e-10);
        assert!((out[3] - (100.0 - 100.0 / 3.0)).abs() < 1e-10);
    }
}
