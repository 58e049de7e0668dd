// =============================================================================
// Bollinger Bands
// =============================================================================
//
// A middle band (trailing SMA) with symmetric bands at ±k standard deviations:
//
//   middle_i = mean(close[i-period+1 ..= i])
//   σ_i      = sqrt(mean((close_j - middle_i)^2))     (population variance)
//   upper_i  = middle_i + k * σ_i
//   lower_i  = middle_i - k * σ_i
//
// The variance divides by `period`, not `period - 1`.
// =============================================================================

use serde::Serialize;

/// One Bollinger observation: upper band, middle SMA, lower band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Compute the Bollinger Band series for the given `closes`.
///
/// The returned vector has the same length as `closes`. Entry `i` is `None`
/// while `i < period - 1` (window not yet full) and the band triple afterwards.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - `closes.len() < period` => all `None`
/// - flat window => σ = 0, all three bands coincide
pub fn calculate_bollinger(closes: &[f64], period: usize, k: f64) -> Vec<Option<BollingerPoint>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut result = vec![None; closes.len()];
    for i in 0..closes.len() {
        if i + 1 < period {
            continue;
        }
        let window = &closes[i + 1 - period..=i];
        let middle = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();

        result[i] = Some(BollingerPoint {
            upper: middle + k * std_dev,
            middle,
            lower: middle - k * std_dev,
        });
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
    fn bollinger_empty_input() {
        assert!(calculate_bollinger(&[], 20, 2.0).is_empty());
    }

    #[test]
    fn bollinger_period_zero() {
        let out = calculate_bollinger(&[1.0, 2.0, 3.0], 0, 2.0);
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn bollinger_insufficient_data() {
        let out = calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn bollinger_warmup_then_values() {
        let closes: Vec<f64> = (1..=25).map(|x| x as f64).collect();
        let out = calculate_bollinger(&closes, 20, 2.0);
        assert_eq!(out.len(), 25);
        for v in &out[..19] {
            assert!(v.is_none());
        }
        for v in &out[19..] {
            let bb = v.unwrap();
            assert!(bb.upper > bb.middle);
            assert!(bb.lower < bb.middle);
        }
    }

    #[test]
    fn bollinger_band_symmetry() {
        // (upper + lower) / 2 == middle for every valid index.
        let closes = vec![
            100.0, 101.0, 99.0, 102.0, 98.0, 103.0, 97.0, 104.0, 96.0, 105.0,
            100.5, 101.5, 99.5, 102.5, 98.5, 103.5, 97.5, 104.5, 96.5, 105.5,
            101.0, 100.0, 102.0, 99.0, 101.5,
        ];
        let out = calculate_bollinger(&closes, 20, 2.0);
        for v in out.iter().flatten() {
            assert!(((v.upper + v.lower) / 2.0 - v.middle).abs() < 1e-9);
        }
    }

    #[test]
    fn bollinger_flat_window_collapses() {
        let out = calculate_bollinger(&vec![100.0; 20], 20, 2.0);
        let bb = out[19].unwrap();
        assert!((bb.upper - 100.0).abs() < 1e-12);
        assert!((bb.middle - 100.0).abs() < 1e-12);
        assert!((bb.lower - 100.0).abs() < 1e-12);
    }

    #[test]
    fn bollinger_uses_population_variance() {
        // Window [1, 2, 3], period 3, k 1:
        // middle = 2, variance = ((1)^2 + 0 + (1)^2) / 3 = 2/3
        let out = calculate_bollinger(&[1.0, 2.0, 3.0], 3, 1.0);
        let bb = out[2].unwrap();
        let sigma = (2.0_f64 / 3.0).sqrt();
        assert!((bb.upper - (2.0 + sigma)).abs() < 1e-12);
        assert!((bb.lower - (2.0 - sigma)).abs() < 1e-12);
    }
}
