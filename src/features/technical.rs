//! Technical indicator helpers for daily price series
//!
//! Indicators return one value per input price; positions where the
//! indicator is not yet defined hold `NaN` and are filtered out when the
//! feature matrix is assembled.

/// Simple moving average over a rolling window
pub fn moving_average(prices: &[f64], window: usize) -> Vec<f64> {
    if prices.len() < window || window == 0 {
        return vec![f64::NAN; prices.len()];
    }

    let mut result = vec![f64::NAN; window - 1];
    for i in (window - 1)..prices.len() {
        let sum: f64 = prices[(i + 1 - window)..=i].iter().sum();
        result.push(sum / window as f64);
    }

    result
}

/// Relative Strength Index using rolling-mean gains and losses
///
/// Gains and losses are averaged with a plain rolling window rather than
/// Wilder smoothing, matching `100 - 100 / (1 + rs)` over window means.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let n = prices.len();
    if n < period + 1 || period == 0 {
        return vec![f64::NAN; n];
    }

    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = prices[i] - prices[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    let mut result = vec![f64::NAN; n];
    for i in period..n {
        let avg_gain: f64 = gains[(i + 1 - period)..=i].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[(i + 1 - period)..=i].iter().sum::<f64>() / period as f64;

        if avg_loss == 0.0 {
            result[i] = 100.0;
        } else {
            let rs = avg_gain / avg_loss;
            result[i] = 100.0 - 100.0 / (1.0 + rs);
        }
    }

    result
}

/// Daily returns (percentage change from the previous close)
pub fn returns(prices: &[f64]) -> Vec<f64> {
    if prices.is_empty() {
        return vec![];
    }

    let mut result = vec![f64::NAN];
    for i in 1..prices.len() {
        if prices[i - 1] != 0.0 {
            result.push((prices[i] - prices[i - 1]) / prices[i - 1] * 100.0);
        } else {
            result.push(f64::NAN);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = moving_average(&prices, 3);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!((result[2] - 2.0).abs() < 1e-10);
        assert!((result[4] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_bounds() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let result = rsi(&prices, 14);

        for val in result.iter().skip(14) {
            assert!(*val >= 0.0 && *val <= 100.0);
        }
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&prices, 14);
        assert!((result[19] - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_returns() {
        let prices = vec![100.0, 110.0, 104.5];
        let result = returns(&prices);

        assert!(result[0].is_nan());
        assert!((result[1] - 10.0).abs() < 1e-10);
        assert!((result[2] - (-5.0)).abs() < 1e-10);
    }
}
