use super::rolling::rolling_mean_opt;

/// Stochastic oscillator %K.
///
/// Raw %K places each close within the high-low range of the trailing
/// `window` candles (0 = at the low, 100 = at the high). The reported %K is a
/// simple moving average of raw %K over `smoothing` positions.
/// A window with zero range is undefined.
#[derive(Debug, Clone)]
pub struct StochasticIndicator {
    pub window: usize,
    pub smoothing: usize,
}

impl StochasticIndicator {
    pub fn new(window: usize, smoothing: usize) -> Self {
        assert!(window >= 1, "Stochastic window must be >= 1");
        assert!(smoothing >= 1, "Stochastic smoothing must be >= 1");
        Self { window, smoothing }
    }

    /// Compute smoothed %K. All three slices must have equal length.
    pub fn k_series(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<Option<f64>> {
        let n = closes.len().min(highs.len()).min(lows.len());
        let mut raw = vec![None; closes.len()];

        for i in (self.window.saturating_sub(1))..n {
            let start = i + 1 - self.window;
            let highest = highs[start..=i].iter().copied().fold(f64::MIN, f64::max);
            let lowest = lows[start..=i].iter().copied().fold(f64::MAX, f64::min);
            let range = highest - lowest;
            if range > 0.0 {
                raw[i] = Some(100.0 * (closes[i] - lowest) / range);
            }
        }

        rolling_mean_opt(&raw, self.smoothing)
    }
}
