pub mod rolling;
pub mod rsi;
pub mod stochastic;

pub use rolling::{rolling_mean, rolling_min};
pub use rsi::RsiIndicator;
pub use stochastic::StochasticIndicator;

use common::QuoteSeries;
use thiserror::Error;

use crate::config::RuleConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: {have} candles, need {need}")]
    InsufficientData { have: usize, need: usize },
}

/// Value at the second-to-last position of an aligned indicator series.
///
/// The newest candle is still forming, so every decision reads one candle back.
pub fn lagged(series: &[Option<f64>]) -> Option<f64> {
    series.len().checked_sub(2).and_then(|i| series[i])
}

/// Indicator readings for one pair, all taken at the lagged position.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    /// Close of the last completed candle.
    pub entry: f64,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    /// Lowest close over the support window.
    pub recent_low: Option<f64>,
    /// Mean close over the target window.
    pub target_mean: Option<f64>,
}

impl IndicatorSet {
    pub fn compute(series: &QuoteSeries, rules: &RuleConfig) -> Result<Self, IndicatorError> {
        let need = rules.min_candles.max(2);
        if series.len() < need {
            return Err(IndicatorError::InsufficientData {
                have: series.len(),
                need,
            });
        }

        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();

        let rsi = RsiIndicator::new(rules.rsi_period).series(&closes);
        let stoch = StochasticIndicator::new(rules.stoch_window, rules.stoch_smoothing)
            .k_series(&highs, &lows, &closes);

        Ok(Self {
            entry: closes[closes.len() - 2],
            rsi: lagged(&rsi),
            stoch_k: lagged(&stoch),
            recent_low: lagged(&rolling_min(&closes, rules.support_window)),
            target_mean: lagged(&rolling_mean(&closes, rules.target_window)),
        })
    }
}
