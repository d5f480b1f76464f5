use chrono::DateTime;
use common::{Candle, Evaluation, QuoteSeries, TickerSnapshot};
use proptest::prelude::*;
use strategy::indicators::{rolling_mean, rolling_min, RsiIndicator, StochasticIndicator};
use strategy::{IndicatorSet, RuleConfig, TradeEvaluator};

fn series_from(closes: &[f64], spread: f64) -> QuoteSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: DateTime::from_timestamp(i as i64 * 900, 0).unwrap(),
            open: close,
            high: close * (1.0 + spread),
            low: close * (1.0 - spread),
            close,
            volume: 1.0,
        })
        .collect();
    QuoteSeries::new("PROPUSD".into(), 15, candles)
}

proptest! {
    /// Every oscillator reading stays in [0, 100] and is aligned with its input.
    #[test]
    fn oscillators_are_bounded_and_aligned(
        closes in prop::collection::vec(0.01f64..10_000.0, 0..200),
        spread in 0.0001f64..0.05,
    ) {
        let highs: Vec<f64> = closes.iter().map(|c| c * (1.0 + spread)).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c * (1.0 - spread)).collect();

        let rsi = RsiIndicator::new(14).series(&closes);
        let stoch = StochasticIndicator::new(14, 3).k_series(&highs, &lows, &closes);
        prop_assert_eq!(rsi.len(), closes.len());
        prop_assert_eq!(stoch.len(), closes.len());

        for v in rsi.iter().chain(stoch.iter()).flatten() {
            prop_assert!((0.0..=100.0 + 1e-9).contains(v), "out of range: {}", v);
        }
        for (i, v) in rsi.iter().enumerate() {
            prop_assert_eq!(v.is_some(), i >= 14);
        }
    }

    /// Rolling aggregates bracket the window they summarize.
    #[test]
    fn rolling_min_never_exceeds_rolling_mean(
        closes in prop::collection::vec(0.01f64..10_000.0, 0..150),
        window in 1usize..30,
    ) {
        let mins = rolling_min(&closes, window);
        let means = rolling_mean(&closes, window);
        for (min, mean) in mins.iter().zip(means.iter()) {
            prop_assert_eq!(min.is_some(), mean.is_some());
            if let (Some(min), Some(mean)) = (min, mean) {
                prop_assert!(*min <= *mean + 1e-6);
            }
        }
    }

    /// A steadily rising, low-volatility market never looks oversold.
    #[test]
    fn rising_market_is_never_oversold(
        start in 1.0f64..1_000.0,
        step in 0.0005f64..0.01,
        len in 20usize..150,
    ) {
        let closes: Vec<f64> = (0..len).map(|i| start * (1.0 + step).powi(i as i32)).collect();
        let set = IndicatorSet::compute(&series_from(&closes, 0.0002), &RuleConfig::default()).unwrap();
        prop_assert!(set.rsi.unwrap() > 50.0);
        prop_assert!(set.stoch_k.unwrap() > 50.0);
    }

    /// Exactly one of signal / non-empty rejection is produced for any input.
    #[test]
    fn every_evaluation_has_exactly_one_outcome(
        closes in prop::collection::vec(1.0f64..400.0, 20..120),
        last_price in 0.1f64..1_000.0,
        volume_24h in 0.0f64..1_000_000.0,
    ) {
        let evaluator = TradeEvaluator::new(RuleConfig::default(), 15);
        let series = series_from(&closes, 0.01);
        let set = IndicatorSet::compute(&series, evaluator.rules()).unwrap();
        let ticker = Ok(TickerSnapshot { pair: "PROPUSD".into(), last_price, volume_24h });
        match evaluator.assess(&"PROPUSD".into(), &set, ticker) {
            Evaluation::Accepted(signal) => {
                prop_assert!(signal.target > signal.entry);
                prop_assert!(signal.stop < signal.entry);
            }
            Evaluation::Rejected(report) => prop_assert!(!report.reasons.is_empty()),
        }
    }
}
