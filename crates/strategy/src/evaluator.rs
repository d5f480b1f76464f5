use tracing::debug;

use common::{
    Evaluation, MarketDataSource, PairId, RejectionReason, RejectionReport, Result, Signal,
    TickerSnapshot,
};

use crate::config::RuleConfig;
use crate::indicators::{IndicatorError, IndicatorSet};

/// Applies the oversold-rebound rule set to one pair.
///
/// Holds no state between calls; one instance is shared by every worker.
#[derive(Debug, Clone)]
pub struct TradeEvaluator {
    rules: RuleConfig,
    interval_minutes: u32,
}

impl TradeEvaluator {
    pub fn new(rules: RuleConfig, interval_minutes: u32) -> Self {
        Self {
            rules,
            interval_minutes,
        }
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Fetch data for `pair` and evaluate it.
    ///
    /// Returns `Err` only when the candle fetch fails. A series that is too
    /// short is a rejection, and a failed ticker fetch becomes a rejection reason.
    pub async fn evaluate(
        &self,
        source: &dyn MarketDataSource,
        pair: &PairId,
    ) -> Result<Evaluation> {
        let series = source.ohlc(pair, self.interval_minutes).await?;

        let indicators = match IndicatorSet::compute(&series, &self.rules) {
            Ok(set) => set,
            Err(IndicatorError::InsufficientData { have, need }) => {
                debug!(pair = %pair, candles = have, required = need, "Insufficient candle history");
                return Ok(Evaluation::Rejected(RejectionReport {
                    pair: pair.clone(),
                    reasons: vec![RejectionReason::InsufficientData {
                        candles: have,
                        required: need,
                    }],
                }));
            }
        };

        let ticker = source.ticker(pair).await;
        Ok(self.assess(pair, &indicators, ticker))
    }

    /// Run every check against precomputed indicators. Checks do not
    /// short-circuit: each failing one adds its own reason.
    pub fn assess(
        &self,
        pair: &PairId,
        ind: &IndicatorSet,
        ticker: Result<TickerSnapshot>,
    ) -> Evaluation {
        let rules = &self.rules;
        let mut reasons = Vec::new();

        match (ind.rsi, ind.stoch_k) {
            (Some(rsi), Some(stoch_k)) => {
                if rsi >= rules.rsi_oversold {
                    reasons.push(RejectionReason::RsiNotOversold {
                        rsi,
                        threshold: rules.rsi_oversold,
                    });
                }
                if stoch_k >= rules.stoch_oversold {
                    reasons.push(RejectionReason::StochNotOversold {
                        stoch_k,
                        threshold: rules.stoch_oversold,
                    });
                }
            }
            _ => reasons.push(RejectionReason::NoRsiOrStoch),
        }

        match ticker {
            Ok(t) => {
                let in_band = rules.min_price < t.last_price && t.last_price < rules.max_price;
                if !in_band || t.volume_24h <= rules.min_volume_24h {
                    reasons.push(RejectionReason::NotReboundCandidate {
                        last_price: t.last_price,
                        volume_24h: t.volume_24h,
                    });
                }
            }
            Err(e) => reasons.push(RejectionReason::TickerUnavailable(e.to_string())),
        }

        let supported = ind
            .recent_low
            .is_some_and(|low| near_support(ind.entry, low, rules.support_tolerance));
        if !supported {
            reasons.push(RejectionReason::NotNearSupport {
                entry: ind.entry,
                recent_low: ind.recent_low,
            });
        }

        let move_check = ind
            .target_mean
            .map(|target| MoveCheck::new(ind.entry, target, rules.min_move()));
        match move_check {
            Some(check) if !check.passes() => reasons.push(RejectionReason::InsufficientMove {
                actual_move: check.actual_move,
                min_move: check.min_move,
            }),
            Some(_) => {}
            None => reasons.push(RejectionReason::NoTargetMean),
        }

        match (reasons.is_empty(), ind.rsi, ind.stoch_k, ind.target_mean, move_check) {
            (true, Some(rsi), Some(stoch_k), Some(target), Some(check)) => {
                let entry = ind.entry;
                let signal = Signal {
                    pair: pair.clone(),
                    entry,
                    target,
                    stop: entry - (target - entry) / 2.0,
                    rsi,
                    stoch_k,
                    expected_move_pct: round2(check.actual_move * 100.0),
                };
                debug!(pair = %pair, rsi, stoch_k, entry, target, "Pair accepted");
                Evaluation::Accepted(signal)
            }
            _ => {
                debug!(pair = %pair, reasons = reasons.len(), "Pair rejected");
                Evaluation::Rejected(RejectionReport {
                    pair: pair.clone(),
                    reasons,
                })
            }
        }
    }
}

/// True when `entry` sits within `tolerance` (a multiplier, e.g. 1.07) of the rolling low.
pub fn near_support(entry: f64, recent_low: f64, tolerance: f64) -> bool {
    entry <= recent_low * tolerance
}

/// Expected relative move from entry to target against the fee-adjusted minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCheck {
    pub actual_move: f64,
    pub min_move: f64,
}

impl MoveCheck {
    pub fn new(entry: f64, target: f64, min_move: f64) -> Self {
        let actual_move = if entry > 0.0 {
            (target - entry) / entry
        } else {
            0.0
        };
        Self {
            actual_move,
            min_move,
        }
    }

    pub fn passes(&self) -> bool {
        self.actual_move > self.min_move
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
