use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exchange identifier of a tradable pair (e.g. `XXBTZUSD`).
/// Opaque: compared by exact match only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(String);

impl PairId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PairId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PairId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Catalog entry for one listed pair, as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPairInfo {
    /// Alternate name, e.g. `XBTUSD`.
    pub altname: String,
    /// Display name, e.g. `XBT/USD`. Absent for some legacy pairs.
    pub wsname: Option<String>,
    /// Base asset code, e.g. `XXBT`.
    pub base: String,
    /// Quote asset code, e.g. `ZUSD`.
    pub quote: String,
}

/// One OHLC sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candles for a single pair, ordered oldest to newest.
/// Built once per fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSeries {
    pair: PairId,
    interval_minutes: u32,
    candles: Vec<Candle>,
}

impl QuoteSeries {
    pub fn new(pair: PairId, interval_minutes: u32, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        Self {
            pair,
            interval_minutes,
            candles,
        }
    }

    pub fn pair(&self) -> &PairId {
        &self.pair
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }
}

/// Ticker state for one pair at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub pair: PairId,
    pub last_price: f64,
    /// Base-asset volume over the last 24 hours.
    pub volume_24h: f64,
}

/// A pair that met every acceptance condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub pair: PairId,
    pub entry: f64,
    pub target: f64,
    pub stop: f64,
    pub rsi: f64,
    pub stoch_k: f64,
    /// Expected move to target in percent, rounded to 2 decimals.
    pub expected_move_pct: f64,
}

/// Why a pair was not accepted. `Display` renders the reported reason text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    InsufficientData { candles: usize, required: usize },
    NoRsiOrStoch,
    RsiNotOversold { rsi: f64, threshold: f64 },
    StochNotOversold { stoch_k: f64, threshold: f64 },
    TickerUnavailable(String),
    NotReboundCandidate { last_price: f64, volume_24h: f64 },
    NotNearSupport { entry: f64, recent_low: Option<f64> },
    NoTargetMean,
    InsufficientMove { actual_move: f64, min_move: f64 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InsufficientData { .. } => write!(f, "insufficient_data"),
            RejectionReason::NoRsiOrStoch => write!(f, "no_rsi_or_stoch"),
            RejectionReason::RsiNotOversold { rsi, threshold } => {
                write!(f, "rsi={rsi:.2} not < {threshold}")
            }
            RejectionReason::StochNotOversold { stoch_k, threshold } => {
                write!(f, "stoch_k={stoch_k:.2} not < {threshold}")
            }
            RejectionReason::TickerUnavailable(e) => write!(f, "ticker_unavailable: {e}"),
            RejectionReason::NotReboundCandidate { .. } => write!(f, "not_rebound_candidate"),
            RejectionReason::NotNearSupport { .. } => write!(f, "not_near_support"),
            RejectionReason::NoTargetMean => write!(f, "no_target_mean"),
            RejectionReason::InsufficientMove {
                actual_move,
                min_move,
            } => write!(
                f,
                "move={:.2}% < min_required={:.2}%",
                actual_move * 100.0,
                min_move * 100.0
            ),
        }
    }
}

/// A pair that failed at least one check, with every failing check listed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionReport {
    pub pair: PairId,
    pub reasons: Vec<RejectionReason>,
}

impl RejectionReport {
    /// Reasons rendered as their report strings.
    pub fn reason_strings(&self) -> Vec<String> {
        self.reasons.iter().map(|r| r.to_string()).collect()
    }
}

/// Outcome of evaluating one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    Accepted(Signal),
    Rejected(RejectionReport),
}

impl Evaluation {
    pub fn pair(&self) -> &PairId {
        match self {
            Evaluation::Accepted(s) => &s.pair,
            Evaluation::Rejected(r) => &r.pair,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Evaluation::Accepted(_))
    }
}

/// A pair dropped from the batch because its data could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub pair: PairId,
    pub error: String,
}

/// Aggregated result of one scan, handed to the reporting sinks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of pairs dispatched for evaluation.
    pub universe: usize,
    pub signals: Vec<Signal>,
    pub rejections: Vec<RejectionReport>,
    pub failures: Vec<PairFailure>,
}

impl BatchReport {
    /// Pairs that produced either a signal or a rejection.
    pub fn completed(&self) -> usize {
        self.signals.len() + self.rejections.len()
    }

    pub fn push(&mut self, evaluation: Evaluation) {
        match evaluation {
            Evaluation::Accepted(s) => self.signals.push(s),
            Evaluation::Rejected(r) => self.rejections.push(r),
        }
    }

    /// Sort every list by pair so output is stable across runs.
    pub fn sort(&mut self) {
        self.signals.sort_by(|a, b| a.pair.cmp(&b.pair));
        self.rejections.sort_by(|a, b| a.pair.cmp(&b.pair));
        self.failures.sort_by(|a, b| a.pair.cmp(&b.pair));
    }
}
