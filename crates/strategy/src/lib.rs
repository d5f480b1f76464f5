pub mod config;
pub mod evaluator;
pub mod indicators;

pub use config::RuleConfig;
pub use evaluator::{near_support, MoveCheck, TradeEvaluator};
pub use indicators::{IndicatorError, IndicatorSet};
