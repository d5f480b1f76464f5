use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Error, Result};

/// Thresholds for the oversold-rebound rule set (TOML).
///
/// Every field is optional in the file; omitted fields keep their defaults.
///
/// Example `config/rules.toml`:
/// ```toml
/// rsi_oversold = 25.0
/// min_volume_24h = 250000.0
/// taker_fee = 0.004
/// excluded_bases = ["USD", "USDT", "EUR"]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub stoch_window: usize,
    pub stoch_smoothing: usize,
    pub stoch_oversold: f64,
    /// Candles in the rolling-low window used as support.
    pub support_window: usize,
    /// Entry may sit at most this multiple above the rolling low.
    pub support_tolerance: f64,
    /// Candles in the rolling-mean window used as the reversion target.
    pub target_window: usize,
    pub min_candles: usize,
    /// Last price must be strictly above this.
    pub min_price: f64,
    /// Last price must be strictly below this.
    pub max_price: f64,
    /// 24h volume must be strictly above this (base units).
    pub min_volume_24h: f64,
    pub maker_fee: f64,
    pub taker_fee: f64,
    /// Fixed buffer added on top of round-trip fees.
    pub slippage: f64,
    /// Base assets treated as fiat or stablecoins and never scanned.
    pub excluded_bases: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30.0,
            stoch_window: 14,
            stoch_smoothing: 3,
            stoch_oversold: 20.0,
            support_window: 90,
            support_tolerance: 1.07,
            target_window: 20,
            min_candles: 20,
            min_price: 1.0,
            max_price: 500.0,
            min_volume_24h: 100_000.0,
            maker_fee: 0.002,
            taker_fee: 0.0035,
            slippage: 0.001,
            excluded_bases: [
                "USD", "USDT", "USDC", "EUR", "GBP", "DAI", "CHF", "CAD", "JPY", "TRY", "TUSD",
                "USDD", "UUSD", "GUSD",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl RuleConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read rule config at '{path}': {e}"))
        })?;
        let rules = Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("Failed to parse rule config at '{path}': {e}")))?;
        info!(path, "Loaded rule config");
        Ok(rules)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let rules: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Minimum relative move needed to clear fees and slippage.
    pub fn min_move(&self) -> f64 {
        self.maker_fee + self.taker_fee + self.slippage
    }

    pub fn validate(&self) -> Result<()> {
        if self.rsi_period < 2 {
            return Err(Error::Config("rsi_period must be >= 2".into()));
        }
        for (name, value) in [
            ("stoch_window", self.stoch_window),
            ("stoch_smoothing", self.stoch_smoothing),
            ("support_window", self.support_window),
            ("target_window", self.target_window),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be >= 1")));
            }
        }
        if self.min_price >= self.max_price {
            return Err(Error::Config(format!(
                "min_price ({}) must be below max_price ({})",
                self.min_price, self.max_price
            )));
        }
        if self.maker_fee < 0.0 || self.taker_fee < 0.0 || self.slippage < 0.0 {
            return Err(Error::Config("fees and slippage must be non-negative".into()));
        }
        if self.support_tolerance < 1.0 {
            return Err(Error::Config("support_tolerance must be >= 1.0".into()));
        }
        Ok(())
    }
}
