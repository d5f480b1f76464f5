use std::collections::HashMap;

use async_trait::async_trait;

use crate::{AssetPairInfo, PairId, QuoteSeries, Result, TickerSnapshot};

/// Read-only access to an exchange's public market data.
///
/// `KrakenClient` in `crates/engine` implements this against the REST API.
/// Tests substitute in-memory sources.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Every pair listed by the exchange, keyed by pair id.
    async fn asset_pairs(&self) -> Result<HashMap<PairId, AssetPairInfo>>;

    /// Candles for `pair` at the given interval, oldest first.
    /// May return fewer rows than the exchange usually serves.
    async fn ohlc(&self, pair: &PairId, interval_minutes: u32) -> Result<QuoteSeries>;

    /// Last trade price and rolling 24h volume for `pair`.
    async fn ticker(&self, pair: &PairId) -> Result<TickerSnapshot>;
}
