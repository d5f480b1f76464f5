use std::sync::Arc;

use tracing::info;

use common::{BatchReport, MarketDataSource, Result};
use strategy::{RuleConfig, TradeEvaluator};

use crate::catalog::CatalogResolver;
use crate::coordinator::BatchCoordinator;

/// One full scan: resolve the catalog, then evaluate every eligible pair.
pub struct Scanner {
    source: Arc<dyn MarketDataSource>,
    resolver: CatalogResolver,
    coordinator: BatchCoordinator,
}

impl Scanner {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        rules: RuleConfig,
        interval_minutes: u32,
        concurrency: usize,
    ) -> Self {
        let resolver = CatalogResolver::new(&rules.excluded_bases);
        let evaluator = Arc::new(TradeEvaluator::new(rules, interval_minutes));
        let coordinator = BatchCoordinator::new(source.clone(), evaluator, concurrency);
        Self {
            source,
            resolver,
            coordinator,
        }
    }

    /// Run the scan. Only a catalog failure is returned as an error; per-pair
    /// problems are recorded inside the report.
    pub async fn run(&self) -> Result<BatchReport> {
        let pairs = self.resolver.resolve(self.source.as_ref()).await?;
        let report = self.coordinator.run(pairs).await;
        info!(
            universe = report.universe,
            signals = report.signals.len(),
            "Scan finished"
        );
        Ok(report)
    }
}
