use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use common::{BatchReport, Evaluation, MarketDataSource, PairFailure, PairId};
use strategy::TradeEvaluator;

/// Reference pool width; also the effective rate limit against the exchange.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Fans the evaluator out over a set of pairs with bounded concurrency.
///
/// Each pair runs in its own task. Errors and panics stay inside that task
/// and come back as a `PairFailure`; siblings are never affected.
pub struct BatchCoordinator {
    source: Arc<dyn MarketDataSource>,
    evaluator: Arc<TradeEvaluator>,
    concurrency: usize,
}

impl BatchCoordinator {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        evaluator: Arc<TradeEvaluator>,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            evaluator,
            concurrency: concurrency.max(1),
        }
    }

    /// Evaluate every pair and partition the outcomes.
    ///
    /// Completes once every dispatched evaluation has returned. Dropping the
    /// returned future aborts whatever is still in flight.
    pub async fn run(&self, pairs: Vec<PairId>) -> BatchReport {
        let mut report = BatchReport {
            universe: pairs.len(),
            ..BatchReport::default()
        };
        info!(pairs = report.universe, concurrency = self.concurrency, "Batch started");

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for pair in pairs {
            let permits = permits.clone();
            let source = self.source.clone();
            let evaluator = self.evaluator.clone();
            tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => evaluate_isolated(&evaluator, source.as_ref(), &pair).await,
                    Err(_) => Err("worker pool closed".to_string()),
                };
                (pair, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(evaluation))) => report.push(evaluation),
                Ok((pair, Err(e))) => {
                    warn!(pair = %pair, error = %e, "Pair evaluation failed, dropping pair");
                    report.failures.push(PairFailure { pair, error: e });
                }
                Err(e) => error!(error = %e, "Evaluation task aborted"),
            }
        }

        report.sort();
        info!(
            signals = report.signals.len(),
            rejections = report.rejections.len(),
            failures = report.failures.len(),
            "Batch complete"
        );
        report
    }
}

async fn evaluate_isolated(
    evaluator: &TradeEvaluator,
    source: &dyn MarketDataSource,
    pair: &PairId,
) -> Result<Evaluation, String> {
    match AssertUnwindSafe(evaluator.evaluate(source, pair))
        .catch_unwind()
        .await
    {
        Ok(Ok(evaluation)) => Ok(evaluation),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("evaluation panicked: {detail}")
}
