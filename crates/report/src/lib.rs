pub mod console;
pub mod email;
pub mod telegram;

pub use console::ConsoleReporter;
pub use email::EmailReporter;
pub use telegram::TelegramReporter;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{info, warn};

use common::{BatchReport, Result, Signal};

/// Destination for a finished scan.
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, report: &BatchReport) -> Result<()>;
}

/// Deliver to every sink concurrently. A failing sink is logged and does not
/// affect the others. Returns the number of sinks that succeeded.
pub async fn deliver_all(sinks: &[Box<dyn ReportSink>], report: &BatchReport) -> usize {
    let results = join_all(sinks.iter().map(|s| async move { (s.name(), s.deliver(report).await) })).await;
    results
        .into_iter()
        .filter(|(name, result)| match result {
            Ok(()) => {
                info!(sink = %name, "Report delivered");
                true
            }
            Err(e) => {
                warn!(sink = %name, error = %e, "Report delivery failed");
                false
            }
        })
        .count()
}

/// One-line description of a signal, shared by every sink.
pub fn signal_line(signal: &Signal) -> String {
    format!(
        "{}: RSI={:.2}, StochK={:.2}, entry={}, target={:.4}, stop={:.4}, move={:.2}%",
        signal.pair,
        signal.rsi,
        signal.stoch_k,
        signal.entry,
        signal.target,
        signal.stop,
        signal.expected_move_pct
    )
}

/// Plain-text summary used as the body of push/email alerts.
pub fn alert_text(report: &BatchReport) -> String {
    let mut text = format!(
        "Oversold rebound candidates ({} of {} pairs):\n\n",
        report.signals.len(),
        report.universe
    );
    for signal in &report.signals {
        text.push_str(&signal_line(signal));
        text.push('\n');
    }
    text
}

#[cfg(test)]
pub(crate) mod fixtures {
    use common::{BatchReport, PairFailure, RejectionReason, RejectionReport, Signal};

    pub fn report() -> BatchReport {
        BatchReport {
            universe: 3,
            signals: vec![Signal {
                pair: "SOLUSD".into(),
                entry: 101.0,
                target: 105.75,
                stop: 98.625,
                rsi: 12.3456,
                stoch_k: 2.9,
                expected_move_pct: 4.7,
            }],
            rejections: vec![RejectionReport {
                pair: "ETHUSD".into(),
                reasons: vec![
                    RejectionReason::RsiNotOversold { rsi: 55.0, threshold: 30.0 },
                    RejectionReason::NotNearSupport { entry: 99.0, recent_low: Some(54.5) },
                ],
            }],
            failures: vec![PairFailure {
                pair: "ADAUSD".into(),
                error: "HTTP error: timeout".into(),
            }],
        }
    }
}
