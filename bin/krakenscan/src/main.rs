use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{KrakenClient, Scanner};
use report::{ConsoleReporter, EmailReporter, ReportSink, TelegramReporter};
use strategy::RuleConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid configuration")?;
    let rules = match &cfg.rules_config_path {
        Some(path) => RuleConfig::load(path)?,
        None => RuleConfig::default(),
    };
    info!(
        api = %cfg.kraken_api_url,
        interval = cfg.ohlc_interval_minutes,
        concurrency = cfg.scan_concurrency,
        "KrakenScan starting"
    );

    // ── Market data ───────────────────────────────────────────────────────────
    let client = KrakenClient::new(&cfg.kraken_api_url, cfg.http_timeout)?;
    let scanner = Scanner::new(
        Arc::new(client),
        rules,
        cfg.ohlc_interval_minutes,
        cfg.scan_concurrency,
    );

    // ── Reporting sinks ───────────────────────────────────────────────────────
    let mut sinks: Vec<Box<dyn ReportSink>> =
        vec![Box::new(ConsoleReporter::new(cfg.report_rejections))];
    if let Some(email) = EmailReporter::from_config(&cfg.email) {
        sinks.push(Box::new(email));
    }
    if let Some(telegram) = TelegramReporter::from_config(&cfg.telegram) {
        sinks.push(Box::new(telegram));
    }

    // ── Scan ──────────────────────────────────────────────────────────────────
    let batch = tokio::select! {
        result = scanner.run() => result.context("scan aborted")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Shutdown signal received. Abandoning scan.");
            return Ok(());
        }
    };

    let delivered = report::deliver_all(&sinks, &batch).await;
    info!(delivered, sinks = sinks.len(), "Run complete");
    Ok(())
}
