use std::fmt::Write as _;

use async_trait::async_trait;

use common::{BatchReport, Result};

use crate::{signal_line, ReportSink};

/// Prints the scan result to stdout.
pub struct ConsoleReporter {
    show_rejections: bool,
}

impl ConsoleReporter {
    pub fn new(show_rejections: bool) -> Self {
        Self { show_rejections }
    }

    pub fn render(&self, report: &BatchReport) -> String {
        let mut out = String::from("Oversold pairs:\n");
        if report.signals.is_empty() {
            out.push_str("  (none)\n");
        }
        for signal in &report.signals {
            let _ = writeln!(out, "  {}", signal_line(signal));
        }

        if self.show_rejections && !report.rejections.is_empty() {
            out.push_str("Rejected pairs:\n");
            for rejection in &report.rejections {
                let _ = writeln!(
                    out,
                    "  {}: {}",
                    rejection.pair,
                    rejection.reason_strings().join(", ")
                );
            }
        }

        if !report.failures.is_empty() {
            out.push_str("Failed pairs:\n");
            for failure in &report.failures {
                let _ = writeln!(out, "  {}: {}", failure.pair, failure.error);
            }
        }

        let _ = writeln!(
            out,
            "Scanned {} pairs: {} signals, {} rejected, {} failed",
            report.universe,
            report.signals.len(),
            report.rejections.len(),
            report.failures.len()
        );
        out
    }
}

#[async_trait]
impl ReportSink for ConsoleReporter {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, report: &BatchReport) -> Result<()> {
        print!("{}", self.render(report));
        Ok(())
    }
}
