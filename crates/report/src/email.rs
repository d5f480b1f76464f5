use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

use common::{BatchReport, EmailConfig, Error, Result};

use crate::{alert_text, ReportSink};

const SUBJECT: &str = "Kraken Oversold Alert";
const RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Emails accepted signals through an unauthenticated SMTP relay.
/// Sends nothing when the scan produced no signals.
pub struct EmailReporter {
    cfg: EmailConfig,
}

impl EmailReporter {
    /// Returns `None` when email is disabled.
    pub fn from_config(cfg: &EmailConfig) -> Option<Self> {
        cfg.enabled.then(|| Self { cfg: cfg.clone() })
    }

    /// Full message (headers + body) with CRLF line endings, before dot-stuffing.
    pub fn compose(&self, report: &BatchReport, now: DateTime<Utc>) -> String {
        let body = format!("{}\nThis is an automated alert.\n", alert_text(report));
        let mut msg = format!(
            "From: {}\r\nTo: {}\r\nSubject: {SUBJECT}\r\nDate: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n",
            self.cfg.from,
            self.cfg.recipient,
            now.to_rfc2822()
        );
        for line in body.lines() {
            msg.push_str(line);
            msg.push_str("\r\n");
        }
        msg
    }
}

#[async_trait]
impl ReportSink for EmailReporter {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, report: &BatchReport) -> Result<()> {
        if report.signals.is_empty() {
            debug!("No signals, skipping email");
            return Ok(());
        }
        let message = self.compose(report, Utc::now());
        tokio::time::timeout(RELAY_TIMEOUT, send_via_relay(&self.cfg, &message))
            .await
            .map_err(|_| Error::Smtp("relay timed out".into()))??;
        info!(to = %self.cfg.recipient, relay = %self.cfg.relay_host, "Alert email sent");
        Ok(())
    }
}

async fn send_via_relay(cfg: &EmailConfig, message: &str) -> Result<()> {
    let stream = TcpStream::connect((cfg.relay_host.as_str(), cfg.relay_port))
        .await
        .map_err(|e| Error::Smtp(format!("connect {}:{}: {e}", cfg.relay_host, cfg.relay_port)))?;
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    expect(read_reply(&mut reader).await?, &[220], "greeting")?;
    command(&mut write, &mut reader, "EHLO krakenscan", &[250]).await?;
    command(&mut write, &mut reader, &format!("MAIL FROM:<{}>", cfg.from), &[250]).await?;
    command(&mut write, &mut reader, &format!("RCPT TO:<{}>", cfg.recipient), &[250, 251]).await?;
    command(&mut write, &mut reader, "DATA", &[354]).await?;

    write.write_all(dot_stuff(message).as_bytes()).await?;
    write.write_all(b".\r\n").await?;
    write.flush().await?;
    expect(read_reply(&mut reader).await?, &[250], "message body")?;

    // The message is already queued; a failed QUIT changes nothing
    let _ = command(&mut write, &mut reader, "QUIT", &[221]).await;
    Ok(())
}

async fn command<W, R>(write: &mut W, reader: &mut R, line: &str, accepted: &[u16]) -> Result<()>
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    write.write_all(line.as_bytes()).await?;
    write.write_all(b"\r\n").await?;
    write.flush().await?;
    expect(read_reply(reader).await?, accepted, line)
}

/// Read one possibly multi-line reply (`250-...` continuation lines) and return its code.
async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<u16> {
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(Error::Smtp("relay closed the connection".into()));
        }
        let code = line
            .get(..3)
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| Error::Smtp(format!("unexpected reply: {}", line.trim_end())))?;
        if line.as_bytes().get(3) != Some(&b'-') {
            return Ok(code);
        }
    }
}

fn expect(code: u16, accepted: &[u16], step: &str) -> Result<()> {
    if accepted.contains(&code) {
        Ok(())
    } else {
        Err(Error::Smtp(format!("relay answered {code} to {step}")))
    }
}

/// Escape body lines beginning with `.` so they are not read as end-of-data.
fn dot_stuff(message: &str) -> String {
    let mut out = String::with_capacity(message.len() + 8);
    for line in message.split_inclusive("\r\n") {
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
    }
    if !out.ends_with("\r\n") {
        out.push_str("\r\n");
    }
    out
}
