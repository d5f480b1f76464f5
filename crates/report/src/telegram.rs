use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::warn;

use common::{BatchReport, Error, Result, TelegramConfig};

use crate::{alert_text, ReportSink};

/// Pushes accepted signals to Telegram chats. Silent when nothing was accepted.
pub struct TelegramReporter {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl TelegramReporter {
    /// Returns `None` unless both a token and at least one chat id are configured.
    pub fn from_config(cfg: &TelegramConfig) -> Option<Self> {
        if !cfg.is_configured() {
            return None;
        }
        let token = cfg.token.clone()?;
        Some(Self {
            bot: Bot::new(token),
            chat_ids: cfg.chat_ids.iter().map(|&id| ChatId(id)).collect(),
        })
    }
}

#[async_trait]
impl ReportSink for TelegramReporter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, report: &BatchReport) -> Result<()> {
        if report.signals.is_empty() {
            return Ok(());
        }
        let text = alert_text(report);
        let sent = send_alert(&self.bot, &self.chat_ids, &text).await;
        if sent == 0 {
            return Err(Error::Notify("no Telegram chat accepted the alert".into()));
        }
        Ok(())
    }
}

/// Send a message to every chat id. Returns how many sends succeeded.
pub async fn send_alert(bot: &Bot, chat_ids: &[ChatId], message: &str) -> usize {
    let mut sent = 0;
    for &chat_id in chat_ids {
        match bot.send_message(chat_id, message).await {
            Ok(_) => sent += 1,
            Err(e) => warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert"),
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_requires_token_and_chats() {
        assert!(TelegramReporter::from_config(&TelegramConfig::default()).is_none());
        assert!(TelegramReporter::from_config(&TelegramConfig {
            token: Some("123:abc".into()),
            chat_ids: Vec::new(),
        })
        .is_none());

        let reporter = TelegramReporter::from_config(&TelegramConfig {
            token: Some("123:abc".into()),
            chat_ids: vec![42, -7],
        })
        .unwrap();
        assert_eq!(reporter.chat_ids, vec![ChatId(42), ChatId(-7)]);
    }

    #[tokio::test]
    async fn nothing_is_sent_without_signals() {
        let reporter = TelegramReporter::from_config(&TelegramConfig {
            token: Some("123:abc".into()),
            chat_ids: vec![42],
        })
        .unwrap();
        reporter.deliver(&BatchReport::default()).await.unwrap();
    }
}
