use std::time::Duration;

use crate::{Error, Result};

/// SMTP relay settings for the email reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailConfig {
    pub enabled: bool,
    pub from: String,
    pub recipient: String,
    pub relay_host: String,
    pub relay_port: u16,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from: "krakenscan@localhost".to_string(),
            recipient: String::new(),
            relay_host: String::new(),
            relay_port: 25,
        }
    }
}

/// Telegram alert settings. Alerts are sent only when both fields are set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub chat_ids: Vec<i64>,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.token.is_some() && !self.chat_ids.is_empty()
    }
}

/// Runtime configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Exchange
    pub kraken_api_url: String,
    pub http_timeout: Duration,

    // Scan
    pub ohlc_interval_minutes: u32,
    pub scan_concurrency: usize,
    /// Optional TOML file overriding the default rule thresholds.
    pub rules_config_path: Option<String>,

    // Reporting
    pub report_rejections: bool,
    pub email: EmailConfig,
    pub telegram: TelegramConfig,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = EmailConfig {
            enabled: parse_or(&lookup, "EMAIL_ENABLED", false)?,
            from: lookup("EMAIL_FROM").unwrap_or_else(|| EmailConfig::default().from),
            recipient: lookup("EMAIL_TO").unwrap_or_default(),
            relay_host: lookup("EMAIL_RELAY_HOST").unwrap_or_default(),
            relay_port: parse_or(&lookup, "EMAIL_RELAY_PORT", 25)?,
        };
        if email.enabled && (email.recipient.is_empty() || email.relay_host.is_empty()) {
            return Err(Error::Config(
                "EMAIL_ENABLED is set but EMAIL_TO or EMAIL_RELAY_HOST is missing".into(),
            ));
        }

        let chat_ids = match lookup("TELEGRAM_CHAT_IDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<i64>().map_err(|_| {
                        Error::Config(format!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{s}'"))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let scan_concurrency: usize = parse_or(&lookup, "SCAN_CONCURRENCY", 8)?;
        if scan_concurrency == 0 {
            return Err(Error::Config("SCAN_CONCURRENCY must be at least 1".into()));
        }

        Ok(Config {
            kraken_api_url: lookup("KRAKEN_API_URL")
                .unwrap_or_else(|| "https://api.kraken.com".to_string()),
            http_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 15)?),
            ohlc_interval_minutes: parse_or(&lookup, "OHLC_INTERVAL_MINUTES", 15)?,
            scan_concurrency,
            rules_config_path: lookup("RULES_CONFIG_PATH"),
            report_rejections: parse_or(&lookup, "REPORT_REJECTIONS", false)?,
            email,
            telegram: TelegramConfig {
                token: lookup("TELEGRAM_TOKEN").filter(|t| !t.is_empty()),
                chat_ids,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.kraken_api_url, "https://api.kraken.com");
        assert_eq!(cfg.ohlc_interval_minutes, 15);
        assert_eq!(cfg.scan_concurrency, 8);
        assert_eq!(cfg.http_timeout, Duration::from_secs(15));
        assert!(!cfg.email.enabled);
        assert_eq!(cfg.email.relay_port, 25);
        assert!(!cfg.telegram.is_configured());
    }

    #[test]
    fn email_requires_host_and_recipient() {
        let err = Config::from_lookup(lookup_from(&[("EMAIL_ENABLED", "true")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let cfg = Config::from_lookup(lookup_from(&[
            ("EMAIL_ENABLED", "true"),
            ("EMAIL_TO", "ops@example.com"),
            ("EMAIL_RELAY_HOST", "10.0.0.5"),
            ("EMAIL_RELAY_PORT", "2525"),
        ]))
        .unwrap();
        assert!(cfg.email.enabled);
        assert_eq!(cfg.email.relay_port, 2525);
    }

    #[test]
    fn telegram_chat_ids_are_parsed() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_TOKEN", "abc"),
            ("TELEGRAM_CHAT_IDS", "12, -34"),
        ]))
        .unwrap();
        assert_eq!(cfg.telegram.chat_ids, vec![12, -34]);
        assert!(cfg.telegram.is_configured());
    }

    #[test]
    fn malformed_values_are_config_errors() {
        for (key, value) in [
            ("SCAN_CONCURRENCY", "eight"),
            ("SCAN_CONCURRENCY", "0"),
            ("TELEGRAM_CHAT_IDS", "12,abc"),
            ("OHLC_INTERVAL_MINUTES", "-1"),
        ] {
            let result = Config::from_lookup(lookup_from(&[(key, value)]));
            assert!(matches!(result, Err(Error::Config(_))), "{key}={value} accepted");
        }
    }
}
