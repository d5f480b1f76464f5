use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use common::{
    AssetPairInfo, Candle, Error, MarketDataSource, PairId, QuoteSeries, Result, TickerSnapshot,
};

/// Client for Kraken's public REST market-data endpoints. No credentials needed.
pub struct KrakenClient {
    base_url: String,
    http: Client,
}

impl KrakenClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .user_agent(concat!("krakenscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn public_get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/0/public/{path}", self.base_url);
        debug!(%url, ?query, "Kraken public request");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        decode_envelope(&body)
    }
}

#[async_trait]
impl MarketDataSource for KrakenClient {
    async fn asset_pairs(&self) -> Result<HashMap<PairId, AssetPairInfo>> {
        let raw: HashMap<String, RawAssetPair> = self.public_get("AssetPairs", &[]).await?;
        Ok(raw
            .into_iter()
            .map(|(id, p)| {
                (
                    PairId::new(id),
                    AssetPairInfo {
                        altname: p.altname,
                        wsname: p.wsname,
                        base: p.base,
                        quote: p.quote,
                    },
                )
            })
            .collect())
    }

    async fn ohlc(&self, pair: &PairId, interval_minutes: u32) -> Result<QuoteSeries> {
        let interval = interval_minutes.to_string();
        let result: HashMap<String, Value> = self
            .public_get("OHLC", &[("pair", pair.as_str()), ("interval", interval.as_str())])
            .await?;
        parse_ohlc(pair, interval_minutes, &result)
    }

    async fn ticker(&self, pair: &PairId) -> Result<TickerSnapshot> {
        let result: HashMap<String, RawTicker> =
            self.public_get("Ticker", &[("pair", pair.as_str())]).await?;
        parse_ticker(pair, result)
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

/// Every Kraken response wraps its payload as `{"error": [...], "result": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

#[derive(Deserialize)]
struct RawAssetPair {
    #[serde(default)]
    altname: String,
    wsname: Option<String>,
    #[serde(default)]
    base: String,
    #[serde(default)]
    quote: String,
}

#[derive(Deserialize)]
struct RawTicker {
    /// Last trade closed: [price, lot volume]
    c: Vec<String>,
    /// Volume: [today, last 24 hours]
    v: Vec<String>,
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
    if !envelope.error.is_empty() {
        return Err(Error::Exchange(envelope.error.join("; ")));
    }
    envelope
        .result
        .ok_or_else(|| Error::Decode("response has no result".into()))
}

/// The OHLC result holds one array keyed by the pair name plus a `last` cursor.
/// A result without any candle array yields an empty series.
fn parse_ohlc(
    pair: &PairId,
    interval_minutes: u32,
    result: &HashMap<String, Value>,
) -> Result<QuoteSeries> {
    let rows = result
        .iter()
        .filter(|(key, _)| key.as_str() != "last")
        .find_map(|(_, v)| v.as_array());

    let candles = match rows {
        Some(rows) => rows
            .iter()
            .map(parse_candle_row)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(QuoteSeries::new(pair.clone(), interval_minutes, candles))
}

// [time, open, high, low, close, vwap, volume, count]
fn parse_candle_row(row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .filter(|f| f.len() >= 7)
        .ok_or_else(|| Error::Decode(format!("malformed OHLC row: {row}")))?;

    let secs = fields[0]
        .as_i64()
        .ok_or_else(|| Error::Decode(format!("OHLC row has no timestamp: {row}")))?;
    let timestamp = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Decode(format!("OHLC timestamp out of range: {secs}")))?;

    Ok(Candle {
        timestamp,
        open: number(&fields[1])?,
        high: number(&fields[2])?,
        low: number(&fields[3])?,
        close: number(&fields[4])?,
        volume: number(&fields[6])?,
    })
}

/// Kraken encodes prices as decimal strings; accept plain numbers too.
fn number(value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => decimal(s),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Decode(format!("not a number: {n}"))),
        other => Err(Error::Decode(format!("not a number: {other}"))),
    }
}

fn decimal(s: &str) -> Result<f64> {
    s.parse()
        .map_err(|_| Error::Decode(format!("not a number: '{s}'")))
}

fn parse_ticker(pair: &PairId, result: HashMap<String, RawTicker>) -> Result<TickerSnapshot> {
    let info = result
        .into_values()
        .next()
        .ok_or_else(|| Error::Decode(format!("ticker response for {pair} is empty")))?;

    let last_price = info
        .c
        .first()
        .ok_or_else(|| Error::Decode("ticker has no last trade".into()))?;
    let volume_24h = info
        .v
        .get(1)
        .ok_or_else(|| Error::Decode("ticker has no 24h volume".into()))?;

    Ok(TickerSnapshot {
        pair: pair.clone(),
        last_price: decimal(last_price)?,
        volume_24h: decimal(volume_24h)?,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_errors_become_exchange_errors() {
        let err = decode_envelope::<Value>(r#"{"error":["EQuery:Unknown asset pair"]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Exchange(ref m) if m == "EQuery:Unknown asset pair"));
    }

    #[test]
    fn envelope_without_result_is_decode_error() {
        let err = decode_envelope::<Value>(r#"{"error":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(matches!(decode_envelope::<Value>("<html>"), Err(Error::Decode(_))));
    }

    #[test]
    fn ohlc_rows_are_decoded_and_last_cursor_ignored() {
        let result: HashMap<String, Value> = serde_json::from_value(json!({
            "XXBTZUSD": [
                [1700000900, "101.0", "102.5", "100.5", "102.0", "101.7", "12.5", 40],
                [1700000000, "100.0", "101.0", "99.5", "101.0", "100.4", "8.25", 31]
            ],
            "last": 1700000900
        }))
        .unwrap();
        let series = parse_ohlc(&"XXBTZUSD".into(), 15, &result).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![101.0, 102.0]);
        assert_eq!(series.candles()[1].volume, 12.5);
        assert_eq!(series.candles()[0].timestamp.timestamp(), 1700000000);
    }

    #[test]
    fn missing_candle_array_is_an_empty_series() {
        let result: HashMap<String, Value> =
            serde_json::from_value(json!({ "last": 1700000900 })).unwrap();
        let series = parse_ohlc(&"XXBTZUSD".into(), 15, &result).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn malformed_row_is_decode_error() {
        let result: HashMap<String, Value> =
            serde_json::from_value(json!({ "XXBTZUSD": [[1700000000, "abc", "1", "1", "1", "1", "1", 1]] }))
                .unwrap();
        assert!(matches!(
            parse_ohlc(&"XXBTZUSD".into(), 15, &result),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn ticker_reads_last_trade_and_rolling_volume() {
        let result: HashMap<String, RawTicker> = serde_json::from_value(json!({
            "SOLUSD": {
                "a": ["150.1", "1", "1.000"],
                "c": ["150.05", "0.5"],
                "v": ["1200.5", "250000.75"]
            }
        }))
        .unwrap();
        let ticker = parse_ticker(&"SOLUSD".into(), result).unwrap();
        assert_eq!(ticker.last_price, 150.05);
        assert_eq!(ticker.volume_24h, 250000.75);
    }
}
