use std::time::Duration;

use common::{Error, MarketDataSource, PairId};
use engine::KrakenClient;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> KrakenClient {
    KrakenClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn asset_pairs_are_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/0/public/AssetPairs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": [],
            "result": {
                "XXBTZUSD": {
                    "altname": "XBTUSD",
                    "wsname": "XBT/USD",
                    "base": "XXBT",
                    "quote": "ZUSD",
                    "pair_decimals": 1
                },
                "USDTZUSD": {
                    "altname": "USDTZUSD",
                    "wsname": "USDT/USD",
                    "base": "USDT",
                    "quote": "ZUSD"
                }
            }
        })))
        .mount(&server)
        .await;

    let pairs = client(&server).asset_pairs().await.unwrap();
    assert_eq!(pairs.len(), 2);
    let xbt = &pairs[&PairId::from("XXBTZUSD")];
    assert_eq!(xbt.altname, "XBTUSD");
    assert_eq!(xbt.wsname.as_deref(), Some("XBT/USD"));
    assert_eq!(xbt.base, "XXBT");
}

#[tokio::test]
async fn ohlc_sends_pair_and_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/0/public/OHLC"))
        .and(query_param("pair", "SOLUSD"))
        .and(query_param("interval", "15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": [],
            "result": {
                "SOLUSD": [
                    [1700000000, "20.1", "20.5", "19.9", "20.3", "20.2", "1500.0", 12],
                    [1700000900, "20.3", "20.4", "20.0", "20.1", "20.2", "900.5", 8]
                ],
                "last": 1700000900
            }
        })))
        .mount(&server)
        .await;

    let series = client(&server).ohlc(&"SOLUSD".into(), 15).await.unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.interval_minutes(), 15);
    assert_eq!(series.closes(), vec![20.3, 20.1]);
}

#[tokio::test]
async fn ticker_reads_price_and_volume() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/0/public/Ticker"))
        .and(query_param("pair", "SOLUSD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": [],
            "result": {
                "SOLUSD": { "c": ["20.10", "3.2"], "v": ["5000.0", "120000.5"] }
            }
        })))
        .mount(&server)
        .await;

    let ticker = client(&server).ticker(&"SOLUSD".into()).await.unwrap();
    assert_eq!(ticker.last_price, 20.10);
    assert_eq!(ticker.volume_24h, 120000.5);
}

#[tokio::test]
async fn api_error_list_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/0/public/Ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": ["EQuery:Unknown asset pair"]
        })))
        .mount(&server)
        .await;

    let err = client(&server).ticker(&"NOPEUSD".into()).await.unwrap_err();
    assert!(matches!(err, Error::Exchange(ref m) if m.contains("Unknown asset pair")));
}

#[tokio::test]
async fn http_failure_status_is_an_exchange_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/0/public/AssetPairs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server).asset_pairs().await.unwrap_err();
    assert!(matches!(err, Error::Exchange(ref m) if m.contains("503")));
}

#[tokio::test]
async fn slow_upstream_hits_the_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/0/public/OHLC"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "error": [], "result": {} }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = KrakenClient::new(server.uri(), Duration::from_millis(200)).unwrap();
    let err = client.ohlc(&"SOLUSD".into(), 15).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}
