use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ohlcv_chart_core::buckets::IntervalBuckets;
use ohlcv_chart_core::candle::Candle;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::OhlcProvider;

const CRYPTOWATCH_API_URL: &str = "https://api.cryptowat.ch";
const DEFAULT_EXCHANGE: &str = "kraken";

/// Cryptowatch-style OHLC endpoint: `{base}/markets/{exchange}/{pair}/ohlc`.
/// The interval is left out of the request so every granularity comes back
/// and the caller can pick one.
pub struct CryptowatchProvider {
    client: Client,
    base_url: String,
    exchange: String,
}

impl CryptowatchProvider {
    pub fn new() -> Self {
        Self::with_base_url(CRYPTOWATCH_API_URL.to_string())
    }

    /// Create with a custom base URL (for testing).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
        }
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    pub fn ohlc_url(&self, pair: &str) -> String {
        format!(
            "{}/markets/{}/{}/ohlc",
            self.base_url,
            self.exchange,
            pair.to_lowercase()
        )
    }
}

impl Default for CryptowatchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct CryptowatchResponse {
    result: Option<BTreeMap<String, Vec<Vec<Option<f64>>>>>,
    error: Option<String>,
}

fn f64_to_decimal(val: f64) -> Result<Decimal, ProviderError> {
    Decimal::try_from(val).map_err(|e| ProviderError::Parse(format!("invalid decimal value: {e}")))
}

/// Turn one `[time, open, high, low, close, volume, ...]` row into a candle.
/// Rows with a missing price are skipped; fields past the sixth are ignored.
fn parse_row(row: &[Option<f64>]) -> Result<Option<Candle>, ProviderError> {
    if row.len() < 6 {
        return Err(ProviderError::Parse(format!(
            "expected at least 6 fields per candle, got {}",
            row.len()
        )));
    }

    let ts = row[0].ok_or_else(|| ProviderError::Parse("missing candle time".into()))? as i64;
    let timestamp = Utc
        .timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| ProviderError::Parse(format!("invalid unix timestamp: {ts}")))?;

    let mut prices = [Decimal::ZERO; 4];
    for (slot, value) in prices.iter_mut().zip(&row[1..5]) {
        match value {
            Some(v) => *slot = f64_to_decimal(*v)?,
            None => return Ok(None),
        }
    }
    let [open, high, low, close] = prices;
    let volume = match row[5] {
        Some(v) => f64_to_decimal(v)?,
        None => Decimal::ZERO,
    };

    Ok(Some(Candle {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    }))
}

fn parse_cryptowatch_response(body: CryptowatchResponse) -> Result<IntervalBuckets, ProviderError> {
    if let Some(error) = body.error {
        return Err(ProviderError::Api {
            status: 0,
            message: error,
        });
    }

    let result = body
        .result
        .ok_or_else(|| ProviderError::Parse("no result in response".into()))?;

    let mut buckets = IntervalBuckets::new();
    for (label, rows) in result {
        let mut candles = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(candle) = parse_row(row)? {
                candles.push(candle);
            }
        }
        debug!("interval {label}: {} candle(s)", candles.len());
        buckets.insert(label, candles);
    }

    Ok(buckets)
}

#[async_trait]
impl OhlcProvider for CryptowatchProvider {
    fn name(&self) -> &str {
        "cryptowatch"
    }

    async fn fetch_buckets(
        &self,
        pair: &str,
        after: i64,
        before: i64,
    ) -> Result<IntervalBuckets, ProviderError> {
        let response = self
            .client
            .get(self.ohlc_url(pair))
            .query(&[("before", before), ("after", after)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 60,
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status,
                message: body,
            });
        }

        let body: CryptowatchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("failed to parse response: {e}")))?;

        parse_cryptowatch_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response on a local port. The task resolves to
    /// the request line the client sent.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            let request = String::from_utf8_lossy(&request);
            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{addr}"), handle)
    }

    fn parse(json: &str) -> Result<IntervalBuckets, ProviderError> {
        let response: CryptowatchResponse = serde_json::from_str(json).unwrap();
        parse_cryptowatch_response(response)
    }

    #[test]
    fn parse_all_intervals() {
        let json = r#"{
            "result": {
                "60": [
                    [1614556860, 40100.5, 40200.0, 40050.1, 40150.2, 1.25, 50187.75],
                    [1614556800, 40000.0, 40120.0, 39990.0, 40100.5, 2.5, 100251.25]
                ],
                "3600": [
                    [1614556800, 40000.0, 40500.0, 39800.0, 40300.0, 42.0, 1692600.0]
                ],
                "86400": []
            },
            "allowance": { "cost": 0.015, "remaining": 9.985 }
        }"#;

        let buckets = parse(json).unwrap();
        assert_eq!(buckets.len(), 3);

        let minute = buckets.get("60").unwrap();
        assert_eq!(minute.len(), 2);
        // sorted ascending on insert
        assert_eq!(minute[0].timestamp.timestamp(), 1614556800);
        assert_eq!(minute[1].volume, dec!(1.25));
        assert!(minute[0].close > dec!(40100) && minute[0].close < dec!(40101));

        assert!(buckets.get("86400").unwrap().is_empty());
    }

    #[test]
    fn rows_with_null_prices_are_skipped() {
        let json = r#"{
            "result": {
                "300": [
                    [1614556800, 1.0, 1.1, 0.9, 1.05, 10.0],
                    [1614557100, null, null, null, null, null],
                    [1614557400, 1.05, 1.2, 1.0, 1.1, null]
                ]
            }
        }"#;

        let buckets = parse(json).unwrap();
        let candles = buckets.get("300").unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].volume, Decimal::ZERO);
    }

    #[test]
    fn short_rows_are_rejected() {
        let json = r#"{ "result": { "60": [[1614556800, 1.0, 1.1, 0.9]] } }"#;
        assert!(matches!(parse(json), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn api_error_body() {
        let json = r#"{ "error": "Instrument not found" }"#;
        match parse(json) {
            Err(ProviderError::Api { message, .. }) => assert_eq!(message, "Instrument not found"),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn missing_result_is_parse_error() {
        assert!(matches!(parse("{}"), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn ohlc_url_layout() {
        let provider = CryptowatchProvider::with_base_url("http://localhost:8080/".into())
            .with_exchange("bitstamp");
        assert_eq!(
            provider.ohlc_url("BTCEUR"),
            "http://localhost:8080/markets/bitstamp/btceur/ohlc"
        );
        assert_eq!(
            CryptowatchProvider::new().ohlc_url("btceur"),
            "https://api.cryptowat.ch/markets/kraken/btceur/ohlc"
        );
    }

    #[test]
    fn f64_to_decimal_converts() {
        let result = f64_to_decimal(40100.5).unwrap();
        assert_eq!(result, dec!(40100.5));
    }

    #[tokio::test]
    async fn fetch_sends_bounds_and_parses_buckets() {
        let body = r#"{ "result": { "3600": [[1614556800, 40000.0, 40500.0, 39800.0, 40300.0, 42.0, 1692600.0]] } }"#;
        let (base, server) = serve_once("200 OK", body).await;

        let provider = CryptowatchProvider::with_base_url(base);
        let buckets = provider
            .fetch_buckets("BTCEUR", 1614556800, 1614643200)
            .await
            .unwrap();
        assert_eq!(buckets.get("3600").unwrap()[0].close, dec!(40300));

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /markets/kraken/btceur/ohlc?"));
        assert!(request_line.contains("before=1614643200"));
        assert!(request_line.contains("after=1614556800"));
    }

    #[tokio::test]
    async fn fetch_maps_server_error_status() {
        let (base, server) = serve_once("500 Internal Server Error", "upstream down").await;

        let result = CryptowatchProvider::with_base_url(base)
            .fetch_buckets("btceur", 0, 60)
            .await;
        match result {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn fetch_maps_too_many_requests() {
        let (base, server) = serve_once("429 Too Many Requests", "{}").await;

        let result = CryptowatchProvider::with_base_url(base)
            .fetch_buckets("btceur", 0, 60)
            .await;
        assert!(matches!(
            result,
            Err(ProviderError::RateLimited {
                retry_after_secs: 60
            })
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn fetch_rejects_malformed_body() {
        let (base, server) = serve_once("200 OK", "not json").await;

        let result = CryptowatchProvider::with_base_url(base)
            .fetch_buckets("btceur", 0, 60)
            .await;
        assert!(matches!(result, Err(ProviderError::Parse(_))));
        server.await.unwrap();
    }

    #[test]
    fn selection_counts_only_usable_rows() {
        let rows = |n: usize, nulls: usize| {
            let mut rows: Vec<String> = (0..n)
                .map(|i| format!("[{}, 1.0, 1.1, 0.9, 1.05, 1.0]", 1614556800 + i * 60))
                .collect();
            for row in rows.iter_mut().take(nulls) {
                *row = "[1614556800, null, null, null, null, null]".to_string();
            }
            rows.join(",")
        };
        // "60" has 502 rows but only 500 usable ones, so it does not clear the
        // target and the smaller qualifying "300" bucket wins.
        let json = format!(
            r#"{{ "result": {{ "60": [{}], "300": [{}] }} }}"#,
            rows(502, 2),
            rows(501, 0)
        );

        let mut buckets = parse(&json).unwrap();
        assert_eq!(buckets.get("60").unwrap().len(), 500);

        let (label, candles) = buckets.take_optimal(None).unwrap();
        assert_eq!(label, "300");
        assert_eq!(candles.len(), 501);
    }
}
