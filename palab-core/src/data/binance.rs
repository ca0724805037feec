//! Binance spot klines provider.
//!
//! Fetches candles from the public `/api/v3/klines` endpoint (no API key).
//! Each kline is an array: `[open_time, open, high, low, close, volume,
//! close_time, ...]` with prices and volume encoded as decimal strings.

use super::provider::{CandleProvider, DataError};
use crate::domain::{Candle, Timeframe};
use serde_json::Value;
use std::time::Duration;

/// Public Binance REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance spot candle provider.
pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the klines request for a symbol, interval and count. Query
    /// parameters are percent-encoded by the client.
    fn klines_request(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(format!("{}/api/v3/klines", self.base_url))
            .query(&[("symbol", symbol), ("interval", timeframe.interval())])
            .query(&[("limit", limit)])
    }
}

/// Parse a klines response body into candles.
///
/// Anything other than a JSON array of kline arrays is a format error.
/// Well-formed klines that fail [`Candle::is_sane`] are dropped with a warning.
pub fn parse_klines(body: &Value) -> Result<Vec<Candle>, DataError> {
    let rows = body.as_array().ok_or_else(|| {
        DataError::ResponseFormatChanged(format!("expected a list of klines, got {}", kind(body)))
    })?;

    let mut candles = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let candle = parse_kline_row(row).map_err(|reason| {
            DataError::ResponseFormatChanged(format!("kline {i}: {reason}"))
        })?;
        if candle.is_sane() {
            candles.push(candle);
        } else {
            tracing::warn!(
                index = i,
                open_time = %candle.open_time_iso(),
                "dropping malformed kline"
            );
        }
    }
    Ok(candles)
}

fn parse_kline_row(row: &Value) -> Result<Candle, String> {
    let fields = row
        .as_array()
        .ok_or_else(|| format!("expected an array, got {}", kind(row)))?;
    if fields.len() < 7 {
        return Err(format!("expected at least 7 fields, got {}", fields.len()));
    }

    Ok(Candle {
        open_time_ms: int_field(&fields[0], "open_time")?,
        open: float_field(&fields[1], "open")?,
        high: float_field(&fields[2], "high")?,
        low: float_field(&fields[3], "low")?,
        close: float_field(&fields[4], "close")?,
        volume: float_field(&fields[5], "volume")?,
        close_time_ms: int_field(&fields[6], "close_time")?,
    })
}

fn float_field(value: &Value, name: &str) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("field '{name}' is not numeric: {value}"))
}

fn int_field(value: &Value, name: &str) -> Result<i64, String> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("field '{name}' is not an integer: {value}"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl CandleProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance_spot"
    }

    fn try_fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let resp = self.klines_request(symbol, timeframe, limit).send().map_err(|e| {
            if e.is_timeout() {
                DataError::Timeout(e.to_string())
            } else {
                DataError::NetworkUnreachable(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                symbol: symbol.to_string(),
                interval: timeframe.interval().to_string(),
            });
        }

        let body: Value = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!(
                "failed to parse klines for {symbol} {timeframe}: {e}"
            ))
        })?;

        parse_klines(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_encoded_klines() {
        let body = json!([
            [1_700_000_000_000_i64, "100.0", "112.0", "98.0", "110.0", "12.5",
             1_700_003_599_999_i64, "1375.0", 42, "6.0", "660.0", "0"],
            [1_700_003_600_000_i64, "110.0", "111.0", "105.0", "106.0", "3.0",
             1_700_007_199_999_i64, "318.0", 7, "1.0", "106.0", "0"]
        ]);
        let candles = parse_klines(&body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].high, 112.0);
        assert_eq!(candles[0].close_time_ms, 1_700_003_599_999);
        assert_eq!(candles[1].volume, 3.0);
    }

    #[test]
    fn accepts_plain_numbers() {
        let body = json!([[0, 1.0, 2.0, 0.5, 1.5, 10, 3_599_999]]);
        let candles = parse_klines(&body).unwrap();
        assert_eq!(candles[0].low, 0.5);
        assert_eq!(candles[0].volume, 10.0);
    }

    #[test]
    fn non_list_body_is_format_error() {
        let body = json!({"code": -1121, "msg": "Invalid symbol."});
        assert!(matches!(
            parse_klines(&body),
            Err(DataError::ResponseFormatChanged(_))
        ));
        assert!(parse_klines(&Value::Null).is_err());
    }

    #[test]
    fn short_row_is_format_error() {
        let body = json!([[0, "1", "2", "0.5"]]);
        let err = parse_klines(&body).unwrap_err();
        assert!(err.to_string().contains("kline 0"));
    }

    #[test]
    fn empty_list_is_empty_result() {
        assert!(parse_klines(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn malformed_klines_are_dropped() {
        let body = json!([
            [0, "100.0", "112.0", "98.0", "110.0", "1.0", 3_599_999],
            // high below low
            [3_600_000, "100.0", "90.0", "95.0", "92.0", "1.0", 7_199_999],
            // close above high
            [7_200_000, "100.0", "101.0", "99.0", "105.0", "1.0", 10_799_999],
            [10_800_000, "100.0", "101.0", "99.0", "100.5", "1.0", 14_399_999]
        ]);
        let candles = parse_klines(&body).unwrap();
        let opens: Vec<i64> = candles.iter().map(|c| c.open_time_ms).collect();
        assert_eq!(opens, vec![0, 10_800_000]);
    }

    fn query_pairs(request: &reqwest::blocking::Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn request_uses_interval_strings() {
        let provider =
            BinanceProvider::new("https://example.test/", Duration::from_secs(1), "test").unwrap();
        let request = provider
            .klines_request("BTCUSDT", Timeframe::W1, 30)
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://example.test/api/v3/klines?symbol=BTCUSDT&interval=1w&limit=30"
        );
    }

    #[test]
    fn request_encodes_symbol() {
        let provider =
            BinanceProvider::new("https://example.test", Duration::from_secs(1), "test").unwrap();
        let request = provider
            .klines_request("BTC USDT&limit=1", Timeframe::H4, 500)
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/v3/klines");
        assert_eq!(
            query_pairs(&request),
            vec![
                ("symbol".to_string(), "BTC USDT&limit=1".to_string()),
                ("interval".to_string(), "4h".to_string()),
                ("limit".to_string(), "500".to_string()),
            ]
        );
    }
}
