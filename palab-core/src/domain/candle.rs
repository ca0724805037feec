//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TimestampMs;

/// OHLCV candle for one symbol on one timeframe.
///
/// Open and close times are epoch milliseconds as delivered by the exchange.
/// The close time is the last millisecond covered by the candle, so a candle
/// is "closed" for any observer whose clock is at or past `close_time_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time_ms: TimestampMs,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time_ms: TimestampMs,
}

impl Candle {
    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Absolute open-to-close distance.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Basic OHLC sanity check: every price is finite, high >= low, the body
    /// sits inside the range and the candle does not close before it opens.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if !prices.iter().all(|p| p.is_finite()) {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.close_time_ms >= self.open_time_ms
    }

    pub fn open_time_iso(&self) -> String {
        ms_to_iso(self.open_time_ms)
    }

    pub fn close_time_iso(&self) -> String {
        ms_to_iso(self.close_time_ms)
    }
}

/// Render epoch milliseconds as `YYYY-MM-DD HH:MM:SS+0000` (UTC).
///
/// Out-of-range timestamps render as an empty string.
pub fn ms_to_iso(ms: TimestampMs) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%z").to_string())
        .unwrap_or_default()
}
