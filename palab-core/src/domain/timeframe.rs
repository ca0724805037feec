//! Candle timeframes used by the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timeframes the pipeline works with. `H1` is the base timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    H1,
    H4,
    D1,
    W1,
}

impl Timeframe {
    /// Higher timeframes aligned onto the H1 base, in dataset column order.
    pub const HIGHER: [Timeframe; 3] = [Timeframe::H4, Timeframe::D1, Timeframe::W1];

    /// Exchange interval string (`1h`, `4h`, `1d`, `1w`).
    pub fn interval(self) -> &'static str {
        match self {
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }

    /// Column prefix in merged datasets (`h1`, `h4`, `d`, `w`).
    pub fn column_prefix(self) -> &'static str {
        match self {
            Timeframe::H1 => "h1",
            Timeframe::H4 => "h4",
            Timeframe::D1 => "d",
            Timeframe::W1 => "w",
        }
    }

    /// Number of candles to request for this timeframe when `base_limit` H1
    /// candles are requested, so the higher EMAs have history to warm up.
    pub fn fetch_limit(self, base_limit: usize) -> usize {
        match self {
            Timeframe::H1 => base_limit,
            Timeframe::H4 => (base_limit / 4 + 10).max(100),
            Timeframe::D1 => (base_limit / 24 + 10).max(60),
            Timeframe::W1 => (base_limit / 168 + 10).max(30),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interval())
    }
}
