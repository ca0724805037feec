//! Per-bar records on the base (H1) timeline: merged MTF rows and annotated bars.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TimestampMs;

/// EMA20/EMA50 pair of one timeframe. `None` means undefined (warm-up, or no
/// closed candle of that timeframe yet).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmaPair {
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
}

impl EmaPair {
    pub fn new(ema20: Option<f64>, ema50: Option<f64>) -> Self {
        Self { ema20, ema50 }
    }

    /// EMA20 strictly above EMA50. Undefined on either side is false.
    pub fn is_uptrend(&self) -> bool {
        matches!((self.ema20, self.ema50), (Some(fast), Some(slow)) if fast > slow)
    }
}

/// EMA pairs of every timeframe as seen from one base bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedEmas {
    pub h1: EmaPair,
    pub h4: EmaPair,
    pub d: EmaPair,
    pub w: EmaPair,
}

/// One merged row of the MTF dataset: the base candle's OHLC plus the closes
/// and EMAs of the latest already-closed higher-timeframe candles.
#[derive(Debug, Clone, PartialEq)]
pub struct MtfRow {
    pub t_close: TimestampMs,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub h4_close: Option<f64>,
    pub d_close: Option<f64>,
    pub w_close: Option<f64>,
    pub emas: AlignedEmas,
}

/// Bar classification by body direction and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarType {
    TrendBull,
    TrendBear,
    #[default]
    Doji,
}

impl BarType {
    pub fn as_str(self) -> &'static str {
        match self {
            BarType::TrendBull => "trend_bull",
            BarType::TrendBear => "trend_bear",
            BarType::Doji => "doji",
        }
    }

    /// Parse a dataset label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "trend_bull" => Some(BarType::TrendBull),
            "trend_bear" => Some(BarType::TrendBear),
            "doji" => Some(BarType::Doji),
            _ => None,
        }
    }
}

impl fmt::Display for BarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Breakout direction relative to the prior rolling extremes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoDir {
    Up,
    Down,
    #[default]
    None,
}

impl BoDir {
    pub fn as_str(self) -> &'static str {
        match self {
            BoDir::Up => "up",
            BoDir::Down => "down",
            BoDir::None => "none",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "up" => Some(BoDir::Up),
            "down" => Some(BoDir::Down),
            "none" => Some(BoDir::None),
            _ => None,
        }
    }
}

impl fmt::Display for BoDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern features of one base bar. Built once by the classifier and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedBar {
    pub t_close: TimestampMs,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// In `[0, 10]`; 0 when the bar has no range.
    pub body_ratio: f64,
    pub bar_type: BarType,
    pub is_tight_range: bool,
    pub bo_dir: BoDir,
    pub reversal_bar_bull: bool,
    pub reversal_bar_bear: bool,
    pub is_20_gap_context: bool,
    pub emas: AlignedEmas,
}
