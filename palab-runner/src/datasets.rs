//! CSV datasets passed between stages.
//!
//! Writers always emit the header row, so a stage with no rows still leaves a
//! valid dataset. Undefined numbers are written as empty cells. Readers check
//! the header against the stage's required columns before parsing any record.

use anyhow::{Context, Result};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::path::Path;

use palab_core::data::DatasetSchema;
use palab_core::domain::{
    AlignedEmas, AnnotatedBar, BarType, BoDir, Candle, EmaPair, MtfRow, Signal, Timeframe, Trade,
    RULE_NOTES,
};
use palab_core::funnel::FunnelBar;

/// Every dataset the pipeline reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Candles(Timeframe),
    Mtf,
    Annotated,
    Signals,
    Trades,
    Sweep,
    Snapshot,
}

impl Dataset {
    /// File name for `symbol`, e.g. `BTCUSDT_annotated.csv`.
    pub fn file_name(&self, symbol: &str) -> String {
        match self {
            Dataset::Candles(tf) => format!("{symbol}_{}.csv", tf.interval()),
            Dataset::Mtf => format!("{symbol}_mtf_with_ema.csv"),
            Dataset::Annotated => format!("{symbol}_annotated.csv"),
            Dataset::Signals => format!("{symbol}_signals.csv"),
            Dataset::Trades => format!("{symbol}_trades.csv"),
            Dataset::Sweep => format!("{symbol}_sweep.csv"),
            Dataset::Snapshot => format!("{symbol}_snapshot.json"),
        }
    }
}

/// A row type with a fixed column order. `HEADERS` must list the serialized
/// fields in declaration order.
pub trait Record: Serialize {
    const HEADERS: &'static [&'static str];
}

// ── Readers / writers ────────────────────────────────────────────────

/// Write `rows` to `path` (creating parent directories), header first.
pub fn write_dataset<T: Record>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write a row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Read `path` after checking its header against `schema`.
pub fn read_dataset<T: DeserializeOwned>(path: &Path, schema: &DatasetSchema) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let columns: Vec<&str> = headers.iter().collect();
    schema.validate(&columns)?;

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            // +2: one-based, after the header line
            row.with_context(|| format!("{}: bad record on line {}", path.display(), i + 2))
        })
        .collect()
}

/// Lenient flag cell: `true/false` in any case, `1/0`, `1.0/0.0`; empty is
/// undefined.
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" | "1.0" => Ok(Some(true)),
        "false" | "0" | "0.0" => Ok(Some(false)),
        other => Err(de::Error::custom(format!("invalid flag value '{other}'"))),
    }
}

/// Signal entry column: `0|1`.
fn ser_entry<S: serde::Serializer>(entry: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*entry))
}

fn nan_if_missing(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

// ── Raw candles ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleRecord {
    pub open_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time_ms: i64,
    pub open_time_iso: String,
    pub close_time_iso: String,
}

impl Record for CandleRecord {
    const HEADERS: &'static [&'static str] = &[
        "open_time_ms",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "close_time_ms",
        "open_time_iso",
        "close_time_iso",
    ];
}

impl From<&Candle> for CandleRecord {
    fn from(c: &Candle) -> Self {
        Self {
            open_time_ms: c.open_time_ms,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
            close_time_ms: c.close_time_ms,
            open_time_iso: c.open_time_iso(),
            close_time_iso: c.close_time_iso(),
        }
    }
}

// ── Merged MTF ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfRecord {
    pub t_close_h1: i64,
    #[serde(default)]
    pub h1_open: Option<f64>,
    #[serde(default)]
    pub h1_high: Option<f64>,
    #[serde(default)]
    pub h1_low: Option<f64>,
    #[serde(default)]
    pub h1_close: Option<f64>,
    #[serde(default)]
    pub h4_close: Option<f64>,
    #[serde(default)]
    pub d_close: Option<f64>,
    #[serde(default)]
    pub w_close: Option<f64>,
    #[serde(default)]
    pub h1_ema20: Option<f64>,
    #[serde(default)]
    pub h1_ema50: Option<f64>,
    #[serde(default)]
    pub h4_ema20: Option<f64>,
    #[serde(default)]
    pub h4_ema50: Option<f64>,
    #[serde(default)]
    pub d_ema20: Option<f64>,
    #[serde(default)]
    pub d_ema50: Option<f64>,
    #[serde(default)]
    pub w_ema20: Option<f64>,
    #[serde(default)]
    pub w_ema50: Option<f64>,
}

impl Record for MtfRecord {
    const HEADERS: &'static [&'static str] = &[
        "t_close_h1",
        "h1_open",
        "h1_high",
        "h1_low",
        "h1_close",
        "h4_close",
        "d_close",
        "w_close",
        "h1_ema20",
        "h1_ema50",
        "h4_ema20",
        "h4_ema50",
        "d_ema20",
        "d_ema50",
        "w_ema20",
        "w_ema50",
    ];
}

impl From<&MtfRow> for MtfRecord {
    fn from(r: &MtfRow) -> Self {
        let e = &r.emas;
        Self {
            t_close_h1: r.t_close,
            h1_open: Some(r.open),
            h1_high: Some(r.high),
            h1_low: Some(r.low),
            h1_close: Some(r.close),
            h4_close: r.h4_close,
            d_close: r.d_close,
            w_close: r.w_close,
            h1_ema20: e.h1.ema20,
            h1_ema50: e.h1.ema50,
            h4_ema20: e.h4.ema20,
            h4_ema50: e.h4.ema50,
            d_ema20: e.d.ema20,
            d_ema50: e.d.ema50,
            w_ema20: e.w.ema20,
            w_ema50: e.w.ema50,
        }
    }
}

impl MtfRecord {
    fn emas(&self) -> AlignedEmas {
        AlignedEmas {
            h1: EmaPair::new(self.h1_ema20, self.h1_ema50),
            h4: EmaPair::new(self.h4_ema20, self.h4_ema50),
            d: EmaPair::new(self.d_ema20, self.d_ema50),
            w: EmaPair::new(self.w_ema20, self.w_ema50),
        }
    }

    /// Undefined prices become NaN, which every detector treats as "no signal".
    pub fn to_row(&self) -> MtfRow {
        MtfRow {
            t_close: self.t_close_h1,
            open: nan_if_missing(self.h1_open),
            high: nan_if_missing(self.h1_high),
            low: nan_if_missing(self.h1_low),
            close: nan_if_missing(self.h1_close),
            h4_close: self.h4_close,
            d_close: self.d_close,
            w_close: self.w_close,
            emas: self.emas(),
        }
    }
}

// ── Annotated ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub t_close_h1: i64,
    #[serde(default)]
    pub h1_open: Option<f64>,
    #[serde(default)]
    pub h1_high: Option<f64>,
    #[serde(default)]
    pub h1_low: Option<f64>,
    #[serde(default)]
    pub h1_close: Option<f64>,
    #[serde(default)]
    pub body_ratio: Option<f64>,
    #[serde(default)]
    pub bar_type: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub is_tight_range: Option<bool>,
    #[serde(default)]
    pub bo_dir: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub reversal_bar_bull: Option<bool>,
    #[serde(default, deserialize_with = "de_flag")]
    pub reversal_bar_bear: Option<bool>,
    #[serde(default, deserialize_with = "de_flag")]
    pub is_20_gap_context: Option<bool>,
    #[serde(default)]
    pub h1_ema20: Option<f64>,
    #[serde(default)]
    pub h1_ema50: Option<f64>,
    #[serde(default)]
    pub h4_ema20: Option<f64>,
    #[serde(default)]
    pub h4_ema50: Option<f64>,
    #[serde(default)]
    pub d_ema20: Option<f64>,
    #[serde(default)]
    pub d_ema50: Option<f64>,
    #[serde(default)]
    pub w_ema20: Option<f64>,
    #[serde(default)]
    pub w_ema50: Option<f64>,
}

impl Record for AnnotatedRecord {
    const HEADERS: &'static [&'static str] = &[
        "t_close_h1",
        "h1_open",
        "h1_high",
        "h1_low",
        "h1_close",
        "body_ratio",
        "bar_type",
        "is_tight_range",
        "bo_dir",
        "reversal_bar_bull",
        "reversal_bar_bear",
        "is_20_gap_context",
        "h1_ema20",
        "h1_ema50",
        "h4_ema20",
        "h4_ema50",
        "d_ema20",
        "d_ema50",
        "w_ema20",
        "w_ema50",
    ];
}

impl From<&AnnotatedBar> for AnnotatedRecord {
    fn from(b: &AnnotatedBar) -> Self {
        let e = &b.emas;
        let price = |v: f64| v.is_finite().then_some(v);
        Self {
            t_close_h1: b.t_close,
            h1_open: price(b.open),
            h1_high: price(b.high),
            h1_low: price(b.low),
            h1_close: price(b.close),
            body_ratio: Some(b.body_ratio),
            bar_type: Some(b.bar_type.as_str().to_string()),
            is_tight_range: Some(b.is_tight_range),
            bo_dir: Some(b.bo_dir.as_str().to_string()),
            reversal_bar_bull: Some(b.reversal_bar_bull),
            reversal_bar_bear: Some(b.reversal_bar_bear),
            is_20_gap_context: Some(b.is_20_gap_context),
            h1_ema20: e.h1.ema20,
            h1_ema50: e.h1.ema50,
            h4_ema20: e.h4.ema20,
            h4_ema50: e.h4.ema50,
            d_ema20: e.d.ema20,
            d_ema50: e.d.ema50,
            w_ema20: e.w.ema20,
            w_ema50: e.w.ema50,
        }
    }
}

impl AnnotatedRecord {
    pub fn emas(&self) -> AlignedEmas {
        AlignedEmas {
            h1: EmaPair::new(self.h1_ema20, self.h1_ema50),
            h4: EmaPair::new(self.h4_ema20, self.h4_ema50),
            d: EmaPair::new(self.d_ema20, self.d_ema50),
            w: EmaPair::new(self.w_ema20, self.w_ema50),
        }
    }

    /// Funnel input; unknown labels and empty cells become missing flags.
    pub fn to_funnel_bar(&self) -> FunnelBar {
        FunnelBar {
            t_close: self.t_close_h1,
            close: nan_if_missing(self.h1_close),
            bar_type: self.bar_type.as_deref().and_then(BarType::from_label),
            is_tight_range: self.is_tight_range,
            bo_dir: self.bo_dir.as_deref().and_then(BoDir::from_label),
            reversal_bar_bull: self.reversal_bar_bull,
            emas: self.emas(),
        }
    }
}

/// Close-series view of the annotated dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloseRecord {
    pub t_close_h1: i64,
    #[serde(default)]
    pub h1_close: Option<f64>,
}

// ── Signals ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub t_close_h1: i64,
    pub h1_close: Option<f64>,
    pub bar_type: Option<String>,
    pub is_tight_range: Option<bool>,
    pub bo_dir: Option<String>,
    pub reversal_bar_bull: Option<bool>,
    pub h4_ema20: Option<f64>,
    pub h4_ema50: Option<f64>,
    pub d_ema20: Option<f64>,
    pub d_ema50: Option<f64>,
    pub w_ema20: Option<f64>,
    pub w_ema50: Option<f64>,
    pub regime_mode: String,
    pub regime_ok: bool,
    pub bar_ok: bool,
    pub tight_ok: bool,
    pub trig_ok: bool,
    #[serde(serialize_with = "ser_entry")]
    pub entry: bool,
    pub rule_id: String,
    pub notes: String,
}

impl Record for SignalRecord {
    const HEADERS: &'static [&'static str] = &[
        "t_close_h1",
        "h1_close",
        "bar_type",
        "is_tight_range",
        "bo_dir",
        "reversal_bar_bull",
        "h4_ema20",
        "h4_ema50",
        "d_ema20",
        "d_ema50",
        "w_ema20",
        "w_ema50",
        "regime_mode",
        "regime_ok",
        "bar_ok",
        "tight_ok",
        "trig_ok",
        "entry",
        "rule_id",
        "notes",
    ];
}

impl SignalRecord {
    /// Join the annotated input row with its funnel verdict.
    pub fn new(source: &AnnotatedRecord, signal: &Signal) -> Self {
        Self {
            t_close_h1: source.t_close_h1,
            h1_close: source.h1_close,
            bar_type: source.bar_type.clone(),
            is_tight_range: source.is_tight_range,
            bo_dir: source.bo_dir.clone(),
            reversal_bar_bull: source.reversal_bar_bull,
            h4_ema20: source.h4_ema20,
            h4_ema50: source.h4_ema50,
            d_ema20: source.d_ema20,
            d_ema50: source.d_ema50,
            w_ema20: source.w_ema20,
            w_ema50: source.w_ema50,
            regime_mode: signal.regime_mode.as_str().to_string(),
            regime_ok: signal.regime_ok,
            bar_ok: signal.bar_ok,
            tight_ok: signal.tight_ok,
            trig_ok: signal.trig_ok,
            entry: signal.entry,
            rule_id: signal.rule_id.clone(),
            notes: RULE_NOTES.to_string(),
        }
    }
}

/// Signals dataset as read by the backtest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryRecord {
    pub t_close_h1: i64,
    #[serde(default)]
    pub h1_close: Option<f64>,
    #[serde(default, deserialize_with = "de_flag")]
    pub entry: Option<bool>,
}

// ── Trades / sweep ───────────────────────────────────────────────────

impl Record for Trade {
    const HEADERS: &'static [&'static str] = &[
        "t_entry",
        "t_exit",
        "entry",
        "stop",
        "target",
        "exit_price",
        "exit_reason",
        "r",
        "pnl_r",
        "pnl_quote",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRecord {
    pub n: usize,
    pub r_mult: f64,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub eod: usize,
    pub win_rate: f64,
    pub avg_r: f64,
    pub expectancy_r: f64,
}

impl Record for SweepRecord {
    const HEADERS: &'static [&'static str] = &[
        "n",
        "r_mult",
        "trades",
        "wins",
        "losses",
        "eod",
        "win_rate",
        "avg_r",
        "expectancy_r",
    ];
}
