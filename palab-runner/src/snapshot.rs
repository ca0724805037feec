//! Dataset snapshot: QA figures and feature statistics of an annotated
//! dataset, written as pretty JSON.
//!
//! Reads the file column-agnostically, so a partial dataset still yields a
//! snapshot; absent columns show up as empty maps or `null`.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use palab_core::domain::TimestampMs;

const EMA_COLUMNS: [&str; 8] = [
    "h1_ema20", "h1_ema50", "h4_ema20", "h4_ema50", "d_ema20", "d_ema50", "w_ema20", "w_ema50",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaReport {
    pub rows: usize,
    pub has_t_close_h1: bool,
    pub date_range: DateRange,
    /// Rows repeating an earlier timestamp; -1 without a time column.
    pub duplicated_timestamps: i64,
    pub null_ratio_overall_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueCounts {
    pub bar_type: BTreeMap<String, usize>,
    pub bo_dir: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagPercentages {
    pub tight_range_pct: Option<f64>,
    pub reversal_bar_bull_pct: Option<f64>,
    pub reversal_bar_bear_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    pub qa: QaReport,
    pub counts: ValueCounts,
    pub percentages: FlagPercentages,
    pub ema_stats: BTreeMap<String, ColumnStats>,
}

/// Percentage rounded to two decimals.
fn pct(fraction: f64) -> f64 {
    (fraction * 100.0 * 100.0).round() / 100.0
}

fn iso(ms: TimestampMs) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, false))
        .unwrap_or_default()
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => Some(true),
        "false" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

/// In-memory table of raw cells.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self { headers, rows })
    }

    fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(move |r| r.get(idx).map_or("", String::as_str)))
    }

    fn empty_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| {
                let filled = r.iter().filter(|c| !c.is_empty()).count();
                self.headers.len().saturating_sub(filled)
            })
            .sum()
    }

    fn value_counts(&self, name: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        if let Some(col) = self.column(name) {
            for cell in col.filter(|c| !c.is_empty()) {
                *counts.entry(cell.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Share of true values among defined flags, as a percentage.
    fn flag_pct(&self, name: &str) -> Option<f64> {
        let flags: Vec<bool> = self.column(name)?.filter_map(parse_flag).collect();
        if flags.is_empty() {
            return None;
        }
        let hits = flags.iter().filter(|&&f| f).count();
        Some(pct(hits as f64 / flags.len() as f64))
    }

    fn stats(&self, name: &str) -> Option<ColumnStats> {
        let values: Vec<f64> = self
            .column(name)?
            .filter_map(|c| c.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(ColumnStats {
            mean: values.iter().sum::<f64>() / values.len() as f64,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

fn qa_report(table: &Table) -> QaReport {
    let rows = table.rows.len();
    let times: Option<Vec<TimestampMs>> = table
        .column("t_close_h1")
        .map(|col| col.filter_map(|c| c.parse().ok()).collect());

    let (date_range, duplicated) = match &times {
        None => (DateRange::default(), -1),
        Some(times) => {
            let range = match (times.iter().min(), times.iter().max()) {
                (Some(&lo), Some(&hi)) => DateRange {
                    start: iso(lo),
                    end: iso(hi),
                },
                _ => DateRange::default(),
            };
            let mut seen = HashSet::new();
            let dups = times.iter().filter(|t| !seen.insert(**t)).count();
            (range, dups as i64)
        }
    };

    let cells = rows * table.headers.len().max(1);
    let null_ratio = if rows == 0 {
        0.0
    } else {
        table.empty_cells() as f64 / cells as f64
    };

    QaReport {
        rows,
        has_t_close_h1: times.is_some(),
        date_range,
        duplicated_timestamps: duplicated,
        null_ratio_overall_pct: pct(null_ratio),
    }
}

/// Build the snapshot of the annotated dataset at `input`.
pub fn build_snapshot(symbol: &str, input: &Path) -> Result<Snapshot> {
    let table = Table::read(input)?;

    let ema_stats = EMA_COLUMNS
        .iter()
        .filter_map(|&col| table.stats(col).map(|s| (col.to_string(), s)))
        .collect();

    Ok(Snapshot {
        symbol: symbol.to_string(),
        qa: qa_report(&table),
        counts: ValueCounts {
            bar_type: table.value_counts("bar_type"),
            bo_dir: table.value_counts("bo_dir"),
        },
        percentages: FlagPercentages {
            tight_range_pct: table.flag_pct("is_tight_range"),
            reversal_bar_bull_pct: table.flag_pct("reversal_bar_bull"),
            reversal_bar_bear_pct: table.flag_pct("reversal_bar_bear"),
        },
        ema_stats,
    })
}

/// Snapshot stage: build and write pretty JSON to `output`.
pub fn run_snapshot(symbol: &str, input: &Path, output: &Path) -> Result<Snapshot> {
    let snapshot = build_snapshot(symbol, input)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!(rows = snapshot.qa.rows, path = %output.display(), "wrote snapshot");
    Ok(snapshot)
}
