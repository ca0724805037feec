//! Backtest stage: replay entry signals on the annotated close series.

use anyhow::{Context, Result};
use std::path::Path;

use palab_core::backtest::{run_backtest, BacktestParams, BacktestReport, CloseSeries};
use palab_core::data::schema::{ANNOTATED_FOR_CLOSES, SIGNALS_FOR_BACKTEST};
use palab_core::domain::TimestampMs;

use crate::datasets::{read_dataset, write_dataset, CloseRecord, EntryRecord};

/// Close series of the annotated dataset. Rows without a close are skipped.
pub fn load_close_series(annotated: &Path) -> Result<CloseSeries> {
    let records: Vec<CloseRecord> = read_dataset(annotated, &ANNOTATED_FOR_CLOSES)?;
    let series = CloseSeries::new(
        records
            .iter()
            .filter_map(|r| r.h1_close.map(|close| (r.t_close_h1, close))),
    );
    if series.is_empty() {
        tracing::warn!(path = %annotated.display(), "close series is empty");
    }
    Ok(series)
}

/// Timestamps of the signals flagged as entries, ascending.
pub fn load_entries(signals: &Path) -> Result<Vec<TimestampMs>> {
    let records: Vec<EntryRecord> = read_dataset(signals, &SIGNALS_FOR_BACKTEST)?;
    let mut entries: Vec<TimestampMs> = records
        .iter()
        .filter(|r| r.entry == Some(true))
        .map(|r| r.t_close_h1)
        .collect();
    entries.sort_unstable();
    Ok(entries)
}

/// Run one backtest and write its trades to `output`.
pub fn run_backtest_stage(
    signals: &Path,
    annotated: &Path,
    output: &Path,
    params: &BacktestParams,
) -> Result<BacktestReport> {
    let series = load_close_series(annotated)?;
    let entries = load_entries(signals)?;
    tracing::info!(
        bars = series.len(),
        entries = entries.len(),
        lookback = params.lookback,
        r_mult = params.r_mult,
        "running backtest"
    );

    let report = run_backtest(&series, &entries, params).context("Invalid backtest parameters")?;
    write_dataset(output, &report.trades)?;

    let m = &report.metrics;
    tracing::info!(
        trades = m.trades,
        rejected = m.rejected.total(),
        expectancy_r = m.expectancy_r,
        path = %output.display(),
        "wrote trades dataset"
    );
    Ok(report)
}
