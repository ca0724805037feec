//! End-to-end run of every stage on synthetic candles.

use std::path::Path;

use palab_core::backtest::{BacktestParams, CostModel};
use palab_core::classify::ClassifierParams;
use palab_core::data::{CandleProvider, DataError};
use palab_core::domain::{Candle, RegimeMode, Timeframe};
use palab_runner::{
    run_annotate, run_backtest_stage, run_mtf, run_signals, run_snapshot, run_sweep, Dataset,
    ParamGrid, Settings,
};

const HOUR: i64 = 3_600_000;

/// Drifting wave: trends, pullbacks and consolidations at every timeframe.
struct WaveProvider;

impl CandleProvider for WaveProvider {
    fn name(&self) -> &str {
        "wave"
    }

    fn try_fetch(&self, _: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>, DataError> {
        let span = match timeframe {
            Timeframe::H1 => HOUR,
            Timeframe::H4 => 4 * HOUR,
            Timeframe::D1 => 24 * HOUR,
            Timeframe::W1 => 168 * HOUR,
        };
        let price = |i: usize| 100.0 + 0.05 * i as f64 + 4.0 * (i as f64 / 7.0).sin();
        Ok((0..limit)
            .map(|i| {
                let open = price(i);
                let close = price(i + 1);
                Candle {
                    open_time_ms: i as i64 * span,
                    open,
                    high: open.max(close) + 0.3,
                    low: open.min(close) - 0.3,
                    close,
                    volume: 10.0,
                    close_time_ms: i as i64 * span + span - 1,
                }
            })
            .collect())
    }
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

#[test]
fn every_stage_produces_its_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        output_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let symbol = "BTCUSDT";
    let path = |d: Dataset| settings.dataset_path(symbol, d);

    let mtf = run_mtf(&WaveProvider, &settings, symbol, 400).unwrap();
    assert_eq!(mtf.rows.len(), 400);
    assert_eq!(line_count(&path(Dataset::Mtf)), 401);

    let annotated = run_annotate(
        &path(Dataset::Mtf),
        &path(Dataset::Annotated),
        &ClassifierParams::default(),
    )
    .unwrap();
    assert_eq!(annotated.rows, 400);
    assert_eq!(annotated.trend_bull + annotated.trend_bear + annotated.doji, 400);

    let signals =
        run_signals(&path(Dataset::Annotated), &path(Dataset::Signals), RegimeMode::None).unwrap();
    assert_eq!(signals.funnel.total, 400);
    assert_eq!(signals.funnel.regime, 400);
    assert!(signals.funnel.entries <= signals.funnel.bar.min(signals.funnel.trig));
    assert_eq!(line_count(&path(Dataset::Signals)), 401);

    let params = BacktestParams::new(5, 1.0, CostModel::frictionless());
    let report = run_backtest_stage(
        &path(Dataset::Signals),
        &path(Dataset::Annotated),
        &path(Dataset::Trades),
        &params,
    )
    .unwrap();
    let m = report.metrics;
    assert_eq!(m.trades + m.rejected.total(), signals.funnel.entries);
    assert_eq!(m.wins + m.losses + m.eod, m.trades);
    assert_eq!(line_count(&path(Dataset::Trades)), m.trades + 1);
    if m.trades > 0 {
        let mean = report.trades.iter().map(|t| t.pnl_r).sum::<f64>() / m.trades as f64;
        assert!((m.expectancy_r - mean).abs() < 1e-12);
        assert!(report.trades.iter().all(|t| t.r > 0.0));
    }

    let rows = run_sweep(
        &path(Dataset::Signals),
        &path(Dataset::Annotated),
        &path(Dataset::Sweep),
        &ParamGrid::default(),
        CostModel::frictionless(),
    )
    .unwrap();
    assert_eq!(rows.len(), 20);
    // The single run above is one of the grid cells
    assert!(rows
        .iter()
        .any(|r| r.params.lookback == 5 && r.params.r_mult == 1.0 && r.metrics == m));

    let snapshot = run_snapshot(symbol, &path(Dataset::Annotated), &path(Dataset::Snapshot)).unwrap();
    assert_eq!(snapshot.qa.rows, 400);
    assert_eq!(snapshot.qa.duplicated_timestamps, 0);
    assert_eq!(snapshot.qa.date_range.start, "1970-01-01T00:59:59.999+00:00");
    assert!(snapshot.ema_stats.contains_key("h1_ema50"));
    assert_eq!(
        snapshot.counts.bar_type.values().sum::<usize>(),
        400,
        "every row carries a bar type"
    );
}

#[test]
fn fees_reduce_every_trade() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        output_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let symbol = "ETHUSDT";
    let path = |d: Dataset| settings.dataset_path(symbol, d);

    run_mtf(&WaveProvider, &settings, symbol, 300).unwrap();
    run_annotate(&path(Dataset::Mtf), &path(Dataset::Annotated), &ClassifierParams::default())
        .unwrap();
    run_signals(&path(Dataset::Annotated), &path(Dataset::Signals), RegimeMode::None).unwrap();

    let run = |costs: CostModel| {
        run_backtest_stage(
            &path(Dataset::Signals),
            &path(Dataset::Annotated),
            &path(Dataset::Trades),
            &BacktestParams::new(5, 1.0, costs),
        )
        .unwrap()
    };
    let free = run(CostModel::frictionless());
    let charged = run(CostModel::new(10.0, 0.0));

    assert_eq!(free.trades.len(), charged.trades.len());
    for (a, b) in free.trades.iter().zip(&charged.trades) {
        assert_eq!(a.exit_price, b.exit_price);
        assert!(b.pnl_quote < a.pnl_quote);
    }
}
