//! End-to-end scenarios through classifier, funnel and backtest.

use palab_core::backtest::{
    run_backtest, simulate_signal, BacktestParams, CloseSeries, CostModel, OpenPosition, Rejection,
};
use palab_core::classify::{classify, ClassifierParams};
use palab_core::domain::{AlignedEmas, BarType, EmaPair, ExitReason, MtfRow, RegimeMode};
use palab_core::funnel::{evaluate_signals, FunnelBar};

fn series(closes: &[f64]) -> CloseSeries {
    CloseSeries::new(closes.iter().enumerate().map(|(i, &c)| (i as i64, c)))
}

fn frictionless(lookback: usize, r_mult: f64) -> BacktestParams {
    BacktestParams::new(lookback, r_mult, CostModel::frictionless())
}

#[test]
fn wide_bullish_body_is_trend_bull() {
    let row = MtfRow {
        t_close: 0,
        open: 100.0,
        high: 112.0,
        low: 98.0,
        close: 110.0,
        h4_close: None,
        d_close: None,
        w_close: None,
        emas: AlignedEmas::default(),
    };
    let bars = classify(&[row], &ClassifierParams::default()).unwrap();
    assert!((bars[0].body_ratio - 10.0 / 14.0).abs() < 1e-12);
    assert_eq!(bars[0].bar_type, BarType::TrendBull);
}

#[test]
fn entry_below_prior_closes_is_rejected() {
    let s = series(&[90.0, 100.0, 95.0, 80.0, 120.0]);
    let result = simulate_signal(&s, 3, &frictionless(2, 1.0));
    assert!(matches!(result, Err(Rejection::NonPositiveRisk { .. })));
}

#[test]
fn entry_on_last_bar_closes_flat_at_eod() {
    let s = series(&[90.0, 100.0, 95.0, 80.0, 120.0]);
    let report = run_backtest(&s, &[3, 4], &frictionless(2, 1.0)).unwrap();

    assert_eq!(report.trades.len(), 1);
    let trade = &report.trades[0];
    assert_eq!(trade.t_entry, 4);
    assert_eq!(trade.stop, 80.0);
    assert_eq!(trade.r, 40.0);
    assert_eq!(trade.target, 160.0);
    assert_eq!(trade.exit_reason, ExitReason::Eod);
    assert_eq!(trade.exit_price, 120.0);
    assert_eq!(trade.pnl_r, 0.0);
    assert_eq!(report.metrics.rejected.non_positive_risk, 1);
    assert_eq!(report.metrics.eod, 1);
}

#[test]
fn stop_beats_target_on_the_same_close() {
    // Force the target below the stop so one close satisfies both conditions
    let s = series(&[100.0, 98.0, 102.0, 97.0, 103.0]);
    let mut position = OpenPosition::open(&s, 2, &frictionless(2, 1.0)).unwrap();
    position.target = position.stop - 1.0;

    // The close of 97 is both <= stop (98) and >= target (97)
    assert_eq!(position.check_exit(97.0), Some(ExitReason::Stop));
    let trade = position.resolve(&s, &CostModel::frictionless());
    assert_eq!(trade.exit_reason, ExitReason::Stop);
    assert_eq!(trade.t_exit, 3);
}

#[test]
fn expectancy_matches_trade_list() {
    let closes = [
        100.0, 98.0, 102.0, 104.0, 107.0, 101.0, 96.0, 99.0, 103.0, 110.0, 108.0, 95.0, 97.0,
    ];
    let s = series(&closes);
    let entries: Vec<i64> = (0..closes.len() as i64).collect();
    let report = run_backtest(&s, &entries, &frictionless(2, 1.5)).unwrap();
    assert!(!report.trades.is_empty());
    let mean = report.trades.iter().map(|t| t.pnl_r).sum::<f64>() / report.trades.len() as f64;
    assert!((report.metrics.expectancy_r - mean).abs() < 1e-12);
}

#[test]
fn pipeline_from_rows_to_trades() {
    // Quiet drift, then a strong impulse that breaks out above the prior highs
    let mut rows: Vec<MtfRow> = (0..40)
        .map(|i| {
            let c = 100.0 + (i as f64 * 0.8).sin();
            MtfRow {
                t_close: i,
                open: c - 0.2,
                high: c + 0.5,
                low: c - 0.5,
                close: c,
                h4_close: None,
                d_close: None,
                w_close: None,
                emas: AlignedEmas {
                    d: EmaPair::new(Some(2.0), Some(1.0)),
                    ..Default::default()
                },
            }
        })
        .collect();
    rows[30].open = 100.5;
    rows[30].close = 106.0;
    rows[30].high = 106.5;
    rows[30].low = 100.4;

    let bars = classify(&rows, &ClassifierParams::default()).unwrap();
    let funnel_bars: Vec<FunnelBar> = bars.iter().map(FunnelBar::from).collect();
    let set = evaluate_signals(&funnel_bars, RegimeMode::DOnly);
    let entry_times: Vec<i64> = set.entries().map(|s| s.t_close).collect();
    assert!(entry_times.contains(&30));
    assert_eq!(set.funnel.entries, entry_times.len());

    let closes = CloseSeries::new(bars.iter().map(|b| (b.t_close, b.close)));
    let report = run_backtest(&closes, &entry_times, &frictionless(5, 1.0)).unwrap();
    assert_eq!(
        report.trades.len() + report.metrics.rejected.total(),
        entry_times.len()
    );
    let impulse = report.trades.iter().find(|t| t.t_entry == 30);
    assert!(impulse.is_some_and(|t| t.exit_reason == ExitReason::Stop));
}
