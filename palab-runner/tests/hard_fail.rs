//! Fatal paths: schema violations, invalid parameters, unknown regime modes.

use palab_core::backtest::{run_backtest, BacktestParams, CostModel};
use palab_core::domain::RegimeMode;
use palab_runner::{
    load_close_series, load_entries, run_annotate, run_backtest_stage, run_signals, sweep,
    ParamGrid,
};

#[test]
fn unknown_regime_is_a_config_error() {
    let err = "D_AND_M".parse::<RegimeMode>().unwrap_err();
    assert!(err.to_string().contains("D_AND_M"));
    assert_eq!("h4_and_d".parse::<RegimeMode>().unwrap(), RegimeMode::H4AndD);
}

#[test]
fn schema_errors_name_missing_and_present_columns() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("annotated.csv");
    std::fs::write(&input, "t_close_h1,h1_close,bar_type\n1,100,doji\n").unwrap();

    let err = run_signals(&input, &dir.path().join("s.csv"), RegimeMode::DOnly).unwrap_err();
    let msg = format!("{err:#}");
    for col in ["bo_dir", "is_tight_range", "reversal_bar_bull", "d_ema20", "w_ema50"] {
        assert!(msg.contains(col), "{col} not reported in: {msg}");
    }
    assert!(msg.contains("bar_type"));
    // Nothing written on failure
    assert!(!dir.path().join("s.csv").exists());
}

#[test]
fn missing_input_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    assert!(run_annotate(&missing, &dir.path().join("a.csv"), &Default::default()).is_err());
    assert!(run_backtest_stage(
        &missing,
        &missing,
        &dir.path().join("t.csv"),
        &BacktestParams::default()
    )
    .is_err());
}

#[test]
fn parallel_sweep_matches_sequential_runs() {
    let dir = tempfile::tempdir().unwrap();
    let annotated = dir.path().join("annotated.csv");
    let signals = dir.path().join("signals.csv");

    let mut closes = String::from("t_close_h1,h1_close\n");
    let mut entries = String::from("t_close_h1,h1_close,entry\n");
    for i in 0..200 {
        let close = 100.0 + (i as f64 / 3.0).sin() * 5.0 + i as f64 * 0.1;
        closes.push_str(&format!("{i},{close}\n"));
        let entry = u8::from(i % 7 == 0);
        entries.push_str(&format!("{i},{close},{entry}\n"));
    }
    std::fs::write(&annotated, closes).unwrap();
    std::fs::write(&signals, entries).unwrap();

    let series = load_close_series(&annotated).unwrap();
    let entries = load_entries(&signals).unwrap();
    let grid = ParamGrid::default();
    let costs = CostModel::new(10.0, 2.0);

    let rows = sweep(&series, &entries, &grid, costs).unwrap();
    for params in grid.generate(costs) {
        let expected = run_backtest(&series, &entries, &params).unwrap().metrics;
        let row = rows
            .iter()
            .find(|r| r.params == params)
            .expect("every grid cell is reported");
        assert_eq!(row.metrics, expected);
    }
}
