//! Parameter sweep over stop look-back and target multiple.

use anyhow::Result;
use rayon::prelude::*;
use std::path::Path;

use palab_core::backtest::{run_backtest, BacktestMetrics, BacktestParams, CloseSeries, CostModel};
use palab_core::domain::TimestampMs;

use crate::backtest::{load_close_series, load_entries};
use crate::datasets::{write_dataset, SweepRecord};

/// Look-back × target-multiple grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub lookbacks: Vec<usize>,
    pub r_mults: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            lookbacks: vec![3, 5, 8, 10, 13],
            r_mults: vec![0.7, 1.0, 1.5, 2.0],
        }
    }
}

impl ParamGrid {
    pub fn size(&self) -> usize {
        self.lookbacks.len() * self.r_mults.len()
    }

    /// Every cell, look-back major.
    pub fn generate(&self, costs: CostModel) -> Vec<BacktestParams> {
        self.lookbacks
            .iter()
            .flat_map(|&n| {
                self.r_mults
                    .iter()
                    .map(move |&r| BacktestParams::new(n, r, costs))
            })
            .collect()
    }
}

/// Metrics of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRow {
    pub params: BacktestParams,
    pub metrics: BacktestMetrics,
}

impl From<&SweepRow> for SweepRecord {
    fn from(row: &SweepRow) -> Self {
        let m = &row.metrics;
        Self {
            n: row.params.lookback,
            r_mult: row.params.r_mult,
            trades: m.trades,
            wins: m.wins,
            losses: m.losses,
            eod: m.eod,
            win_rate: m.win_rate,
            avg_r: m.avg_r,
            expectancy_r: m.expectancy_r,
        }
    }
}

/// Backtest every cell over the same entries, ranked by expectancy then
/// average R (both descending). Ties keep grid order.
pub fn sweep(
    series: &CloseSeries,
    entries: &[TimestampMs],
    grid: &ParamGrid,
    costs: CostModel,
) -> Result<Vec<SweepRow>> {
    let cells = grid.generate(costs);

    let mut rows = cells
        .par_iter()
        .map(|params| -> Result<SweepRow> {
            let report = run_backtest(series, entries, params)?;
            Ok(SweepRow {
                params: *params,
                metrics: report.metrics,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    rows.sort_by(|a, b| {
        b.metrics
            .expectancy_r
            .total_cmp(&a.metrics.expectancy_r)
            .then_with(|| b.metrics.avg_r.total_cmp(&a.metrics.avg_r))
    });
    Ok(rows)
}

/// Sweep stage: load datasets, rank the grid, write the sweep table.
pub fn run_sweep(
    signals: &Path,
    annotated: &Path,
    output: &Path,
    grid: &ParamGrid,
    costs: CostModel,
) -> Result<Vec<SweepRow>> {
    let series = load_close_series(annotated)?;
    let entries = load_entries(signals)?;
    tracing::info!(cells = grid.size(), entries = entries.len(), "running sweep");

    let rows = sweep(&series, &entries, grid, costs)?;
    let records: Vec<SweepRecord> = rows.iter().map(SweepRecord::from).collect();
    write_dataset(output, &records)?;
    tracing::info!(path = %output.display(), "wrote sweep table");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(closes: &[f64]) -> CloseSeries {
        CloseSeries::new(closes.iter().enumerate().map(|(i, &c)| (i as i64, c)))
    }

    #[test]
    fn default_grid_has_twenty_cells() {
        let grid = ParamGrid::default();
        assert_eq!(grid.size(), 20);
        let cells = grid.generate(CostModel::frictionless());
        assert_eq!(cells.len(), 20);
        assert_eq!((cells[0].lookback, cells[0].r_mult), (3, 0.7));
        assert_eq!((cells[19].lookback, cells[19].r_mult), (13, 2.0));
    }

    #[test]
    fn ranked_by_expectancy() {
        // Entry at 3 (close 100), prior closes 90 95 97; rally to 120
        let s = series(&[90.0, 95.0, 97.0, 100.0, 105.0, 120.0]);
        let grid = ParamGrid {
            lookbacks: vec![1, 3],
            r_mults: vec![1.0, 5.0],
        };
        let rows = sweep(&s, &[3], &grid, CostModel::frictionless()).unwrap();
        assert_eq!(rows.len(), 4);
        for pair in rows.windows(2) {
            assert!(pair[0].metrics.expectancy_r >= pair[1].metrics.expectancy_r);
        }
        // N=1, 5R: stop 97, R=3, target 115 hit at 120 -> 20/3 R
        assert_eq!((rows[0].params.lookback, rows[0].params.r_mult), (1, 5.0));
        // N=1, 1R exits at 105 for 5/3 R, below both N=3 cells at 2R
        assert_eq!((rows[3].params.lookback, rows[3].params.r_mult), (1, 1.0));
    }

    #[test]
    fn equal_results_keep_grid_order() {
        let s = series(&[100.0, 101.0]);
        let grid = ParamGrid {
            lookbacks: vec![3, 5],
            r_mults: vec![1.0, 2.0],
        };
        // Nothing can trade: every cell ties at zero
        let rows = sweep(&s, &[1], &grid, CostModel::frictionless()).unwrap();
        let order: Vec<(usize, f64)> = rows.iter().map(|r| (r.params.lookback, r.params.r_mult)).collect();
        assert_eq!(order, vec![(3, 1.0), (3, 2.0), (5, 1.0), (5, 2.0)]);
    }

    #[test]
    fn writes_sweep_table() {
        let dir = tempfile::tempdir().unwrap();
        let annotated = dir.path().join("annotated.csv");
        let signals = dir.path().join("signals.csv");
        std::fs::write(&annotated, "t_close_h1,h1_close\n0,90\n1,95\n2,97\n3,100\n4,120\n").unwrap();
        std::fs::write(&signals, "t_close_h1,h1_close,entry\n3,100,1\n").unwrap();
        let output = dir.path().join("sweep.csv");

        let rows = run_sweep(
            &signals,
            &annotated,
            &output,
            &ParamGrid::default(),
            CostModel::frictionless(),
        )
        .unwrap();
        assert_eq!(rows.len(), 20);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), 21);
        assert!(text.starts_with("n,r_mult,trades,wins,losses,eod,win_rate,avg_r,expectancy_r"));
    }

    proptest! {
        #[test]
        fn ranking_is_monotone(
            closes in prop::collection::vec(50.0f64..150.0, 20..80),
            every in 2usize..6,
        ) {
            let s = series(&closes);
            let entries: Vec<i64> = (0..closes.len() as i64).step_by(every).collect();
            let rows = sweep(&s, &entries, &ParamGrid::default(), CostModel::new(10.0, 1.0)).unwrap();
            prop_assert_eq!(rows.len(), 20);
            for pair in rows.windows(2) {
                let (a, b) = (&pair[0].metrics, &pair[1].metrics);
                prop_assert!(
                    a.expectancy_r > b.expectancy_r
                        || (a.expectancy_r == b.expectancy_r && a.avg_r >= b.avg_r)
                );
            }
        }
    }
}
