//! Close-only trade simulation.
//!
//! Each entry signal moves through `pending → opened → closed(stop|target|eod)`
//! or `pending → rejected`. A trade reads only the shared close series, so
//! simulations are independent of one another; the walk forward within one
//! trade is strictly sequential with the stop checked before the target.

use thiserror::Error;

use super::cost_model::CostModel;
use super::metrics::{BacktestMetrics, RejectionCounts};
use super::series::CloseSeries;
use crate::domain::{ExitReason, TimestampMs, Trade};
use crate::error::ConfigError;

/// Strategy parameters of one backtest run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestParams {
    /// Number of closes before the entry that define the stop.
    pub lookback: usize,
    /// Target distance in multiples of R.
    pub r_mult: f64,
    pub costs: CostModel,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            lookback: 5,
            r_mult: 1.0,
            costs: CostModel::frictionless(),
        }
    }
}

impl BacktestParams {
    pub fn new(lookback: usize, r_mult: f64, costs: CostModel) -> Self {
        Self {
            lookback,
            r_mult,
            costs,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.r_mult > 0.0 && self.r_mult.is_finite()) {
            return Err(ConfigError::invalid("r_mult", "must be a finite value > 0"));
        }
        if !(self.costs.fee_bps >= 0.0 && self.costs.fee_bps.is_finite()) {
            return Err(ConfigError::invalid("fee_bps", "must be a finite value >= 0"));
        }
        if !(self.costs.slippage_bps >= 0.0 && self.costs.slippage_bps.is_finite()) {
            return Err(ConfigError::invalid("slippage_bps", "must be a finite value >= 0"));
        }
        Ok(())
    }
}

/// Why an entry signal produced no trade. Not fatal; counted in the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Rejection {
    #[error("signal time {t} is not in the close series")]
    UnknownTimestamp { t: TimestampMs },

    #[error("only {available} closes before entry, {required} required")]
    InsufficientHistory { available: usize, required: usize },

    #[error("risk {r} is not positive")]
    NonPositiveRisk { r: f64 },
}

/// A trade that has been entered but not yet resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub t_entry: TimestampMs,
    /// Position of the entry bar in the close series.
    pub index: usize,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub r: f64,
}

impl OpenPosition {
    /// Enter on the close at `t` with the stop at the lowest of the
    /// `lookback` closes strictly before it.
    pub fn open(
        series: &CloseSeries,
        t: TimestampMs,
        params: &BacktestParams,
    ) -> Result<Self, Rejection> {
        let index = series
            .index_of(t)
            .ok_or(Rejection::UnknownTimestamp { t })?;

        let n = params.lookback;
        if n == 0 || index < n {
            return Err(Rejection::InsufficientHistory {
                available: index,
                required: n,
            });
        }

        let entry = params.costs.buy_price(series.close(index));
        let stop = series.closes()[index - n..index]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let r = entry - stop;
        if r.is_nan() || r <= 0.0 {
            return Err(Rejection::NonPositiveRisk { r });
        }

        Ok(Self {
            t_entry: t,
            index,
            entry,
            stop,
            target: entry + params.r_mult * r,
            r,
        })
    }

    /// Exit condition met by a later close, stop taking precedence.
    pub fn check_exit(&self, close: f64) -> Option<ExitReason> {
        if close <= self.stop {
            Some(ExitReason::Stop)
        } else if close >= self.target {
            Some(ExitReason::Target)
        } else {
            None
        }
    }

    /// Walk forward from the bar after entry until an exit triggers, or
    /// close at the final bar of the series.
    pub fn resolve(self, series: &CloseSeries, costs: &CostModel) -> Trade {
        let last = series.len() - 1;
        let (exit_index, reason) = (self.index + 1..series.len())
            .find_map(|j| self.check_exit(series.close(j)).map(|reason| (j, reason)))
            .unwrap_or((last, ExitReason::Eod));

        self.close_at(series.time(exit_index), series.close(exit_index), reason, costs)
    }

    fn close_at(self, t_exit: TimestampMs, close: f64, reason: ExitReason, costs: &CostModel) -> Trade {
        let exit_price = costs.sell_price(close);
        let fee_cost = costs.round_trip_fee(self.entry, exit_price);
        let pnl_quote = (exit_price - self.entry) - fee_cost;

        Trade {
            t_entry: self.t_entry,
            t_exit,
            entry: self.entry,
            stop: self.stop,
            target: self.target,
            exit_price,
            exit_reason: reason,
            r: self.r,
            pnl_r: pnl_quote / self.r,
            pnl_quote,
        }
    }
}

/// Simulate a single entry signal.
pub fn simulate_signal(
    series: &CloseSeries,
    t: TimestampMs,
    params: &BacktestParams,
) -> Result<Trade, Rejection> {
    let position = OpenPosition::open(series, t, params)?;
    Ok(position.resolve(series, &params.costs))
}

/// Trades and metrics of one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub params: BacktestParams,
    pub trades: Vec<Trade>,
    pub metrics: BacktestMetrics,
}

/// Simulate every entry signal, in ascending time order.
pub fn run_backtest(
    series: &CloseSeries,
    entries: &[TimestampMs],
    params: &BacktestParams,
) -> Result<BacktestReport, ConfigError> {
    params.validate()?;

    let mut entries = entries.to_vec();
    entries.sort_unstable();

    let mut trades = Vec::new();
    let mut rejected = RejectionCounts::default();
    for &t in &entries {
        match simulate_signal(series, t, params) {
            Ok(trade) => trades.push(trade),
            Err(rejection) => {
                tracing::debug!(t, %rejection, "signal rejected");
                rejected.record(&rejection);
            }
        }
    }

    let metrics = BacktestMetrics::compute(&trades, rejected);
    Ok(BacktestReport {
        params: *params,
        trades,
        metrics,
    })
}
