//! Close-only backtest: stop from prior closes, target in R multiples,
//! walk-forward exits and flat-rate costs.

pub mod cost_model;
pub mod engine;
pub mod metrics;
pub mod series;

pub use cost_model::CostModel;
pub use engine::{run_backtest, simulate_signal, BacktestParams, BacktestReport, OpenPosition, Rejection};
pub use metrics::{BacktestMetrics, RejectionCounts};
pub use series::CloseSeries;
