//! PA Lab Runner — pipeline stages over CSV/JSON datasets.
//!
//! This crate builds on `palab-core` to provide:
//! - Environment settings and classifier parameter files
//! - Dataset formats with header validation
//! - MTF, annotate, signals and backtest stages
//! - Parameter sweep (parallel over the grid)
//! - Dataset snapshot (QA and feature statistics)

pub mod annotate;
pub mod backtest;
pub mod config;
pub mod datasets;
pub mod logging;
pub mod mtf;
pub mod signals;
pub mod snapshot;
pub mod sweep;

pub use annotate::{run_annotate, AnnotateSummary};
pub use backtest::{load_close_series, load_entries, run_backtest_stage};
pub use config::{load_classifier_params, Settings};
pub use datasets::{read_dataset, write_dataset, Dataset, Record};
pub use logging::init_logging;
pub use mtf::{binance_provider, run_mtf, MtfOutcome};
pub use signals::{run_signals, SignalsSummary};
pub use snapshot::{build_snapshot, run_snapshot, Snapshot};
pub use sweep::{run_sweep, sweep, ParamGrid, SweepRow};
