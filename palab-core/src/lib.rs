//! PA Lab Core — domain types, indicators, MTF alignment, bar classifier,
//! signal funnel and close-only backtest.
//!
//! This crate contains the pure engine:
//! - Domain records (candles, merged MTF rows, annotated bars, signals, trades)
//! - EMA/SMA indicators with NaN warm-up
//! - Causal multi-timeframe alignment by binary search on close times
//! - Single-pass pattern classifier (body, tight range, breakout, reversal, gap context)
//! - Regime/trigger funnel with per-stage counts
//! - Trade simulation with stop-before-target resolution
//! - Candle provider boundary and dataset schema checks

pub mod backtest;
pub mod classify;
pub mod data;
pub mod domain;
pub mod error;
pub mod funnel;
pub mod indicators;

pub use error::{ConfigError, SchemaError};
