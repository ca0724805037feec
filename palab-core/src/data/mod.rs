//! Candle acquisition, multi-timeframe alignment and dataset schemas.

pub mod align;
pub mod binance;
pub mod merge;
pub mod provider;
pub mod schema;

pub use align::{align_frames, AlignedRef, MtfFrame, TimeframeSeries};
pub use binance::BinanceProvider;
pub use merge::{build_mtf_rows, CandleSet, FAST_EMA, SLOW_EMA};
pub use provider::{CandleProvider, DataError};
pub use schema::DatasetSchema;
