//! Domain types for PA Lab

pub mod bar;
pub mod candle;
pub mod signal;
pub mod timeframe;
pub mod trade;

pub use bar::{AlignedEmas, AnnotatedBar, BarType, BoDir, EmaPair, MtfRow};
pub use candle::{ms_to_iso, Candle};
pub use signal::{RegimeMode, Signal, RULE_ID, RULE_NOTES};
pub use timeframe::Timeframe;
pub use trade::{ExitReason, Trade};

/// Epoch milliseconds, the single time unit used throughout the engine.
pub type TimestampMs = i64;
