//! Moving-average indicators over price sequences.
//!
//! Every indicator returns a series of the same length as its input, with
//! `f64::NAN` marking undefined (warm-up) positions. No output value depends on
//! an input at a later index. Consumers convert to `Option<f64>` with
//! [`defined`] at the point where a value leaves the indicator layer.

pub mod ema;
pub mod sma;

pub use ema::{ema, ema_on_closes, Ema};
pub use sma::{sma, Sma};

use crate::error::ConfigError;

/// Map the NaN sentinel (and infinities) to `None`.
pub fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub(crate) fn check_period(period: usize) -> Result<(), ConfigError> {
    if period == 0 {
        return Err(ConfigError::NonPositivePeriod { period });
    }
    Ok(())
}

/// Create synthetic hourly candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    const HOUR_MS: i64 = 3_600_000;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let open_time_ms = i as i64 * HOUR_MS;
            Candle {
                open_time_ms,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                close_time_ms: open_time_ms + HOUR_MS - 1,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
