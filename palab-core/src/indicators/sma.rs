//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::check_period;
use crate::domain::Candle;
use crate::error::ConfigError;

/// SMA over candle closes.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        check_period(period)?;
        Ok(Self {
            period,
            name: format!("sma_{period}"),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookback(&self) -> usize {
        self.period - 1
    }

    pub fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        rolling_mean(&closes, self.period)
    }
}

/// Simple moving average of `values`. Positions before `period - 1` are NaN.
///
/// A NaN input only taints the `period` windows that contain it. Once it
/// slides out, the average is defined again from the remaining values.
pub fn sma(values: &[f64], period: usize) -> Result<Vec<f64>, ConfigError> {
    check_period(period)?;
    Ok(rolling_mean(values, period))
}

fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &entering) in values.iter().enumerate() {
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}
