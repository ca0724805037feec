//! Reversal-in-range detector.
//!
//! A long lower wick closing near the bottom of the recent range is a bullish
//! reversal bar; a long upper wick near the top is bearish. The window here
//! includes the current bar.

use serde::{Deserialize, Serialize};

use super::window::RollingExtreme;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReversalParams {
    pub window: usize,
    /// Minimum wick length as a fraction of the bar's range.
    pub wick_ratio_min: f64,
    /// Bullish when the close sits at or below this position in the range.
    pub pos_low: f64,
    /// Bearish when the close sits at or above this position in the range.
    pub pos_high: f64,
}

impl Default for ReversalParams {
    fn default() -> Self {
        Self {
            window: 20,
            wick_ratio_min: 0.4,
            pos_low: 0.25,
            pos_high: 0.75,
        }
    }
}

impl ReversalParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::invalid("reversal.window", "must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.wick_ratio_min) {
            return Err(ConfigError::invalid("reversal.wick_ratio_min", "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.pos_low) || !(0.0..=1.0).contains(&self.pos_high) {
            return Err(ConfigError::invalid("reversal.pos_low/pos_high", "must be in [0, 1]"));
        }
        if self.pos_low > self.pos_high {
            return Err(ConfigError::invalid("reversal.pos_low", "must not exceed pos_high"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReversalFlags {
    pub bull: bool,
    pub bear: bool,
}

#[derive(Debug, Clone)]
pub struct Reversal {
    params: ReversalParams,
    min_low: RollingExtreme,
    max_high: RollingExtreme,
}

impl Reversal {
    pub fn new(params: &ReversalParams) -> Self {
        Self {
            params: params.clone(),
            min_low: RollingExtreme::min(params.window),
            max_high: RollingExtreme::max(params.window),
        }
    }

    pub fn push(&mut self, open: f64, high: f64, low: f64, close: f64) -> ReversalFlags {
        self.min_low.push(low);
        self.max_high.push(high);

        let range = high - low;
        let (lower_wick, upper_wick) = if range > 0.0 {
            (
                (open.min(close) - low) / range,
                (high - open.max(close)) / range,
            )
        } else {
            (0.0, 0.0)
        };

        let Some(position) = self.position(close) else {
            return ReversalFlags::default();
        };

        // NaN comparisons are false, so undefined wicks never flag
        ReversalFlags {
            bull: lower_wick >= self.params.wick_ratio_min && position <= self.params.pos_low,
            bear: upper_wick >= self.params.wick_ratio_min && position >= self.params.pos_high,
        }
    }

    /// Close position inside the window's low..high; undefined for a
    /// zero-height window.
    fn position(&self, close: f64) -> Option<f64> {
        let low = self.min_low.value()?;
        let high = self.max_high.value()?;
        let height = high - low;
        if height > 0.0 {
            let position = (close - low) / height;
            position.is_finite().then_some(position)
        } else {
            None
        }
    }
}
